use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct QuizLayout {
    pub header_area: Rect,
    pub timer_area: Rect,
    pub word_area: Rect,
    pub options_area: Rect,
    pub progress_area: Rect,
    pub help_area: Rect,
}

pub fn calculate_quiz_chunks(area: Rect) -> QuizLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(6),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(area);

    QuizLayout {
        header_area: chunks[0],
        timer_area: chunks[1],
        word_area: chunks[2],
        options_area: chunks[3],
        progress_area: chunks[4],
        help_area: chunks[5],
    }
}
