use crate::models::{Level, MASTERY_MAX, STREAK_MAX};
use crate::ui::layout::calculate_quiz_chunks;
use crate::ui::palette::Palette;
use crate::ui::screen::{OptionMark, Screen, Status};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

pub fn draw_quiz(f: &mut Frame, screen: &Screen, palette: &Palette) {
    let layout = calculate_quiz_chunks(f.area());

    if let Some(bg) = palette.background {
        f.render_widget(Block::default().style(Style::default().bg(bg)), f.area());
    }

    let mut badges = Vec::new();
    for level in Level::ALL {
        let style = if level == screen.progress.level {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(palette.hint)
        };
        badges.push(Span::styled(format!(" {} ", level.tag()), style));
        badges.push(Span::from(" "));
    }
    badges.push(Span::styled(
        format!("  {}", screen.progress.direction.label()),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ));
    let header = Paragraph::new(Line::from(badges))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, layout.header_area);

    let timer_label = if screen.timer.running {
        format!("{}s", screen.timer.remaining)
    } else {
        String::from("--")
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(palette.timer(screen.timer.warning)))
        .ratio(screen.timer.ratio().clamp(0.0, 1.0))
        .label(timer_label);
    f.render_widget(gauge, layout.timer_area);

    let word_text = match &screen.status {
        Status::Idle => Text::from(""),
        Status::Loading(level) => Text::from(Line::from(Span::styled(
            format!("Loading {}...", level),
            Style::default().fg(palette.hint),
        ))),
        Status::Error { level, message } => {
            let mut text = Text::default();
            text.push_line(Line::from(Span::styled(
                "Error loading file",
                Style::default()
                    .fg(palette.wrong)
                    .add_modifier(Modifier::BOLD),
            )));
            text.push_line(Line::from(format!("{}: {}", level, message)));
            text.push_line(Line::from(""));
            text.push_line(Line::from(Span::styled(
                "Press r to retry or Tab to switch direction",
                Style::default().fg(palette.hint),
            )));
            text
        }
        Status::Ready => {
            let mut text = Text::default();
            text.push_line(Line::from(Span::styled(
                screen.word.as_str(),
                Style::default()
                    .fg(palette.text)
                    .add_modifier(Modifier::BOLD),
            )));
            if !screen.transcription.is_empty() {
                text.push_line(Line::from(Span::styled(
                    screen.transcription.as_str(),
                    Style::default().fg(palette.hint),
                )));
            }
            text
        }
    };
    let word = Paragraph::new(word_text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(word, layout.word_area);

    let show_options = screen.status == Status::Ready;
    let option_lines: Vec<Line> = if show_options {
        screen
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let mut style = match option.mark {
                    OptionMark::Plain => Style::default().fg(palette.text),
                    OptionMark::Correct => Style::default()
                        .fg(palette.correct)
                        .add_modifier(Modifier::BOLD),
                    OptionMark::Wrong => Style::default()
                        .fg(palette.wrong)
                        .add_modifier(Modifier::BOLD),
                };
                let pointer = if i == screen.highlighted && !screen.locked {
                    style = style.add_modifier(Modifier::REVERSED);
                    "›"
                } else {
                    " "
                };
                Line::from(Span::styled(
                    format!("{} {}. {}", pointer, i + 1, option.text),
                    style,
                ))
            })
            .collect()
    } else {
        Vec::new()
    };
    let mut options_block = Block::default().borders(Borders::ALL).title("Translation");
    if let Some(surface) = palette.surface {
        options_block = options_block.style(Style::default().bg(surface));
    }
    let options = Paragraph::new(option_lines).block(options_block);
    f.render_widget(options, layout.options_area);

    let dot_style = if screen.streak_broken {
        Style::default().fg(palette.wrong)
    } else {
        Style::default().fg(palette.correct)
    };
    let dots: String = (0..STREAK_MAX)
        .map(|i| if i < screen.progress.streak { "● " } else { "○ " })
        .collect();
    let mut progress_lines = vec![Line::from(vec![
        Span::from("Streak  "),
        Span::styled(dots, dot_style),
    ])];
    if screen.progress.level.is_top() {
        progress_lines.push(Line::from(vec![
            Span::from("Mastery "),
            Span::styled(
                format!("{}", screen.progress.mastery),
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("/{}", MASTERY_MAX), Style::default().fg(palette.hint)),
            Span::from("   Score "),
            Span::styled(
                format!("{}", screen.progress.score),
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    let progress = Paragraph::new(progress_lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(progress, layout.progress_area);

    let key = |label: &'static str| {
        Span::styled(
            label,
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
    };
    let help_line = Line::from(vec![
        key("1-4"),
        Span::from(" Answer  "),
        key("↑/↓"),
        Span::from(" Move  "),
        key("Enter"),
        Span::from(" Pick  "),
        key("Tab"),
        Span::from(" Direction  "),
        key("p"),
        Span::from(" Pause  "),
        key("Esc"),
        Span::from(" Quit"),
    ]);
    let help = Paragraph::new(help_line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, layout.help_area);
}

pub fn draw_quit_confirmation(f: &mut Frame, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(5)
        .constraints([Constraint::Length(3), Constraint::Length(3)])
        .split(f.area());

    let message = Paragraph::new("Leave the quiz? Progress is not saved.")
        .style(
            Style::default()
                .fg(palette.caution)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(message, chunks[0]);

    let help = Paragraph::new(Line::from(vec![
        Span::styled(
            "y",
            Style::default()
                .fg(palette.correct)
                .add_modifier(Modifier::BOLD),
        ),
        Span::from(" Quit  "),
        Span::styled(
            "n",
            Style::default()
                .fg(palette.wrong)
                .add_modifier(Modifier::BOLD),
        ),
        Span::from(" Keep playing"),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[1]);
}
