use crate::models::{LanguageDirection, Level, Word};
use crate::quiz::{Outcome, Progress, RenderSink};
use crate::timer::{Countdown, TimerView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading(Level),
    Error { level: Level, message: String },
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Plain,
    Correct,
    Wrong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub text: String,
    pub mark: OptionMark,
}

/// Everything the terminal shows, as last reported by the controller.
#[derive(Debug, Clone)]
pub struct Screen {
    pub status: Status,
    pub word: String,
    pub transcription: String,
    pub options: Vec<OptionView>,
    pub highlighted: usize,
    pub locked: bool,
    pub streak_broken: bool,
    pub progress: Progress,
    pub timer: TimerView,
}

impl Screen {
    pub fn new(direction: LanguageDirection) -> Self {
        Self {
            status: Status::Idle,
            word: String::new(),
            transcription: String::new(),
            options: Vec::new(),
            highlighted: 0,
            locked: false,
            streak_broken: false,
            progress: Progress {
                level: Level::A1,
                streak: 0,
                mastery: 0,
                score: 0,
                direction,
            },
            timer: Countdown::default().view(),
        }
    }

    pub fn highlight_next(&mut self) {
        if !self.options.is_empty() {
            self.highlighted = (self.highlighted + 1) % self.options.len();
        }
    }

    pub fn highlight_prev(&mut self) {
        if !self.options.is_empty() {
            self.highlighted = self
                .highlighted
                .checked_sub(1)
                .unwrap_or(self.options.len() - 1);
        }
    }

    /// Options can be picked only while a word is up and unanswered.
    pub fn accepts_answer(&self) -> bool {
        self.status == Status::Ready && !self.locked
    }

    fn mark(&mut self, selected: Option<usize>, mark: OptionMark) {
        if let Some(option) = selected.and_then(|i| self.options.get_mut(i)) {
            option.mark = mark;
        }
    }
}

impl RenderSink for Screen {
    fn show_loading(&mut self, level: Level) {
        self.status = Status::Loading(level);
        self.locked = true;
    }

    fn show_load_error(&mut self, level: Level, message: &str) {
        self.status = Status::Error {
            level,
            message: message.to_string(),
        };
    }

    fn show_word(&mut self, word: &Word) {
        self.status = Status::Ready;
        self.word = word.text.to_uppercase();
        self.transcription = word.transcription.clone().unwrap_or_default();
        self.options = word
            .options
            .iter()
            .map(|o| OptionView {
                text: capitalize(&o.text),
                mark: OptionMark::Plain,
            })
            .collect();
        self.highlighted = 0;
        self.locked = false;
        self.streak_broken = false;
    }

    fn show_progress(&mut self, progress: &Progress) {
        self.progress = *progress;
    }

    fn show_outcome(&mut self, outcome: Outcome) {
        self.locked = true;
        match outcome {
            Outcome::Correct { selected } => self.mark(selected, OptionMark::Correct),
            Outcome::Wrong { selected } => {
                self.mark(selected, OptionMark::Wrong);
                self.streak_broken = true;
            }
        }
    }

    fn show_timer(&mut self, timer: TimerView) {
        self.timer = timer;
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerOption;

    fn sample_word() -> Word {
        Word {
            text: "окно".to_string(),
            transcription: None,
            options: vec![
                AnswerOption {
                    text: "window".to_string(),
                    correct: true,
                },
                AnswerOption {
                    text: "door".to_string(),
                    correct: false,
                },
            ],
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("window"), "Window");
        assert_eq!(capitalize("дом"), "Дом");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_show_word_formats_text() {
        let mut screen = Screen::new(LanguageDirection::RuEn);
        screen.show_word(&sample_word());
        assert_eq!(screen.status, Status::Ready);
        assert_eq!(screen.word, "ОКНО");
        assert_eq!(screen.transcription, "");
        assert_eq!(screen.options[0].text, "Window");
        assert!(screen.accepts_answer());
    }

    #[test]
    fn test_wrong_outcome_marks_and_locks() {
        let mut screen = Screen::new(LanguageDirection::EnRu);
        screen.show_word(&sample_word());
        screen.show_outcome(Outcome::Wrong { selected: Some(1) });
        assert_eq!(screen.options[1].mark, OptionMark::Wrong);
        assert_eq!(screen.options[0].mark, OptionMark::Plain);
        assert!(screen.streak_broken);
        assert!(!screen.accepts_answer());

        screen.show_word(&sample_word());
        assert!(!screen.streak_broken);
    }

    #[test]
    fn test_timeout_outcome_marks_nothing() {
        let mut screen = Screen::new(LanguageDirection::EnRu);
        screen.show_word(&sample_word());
        screen.show_outcome(Outcome::Wrong { selected: None });
        assert!(screen.options.iter().all(|o| o.mark == OptionMark::Plain));
        assert!(screen.locked);
    }

    #[test]
    fn test_highlight_wraps() {
        let mut screen = Screen::new(LanguageDirection::EnRu);
        screen.highlight_next();
        assert_eq!(screen.highlighted, 0);

        screen.show_word(&sample_word());
        screen.highlight_prev();
        assert_eq!(screen.highlighted, 1);
        screen.highlight_next();
        assert_eq!(screen.highlighted, 0);
    }

    #[test]
    fn test_load_error_status() {
        let mut screen = Screen::new(LanguageDirection::EnRu);
        screen.show_loading(Level::B1);
        assert_eq!(screen.status, Status::Loading(Level::B1));
        screen.show_load_error(Level::B1, "No words");
        assert_eq!(
            screen.status,
            Status::Error {
                level: Level::B1,
                message: "No words".to_string()
            }
        );
    }
}
