pub mod app;
pub mod config;
pub mod host;
pub mod logger;
pub mod models;
pub mod quiz;
pub mod timer;
pub mod ui;
pub mod words;

// Re-exports for convenience
pub use app::{App, Flow, Mode};
pub use config::Config;
pub use host::{Haptic, HostError, NoHost, PlatformHost, TerminalHost, ThemeParams};
pub use models::{
    AnswerOption, LanguageDirection, Level, SessionState, Word, MASTERY_MAX, STREAK_MAX,
};
pub use quiz::{Command, Outcome, Phase, Progress, QuizController, QuizEvent, RenderSink};
pub use timer::{Countdown, Ticker, TimerView, TimerWarning, TIMER_DURATION};
pub use words::{word_list_file, DirSource, HttpSource, LoadError, WordSource};
