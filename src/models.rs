use serde::{Deserialize, Serialize};
use std::fmt;

pub const STREAK_MAX: u32 = 10;
pub const MASTERY_MAX: u32 = 10;

/// Proficiency tier. Each tier is backed by its own word list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    #[default]
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::A1,
        Level::A2,
        Level::B1,
        Level::B2,
        Level::C1,
        Level::C2,
    ];
    pub const TOP: Level = Level::C2;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Level> {
        Self::ALL.get(index).copied()
    }

    pub fn tag(self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        }
    }

    pub fn is_top(self) -> bool {
        self == Self::TOP
    }

    /// Next tier up, `None` at the top.
    pub fn up(self) -> Option<Level> {
        Self::from_index(self.index() + 1)
    }

    /// Next tier down, `None` at A1.
    pub fn down(self) -> Option<Level> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which vocabulary pairing is being drilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum LanguageDirection {
    #[default]
    #[value(name = "en-ru")]
    EnRu,
    #[value(name = "ru-en")]
    RuEn,
}

impl LanguageDirection {
    /// Prefix used in word-list file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            LanguageDirection::EnRu => "enrus",
            LanguageDirection::RuEn => "rusen",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LanguageDirection::EnRu => "EN → RU",
            LanguageDirection::RuEn => "RU → EN",
        }
    }

    pub fn toggled(self) -> LanguageDirection {
        match self {
            LanguageDirection::EnRu => LanguageDirection::RuEn,
            LanguageDirection::RuEn => LanguageDirection::EnRu,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub correct: bool,
}

/// One quiz item as stored in the word-list files.
///
/// Nothing checks that exactly one option is marked correct; a list with zero
/// or several correct options is played as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    #[serde(rename = "word")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    pub options: Vec<AnswerOption>,
}

impl Word {
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o.correct)
    }

    pub fn is_correct(&self, index: usize) -> bool {
        self.options.get(index).is_some_and(|o| o.correct)
    }
}

/// Progression counters for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub level: Level,
    pub streak: u32,
    pub mastery: u32,
    pub score: u64,
    pub direction: LanguageDirection,
    pub answered: bool,
    pub auto_start_timer: bool,
}

impl SessionState {
    pub fn new(direction: LanguageDirection) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }
}
