//! Optional platform capabilities: tactile feedback and theme colors.
//!
//! The game never depends on a host being present; [`NoHost`] is the default
//! and any error a host returns is logged and dropped by the controller.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    /// Correct answer.
    Impact,
    /// Level-up or score increment.
    Success,
    /// Wrong answer or timeout.
    Error,
    /// Language direction changed.
    Selection,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Haptic feedback unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Hex colors in the shape chat-app shells hand to embedded apps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeParams {
    #[serde(default)]
    pub bg_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub hint_color: Option<String>,
    #[serde(default)]
    pub link_color: Option<String>,
    #[serde(default)]
    pub secondary_bg_color: Option<String>,
}

impl ThemeParams {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

pub trait PlatformHost {
    fn haptic(&mut self, _kind: Haptic) -> Result<(), HostError> {
        Ok(())
    }

    fn theme(&self) -> Option<ThemeParams> {
        None
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoHost;

impl PlatformHost for NoHost {}

/// Host backed by the terminal: rings the bell for feedback when enabled.
#[derive(Debug, Default)]
pub struct TerminalHost {
    haptics: bool,
    theme: Option<ThemeParams>,
}

impl TerminalHost {
    pub fn new(haptics: bool, theme: Option<ThemeParams>) -> Self {
        Self { haptics, theme }
    }
}

impl PlatformHost for TerminalHost {
    fn haptic(&mut self, kind: Haptic) -> Result<(), HostError> {
        if !self.haptics {
            return Ok(());
        }
        match kind {
            Haptic::Success | Haptic::Error => {
                let mut stdout = std::io::stdout();
                stdout.write_all(b"\x07")?;
                stdout.flush()?;
                Ok(())
            }
            Haptic::Impact | Haptic::Selection => Ok(()),
        }
    }

    fn theme(&self) -> Option<ThemeParams> {
        self.theme.clone()
    }
}
