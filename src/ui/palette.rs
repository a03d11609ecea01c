use crate::host::ThemeParams;
use crate::timer::TimerWarning;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub hint: Color,
    pub background: Option<Color>,
    pub surface: Option<Color>,
    pub correct: Color,
    pub wrong: Color,
    pub caution: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            text: Color::White,
            hint: Color::DarkGray,
            background: None,
            surface: None,
            correct: Color::Green,
            wrong: Color::Red,
            caution: Color::Yellow,
        }
    }
}

impl Palette {
    /// Host colors override the defaults where present and parseable.
    pub fn from_theme(theme: Option<&ThemeParams>) -> Self {
        let mut palette = Self::default();
        let Some(theme) = theme else {
            return palette;
        };

        if let Some(color) = theme.link_color.as_deref().and_then(parse_hex) {
            palette.accent = color;
        }
        if let Some(color) = theme.text_color.as_deref().and_then(parse_hex) {
            palette.text = color;
        }
        if let Some(color) = theme.hint_color.as_deref().and_then(parse_hex) {
            palette.hint = color;
        }
        palette.background = theme.bg_color.as_deref().and_then(parse_hex);
        palette.surface = theme.secondary_bg_color.as_deref().and_then(parse_hex);
        palette
    }

    pub fn timer(&self, warning: TimerWarning) -> Color {
        match warning {
            TimerWarning::Calm => self.correct,
            TimerWarning::Caution => self.caution,
            TimerWarning::Critical => self.wrong,
        }
    }
}

/// `#rrggbb` or `#rgb`.
pub fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#').filter(|h| h.is_ascii())?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            let expand = |s: &str| channel(s).map(|v| v * 17);
            Some(Color::Rgb(
                expand(&hex[0..1])?,
                expand(&hex[1..2])?,
                expand(&hex[2..3])?,
            ))
        }
        _ => None,
    }
}
