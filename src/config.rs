//! Command-line configuration.

use crate::models::LanguageDirection;
use crate::words::{DirSource, HttpSource, WordSource};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "vocab-ladder")]
#[command(about = "Vocabulary quiz that climbs from A1 to C2 on a streak of correct answers")]
#[command(version)]
pub struct Config {
    /// Directory holding words_<enrus|rusen>_<LEVEL>.json files
    #[arg(short, long, default_value = "words")]
    pub words: PathBuf,

    /// Fetch word lists from this base URL instead of a directory
    #[arg(long)]
    pub url: Option<String>,

    /// Starting language direction
    #[arg(short, long, value_enum, default_value_t = LanguageDirection::EnRu)]
    pub direction: LanguageDirection,

    /// Ring the terminal bell on mistakes and milestones
    #[arg(long)]
    pub haptics: bool,

    /// JSON file with theme colors (bg_color, text_color, hint_color, link_color)
    #[arg(long)]
    pub theme: Option<PathBuf>,

    /// Where log output goes; the terminal itself is taken by the UI
    #[arg(long, default_value = "vocab-ladder.log")]
    pub log_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Seed for word selection
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Config {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn word_source(&self) -> Arc<dyn WordSource> {
        match &self.url {
            Some(url) => Arc::new(HttpSource::new(url.clone())),
            None => Arc::new(DirSource::new(self.words.clone())),
        }
    }
}
