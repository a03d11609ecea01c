use crate::models::{LanguageDirection, Level, Word};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No words")]
    Empty,
}

/// File name of the word list for a direction and level, e.g. `words_enrus_B1.json`.
pub fn word_list_file(direction: LanguageDirection, level: Level) -> String {
    format!("words_{}_{}.json", direction.file_prefix(), level.tag())
}

/// Decodes a word-list payload. An empty list counts as a failure.
pub fn parse_word_list(bytes: &[u8]) -> Result<Vec<Word>, LoadError> {
    let words: Vec<Word> = serde_json::from_slice(bytes)?;
    if words.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(words)
}

/// Where word lists come from.
#[async_trait::async_trait]
pub trait WordSource: Send + Sync {
    async fn fetch(
        &self,
        direction: LanguageDirection,
        level: Level,
    ) -> Result<Vec<Word>, LoadError>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
}

/// Reads word lists from a local directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, direction: LanguageDirection, level: Level) -> PathBuf {
        self.root.join(word_list_file(direction, level))
    }
}

#[async_trait::async_trait]
impl WordSource for DirSource {
    async fn fetch(
        &self,
        direction: LanguageDirection,
        level: Level,
    ) -> Result<Vec<Word>, LoadError> {
        let path = self.path_for(direction, level);
        debug!("Reading word list {}", path.display());
        let bytes = tokio::fs::read(&path).await?;
        parse_word_list(&bytes)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Fetches word lists from `<base>/words_<prefix>_<level>.json` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url_for(&self, direction: LanguageDirection, level: Level) -> String {
        format!(
            "{}/{}",
            self.base.trim_end_matches('/'),
            word_list_file(direction, level)
        )
    }
}

#[async_trait::async_trait]
impl WordSource for HttpSource {
    async fn fetch(
        &self,
        direction: LanguageDirection,
        level: Level,
    ) -> Result<Vec<Word>, LoadError> {
        let url = self.url_for(direction, level);
        debug!("Fetching word list {}", url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        parse_word_list(&bytes)
    }

    fn describe(&self) -> String {
        self.base.clone()
    }
}
