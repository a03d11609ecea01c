use anyhow::Context;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::info;
use vocab_ladder::{
    logger,
    ui::{Palette, Screen},
    App, Config, PlatformHost, QuizController, TerminalHost, ThemeParams,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logger::init(&config.log_file, config.log_level())
        .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;

    let origin = config
        .url
        .clone()
        .unwrap_or_else(|| config.words.display().to_string());
    info!(
        "Starting vocab-ladder: direction={:?} words={}",
        config.direction, origin
    );

    let theme = match &config.theme {
        Some(path) => Some(
            ThemeParams::load(path)
                .with_context(|| format!("Failed to read theme {}", path.display()))?,
        ),
        None => None,
    };
    let host = TerminalHost::new(config.haptics, theme);
    let palette = Palette::from_theme(host.theme().as_ref());

    let mut controller = QuizController::new(config.direction, Screen::new(config.direction), host);
    if let Some(seed) = config.seed {
        controller = controller.seeded(seed);
    }
    let mut app = App::new(controller, config.word_source(), palette);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Session ended");
    result
}
