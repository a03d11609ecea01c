//! Runtime around the quiz controller.
//!
//! Owns the event channel and executes controller commands: loads and delays
//! become spawned tasks that report back through the channel, ticker commands
//! drive the single [`Ticker`]. The controller itself is only ever touched from
//! the task running [`App::run`].

use crate::host::{PlatformHost, TerminalHost};
use crate::quiz::{Command, QuizController, QuizEvent};
use crate::timer::Ticker;
use crate::ui::{draw_quit_confirmation, draw_quiz, Palette, Screen};
use crate::words::WordSource;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{backend::Backend, Frame, Terminal};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Playing,
    QuitConfirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

enum Step {
    Terminal(Option<std::io::Result<Event>>),
    Quiz(Option<QuizEvent>),
}

pub struct App<H: PlatformHost = TerminalHost> {
    controller: QuizController<Screen, H>,
    source: Arc<dyn WordSource>,
    tx: UnboundedSender<QuizEvent>,
    rx: UnboundedReceiver<QuizEvent>,
    ticker: Ticker,
    palette: Palette,
    mode: Mode,
}

impl<H: PlatformHost> App<H> {
    pub fn new(
        controller: QuizController<Screen, H>,
        source: Arc<dyn WordSource>,
        palette: Palette,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller,
            source,
            tx,
            rx,
            ticker: Ticker::default(),
            palette,
            mode: Mode::Playing,
        }
    }

    pub fn screen(&self) -> &Screen {
        self.controller.sink()
    }

    pub fn controller(&self) -> &QuizController<Screen, H> {
        &self.controller
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn dispatch(&mut self, event: QuizEvent) {
        let commands = self.controller.handle(event);
        self.execute(commands);
    }

    /// Waits for the next background event and applies it.
    pub async fn pump(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Load {
                    serial,
                    direction,
                    level,
                } => {
                    let source = Arc::clone(&self.source);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let event = match source.fetch(direction, level).await {
                            Ok(words) => QuizEvent::WordsLoaded { serial, words },
                            Err(e) => QuizEvent::LoadFailed {
                                serial,
                                message: e.to_string(),
                            },
                        };
                        let _ = tx.send(event);
                    });
                }
                Command::StartTicker { generation } => {
                    self.ticker.start(generation, self.tx.clone());
                }
                Command::StopTicker => self.ticker.stop(),
                Command::Defer { delay, event } => {
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(event);
                    });
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Exit;
        }

        match self.mode {
            Mode::QuitConfirm => match key.code {
                KeyCode::Char('y') => return Flow::Exit,
                KeyCode::Char('n') | KeyCode::Esc => self.mode = Mode::Playing,
                _ => {}
            },
            Mode::Playing => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    // The clock must not run out behind the dialog.
                    self.dispatch(QuizEvent::Pause);
                    self.mode = Mode::QuitConfirm;
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let index = c as usize - '1' as usize;
                    if self.screen().accepts_answer() && index < self.screen().options.len() {
                        self.dispatch(QuizEvent::Choose(index));
                    }
                }
                KeyCode::Up => self.controller.sink_mut().highlight_prev(),
                KeyCode::Down => self.controller.sink_mut().highlight_next(),
                KeyCode::Enter => {
                    if self.screen().accepts_answer() {
                        let index = self.screen().highlighted;
                        self.dispatch(QuizEvent::Choose(index));
                    }
                }
                KeyCode::Tab => {
                    let direction = self.controller.state().direction.toggled();
                    self.dispatch(QuizEvent::SetDirection(direction));
                }
                KeyCode::Char('r') => self.dispatch(QuizEvent::Retry),
                KeyCode::Char('p') => self.dispatch(QuizEvent::Pause),
                _ => {}
            },
        }
        Flow::Continue
    }

    pub fn draw(&self, f: &mut Frame) {
        draw_quiz(f, self.screen(), &self.palette);
        if self.mode == Mode::QuitConfirm {
            draw_quit_confirmation(f, &self.palette);
        }
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        info!("Word source: {}", self.source.describe());
        let mut keys = EventStream::new();
        self.dispatch(QuizEvent::Start);

        loop {
            terminal.draw(|f| self.draw(f))?;

            let step = tokio::select! {
                event = keys.next() => Step::Terminal(event),
                event = self.rx.recv() => Step::Quiz(event),
            };

            match step {
                Step::Terminal(Some(Ok(Event::Key(key)))) if key.kind == KeyEventKind::Press => {
                    if self.handle_key(key) == Flow::Exit {
                        break;
                    }
                }
                Step::Terminal(Some(Ok(_))) => {}
                Step::Terminal(Some(Err(e))) => return Err(e.into()),
                Step::Terminal(None) | Step::Quiz(None) => break,
                Step::Quiz(Some(event)) => self.dispatch(event),
            }
        }

        debug!("Leaving main loop");
        self.ticker.stop();
        Ok(())
    }
}
