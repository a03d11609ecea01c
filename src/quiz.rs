//! Quiz progression state machine.
//!
//! The controller never sleeps, spawns or reads files. Inputs arrive as
//! [`QuizEvent`]s; anything that needs time or I/O leaves as a [`Command`] for
//! the runtime to execute, and comes back later as another event. Events that
//! belong to an earlier load, timer run or question are dropped on arrival.

use crate::host::{Haptic, NoHost, PlatformHost};
use crate::models::{LanguageDirection, Level, MASTERY_MAX, STREAK_MAX, SessionState, Word};
use crate::timer::{Countdown, TickOutcome, TimerView};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const REVEAL_DELAY: Duration = Duration::from_millis(200);
pub const TIMER_START_DELAY: Duration = Duration::from_millis(150);
pub const NEXT_WORD_DELAY: Duration = Duration::from_millis(300);
pub const LEVEL_UP_DELAY: Duration = Duration::from_millis(300);
pub const WRONG_ANSWER_DELAY: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    Start,
    WordsLoaded { serial: u64, words: Vec<Word> },
    LoadFailed { serial: u64, message: String },
    Reveal { serial: u64 },
    Choose(usize),
    StartTimer { round: u64 },
    TimerTick { generation: u64 },
    NextWord { round: u64 },
    LevelUp { round: u64 },
    ResolveWrong { round: u64 },
    SetDirection(LanguageDirection),
    Retry,
    Pause,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load {
        serial: u64,
        direction: LanguageDirection,
        level: Level,
    },
    StartTicker {
        generation: u64,
    },
    StopTicker,
    Defer {
        delay: Duration,
        event: QuizEvent,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    LoadFailed,
    Presenting,
    Answered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub level: Level,
    pub streak: u32,
    pub mastery: u32,
    pub score: u64,
    pub direction: LanguageDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct { selected: Option<usize> },
    Wrong { selected: Option<usize> },
}

/// Presentation layer the controller writes to. Never read back.
pub trait RenderSink {
    fn show_loading(&mut self, level: Level);
    fn show_load_error(&mut self, level: Level, message: &str);
    fn show_word(&mut self, word: &Word);
    fn show_progress(&mut self, progress: &Progress);
    fn show_outcome(&mut self, outcome: Outcome);
    fn show_timer(&mut self, timer: TimerView);
}

pub struct QuizController<S: RenderSink, H: PlatformHost = NoHost> {
    state: SessionState,
    phase: Phase,
    words: Vec<Word>,
    current: Option<Word>,
    round: u64,
    /// Rounds answered wrong whose demotion has not run yet.
    pending_wrong: Vec<u64>,
    load_serial: u64,
    countdown: Countdown,
    rng: StdRng,
    sink: S,
    host: H,
    outbox: Vec<Command>,
}

impl<S: RenderSink, H: PlatformHost> QuizController<S, H> {
    pub fn new(direction: LanguageDirection, sink: S, host: H) -> Self {
        Self::with_session(SessionState::new(direction), sink, host)
    }

    /// Starts from arbitrary counters instead of a fresh session.
    pub fn with_session(state: SessionState, sink: S, host: H) -> Self {
        Self {
            state,
            phase: Phase::Idle,
            words: Vec::new(),
            current: None,
            round: 0,
            pending_wrong: Vec::new(),
            load_serial: 0,
            countdown: Countdown::default(),
            rng: StdRng::from_entropy(),
            sink,
            host,
            outbox: Vec::new(),
        }
    }

    /// Fixes the word picks, mostly for tests and `--seed`.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_word(&self) -> Option<&Word> {
        self.current.as_ref()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn timer(&self) -> TimerView {
        self.countdown.view()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            level: self.state.level,
            streak: self.state.streak,
            mastery: self.state.mastery,
            score: self.state.score,
            direction: self.state.direction,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn handle(&mut self, event: QuizEvent) -> Vec<Command> {
        match event {
            QuizEvent::Start => self.start(),
            QuizEvent::WordsLoaded { serial, words } => {
                self.words_loaded(serial, words);
                self.drain()
            }
            QuizEvent::LoadFailed { serial, message } => {
                self.load_failed(serial, &message);
                self.drain()
            }
            QuizEvent::Reveal { serial } => {
                if serial == self.load_serial && self.phase == Phase::Loading {
                    self.show_next();
                } else {
                    debug!("Dropping reveal for load {}", serial);
                }
                self.drain()
            }
            QuizEvent::Choose(index) => self.choose_option(index),
            QuizEvent::StartTimer { round } => {
                if self.is_open(round) {
                    self.arm_timer();
                } else {
                    debug!("Dropping timer start for round {}", round);
                }
                self.drain()
            }
            QuizEvent::TimerTick { generation } => {
                self.tick(generation);
                self.drain()
            }
            QuizEvent::NextWord { round } => {
                if self.is_resolving(round) {
                    self.show_next();
                }
                self.drain()
            }
            QuizEvent::LevelUp { round } => {
                if self.is_resolving(round) {
                    self.begin_load(self.state.level);
                }
                self.drain()
            }
            QuizEvent::ResolveWrong { round } => {
                match self.pending_wrong.iter().position(|r| *r == round) {
                    Some(i) => {
                        self.pending_wrong.remove(i);
                        self.resolve_wrong();
                    }
                    None => debug!("No pending mistake for round {}", round),
                }
                self.drain()
            }
            QuizEvent::SetDirection(direction) => self.set_language_direction(direction),
            QuizEvent::Retry => self.retry(),
            QuizEvent::Pause => self.pause(),
        }
    }

    /// Kicks off the first load. Does nothing once the session is running.
    pub fn start(&mut self) -> Vec<Command> {
        if self.phase == Phase::Idle {
            self.render_progress();
            self.begin_load(self.state.level);
        }
        self.drain()
    }

    pub fn load_level(&mut self, level: Level) -> Vec<Command> {
        self.begin_load(level);
        self.drain()
    }

    /// Shows another word from the loaded list. Ignored while a list is loading or failed.
    pub fn present_next(&mut self) -> Vec<Command> {
        if matches!(self.phase, Phase::Presenting | Phase::Answered) {
            self.show_next();
        } else {
            debug!("No word list to present from in {:?}", self.phase);
        }
        self.drain()
    }

    /// Resolves the current question without knowing which option was picked.
    pub fn submit_answer(&mut self, correct: bool) -> Vec<Command> {
        let selected = if correct {
            self.current.as_ref().and_then(Word::correct_index)
        } else {
            None
        };
        self.resolve(selected, correct);
        self.drain()
    }

    pub fn choose_option(&mut self, index: usize) -> Vec<Command> {
        if self.phase == Phase::Presenting {
            let correct = self.current.as_ref().is_some_and(|w| w.is_correct(index));
            self.resolve(Some(index), correct);
        }
        self.drain()
    }

    pub fn set_language_direction(&mut self, direction: LanguageDirection) -> Vec<Command> {
        if self.state.direction != direction {
            info!("Language direction {:?} -> {:?}", self.state.direction, direction);
            self.feedback(Haptic::Selection);
            self.state.direction = direction;
            self.state.streak = 0;
            self.state.auto_start_timer = false;
            self.render_progress();
            self.begin_load(self.state.level);
        }
        self.drain()
    }

    pub fn start_timer(&mut self) -> Vec<Command> {
        self.arm_timer();
        self.drain()
    }

    pub fn stop_timer(&mut self) -> Vec<Command> {
        self.halt_timer();
        self.drain()
    }

    /// Re-issues a failed load.
    pub fn retry(&mut self) -> Vec<Command> {
        if self.phase == Phase::LoadFailed {
            self.begin_load(self.state.level);
        }
        self.drain()
    }

    /// Stops the clock; the timer stays off until the next correct answer.
    pub fn pause(&mut self) -> Vec<Command> {
        self.halt_timer();
        self.state.auto_start_timer = false;
        self.sink.show_timer(self.countdown.view());
        self.drain()
    }

    fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    fn is_open(&self, round: u64) -> bool {
        round == self.round && self.phase == Phase::Presenting && !self.state.answered
    }

    fn is_resolving(&self, round: u64) -> bool {
        let live = round == self.round && self.phase == Phase::Answered;
        if !live {
            debug!("Dropping follow-up for round {}", round);
        }
        live
    }

    fn begin_load(&mut self, level: Level) {
        self.halt_timer();
        self.countdown.reset();
        self.state.level = level;
        self.words.clear();
        self.load_serial += 1;
        self.phase = Phase::Loading;
        info!(
            "Loading {} ({}) as load {}",
            level,
            self.state.direction.file_prefix(),
            self.load_serial
        );
        self.sink.show_loading(level);
        self.sink.show_timer(self.countdown.view());
        self.outbox.push(Command::Load {
            serial: self.load_serial,
            direction: self.state.direction,
            level,
        });
    }

    fn words_loaded(&mut self, serial: u64, words: Vec<Word>) {
        if serial != self.load_serial || self.phase != Phase::Loading {
            debug!("Dropping stale word list from load {}", serial);
            return;
        }
        if words.is_empty() {
            self.load_failed(serial, "No words");
            return;
        }
        info!("Loaded {} words for {}", words.len(), self.state.level);
        self.words = words;
        self.outbox.push(Command::Defer {
            delay: REVEAL_DELAY,
            event: QuizEvent::Reveal { serial },
        });
    }

    fn load_failed(&mut self, serial: u64, message: &str) {
        if serial != self.load_serial || self.phase != Phase::Loading {
            debug!("Dropping stale load failure from load {}", serial);
            return;
        }
        warn!("Loading {} failed: {}", self.state.level, message);
        self.phase = Phase::LoadFailed;
        self.sink.show_load_error(self.state.level, message);
    }

    fn show_next(&mut self) {
        if self.words.is_empty() {
            self.begin_load(self.state.level);
            return;
        }
        self.halt_timer();
        self.state.answered = false;
        self.round += 1;
        self.current = self.words.choose(&mut self.rng).cloned();
        self.phase = Phase::Presenting;
        if let Some(word) = &self.current {
            debug!("Round {}: {}", self.round, word.text);
            self.sink.show_word(word);
        }

        if self.state.auto_start_timer {
            self.outbox.push(Command::Defer {
                delay: TIMER_START_DELAY,
                event: QuizEvent::StartTimer { round: self.round },
            });
        } else {
            self.countdown.reset();
        }
        self.sink.show_timer(self.countdown.view());
    }

    fn arm_timer(&mut self) {
        let generation = self.countdown.start();
        self.state.answered = false;
        self.sink.show_timer(self.countdown.view());
        self.outbox.push(Command::StartTicker { generation });
    }

    fn halt_timer(&mut self) {
        if self.countdown.is_running() {
            self.countdown.stop();
            self.outbox.push(Command::StopTicker);
        }
    }

    fn tick(&mut self, generation: u64) {
        match self.countdown.tick(generation) {
            TickOutcome::Stale => {}
            TickOutcome::Running { .. } => self.sink.show_timer(self.countdown.view()),
            TickOutcome::Expired => {
                self.sink.show_timer(self.countdown.view());
                self.outbox.push(Command::StopTicker);
                if !self.state.answered {
                    info!("Round {} timed out", self.round);
                    self.resolve(None, false);
                }
            }
        }
    }

    fn resolve(&mut self, selected: Option<usize>, correct: bool) {
        if self.phase != Phase::Presenting || self.state.answered {
            debug!("Ignoring answer for round {}", self.round);
            return;
        }
        self.state.answered = true;
        self.phase = Phase::Answered;
        self.halt_timer();

        if correct {
            self.on_correct(selected);
        } else {
            self.on_wrong(selected);
        }
    }

    fn on_correct(&mut self, selected: Option<usize>) {
        self.sink.show_outcome(Outcome::Correct { selected });
        self.feedback(Haptic::Impact);

        self.state.streak += 1;
        self.state.auto_start_timer = true;

        if self.state.streak >= STREAK_MAX {
            self.state.streak = 0;
            match self.state.level.up() {
                None => {
                    self.state.mastery += 1;
                    if self.state.mastery >= MASTERY_MAX {
                        self.state.mastery = 0;
                        self.state.score += 1;
                        info!("Score is now {}", self.state.score);
                        self.feedback(Haptic::Success);
                    }
                }
                Some(next) => {
                    info!("Level up: {} -> {}", self.state.level, next);
                    self.state.level = next;
                    self.feedback(Haptic::Success);
                    self.render_progress();
                    self.outbox.push(Command::Defer {
                        delay: LEVEL_UP_DELAY,
                        event: QuizEvent::LevelUp { round: self.round },
                    });
                    return;
                }
            }
        }

        self.render_progress();
        self.outbox.push(Command::Defer {
            delay: NEXT_WORD_DELAY,
            event: QuizEvent::NextWord { round: self.round },
        });
    }

    fn on_wrong(&mut self, selected: Option<usize>) {
        self.sink.show_outcome(Outcome::Wrong { selected });
        self.feedback(Haptic::Error);
        self.state.auto_start_timer = false;
        self.pending_wrong.push(self.round);
        self.outbox.push(Command::Defer {
            delay: WRONG_ANSWER_DELAY,
            event: QuizEvent::ResolveWrong { round: self.round },
        });
    }

    fn resolve_wrong(&mut self) {
        self.state.streak = 0;
        match self.state.level.down() {
            Some(lower) => {
                info!("Level down: {} -> {}", self.state.level, lower);
                self.state.level = lower;
                self.render_progress();
                self.begin_load(lower);
            }
            None => {
                self.render_progress();
                // A reload started since the mistake brings its own word.
                if self.phase == Phase::Answered {
                    self.show_next();
                }
            }
        }
    }

    fn render_progress(&mut self) {
        let progress = self.progress();
        self.sink.show_progress(&progress);
    }

    fn feedback(&mut self, kind: Haptic) {
        if let Err(e) = self.host.haptic(kind) {
            warn!("Haptic {:?} failed: {}", kind, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostError;
    use crate::models::AnswerOption;
    use crate::timer::{TIMER_DURATION, TimerWarning};

    #[derive(Debug, Default)]
    struct RecordingSink {
        loading: Vec<Level>,
        errors: Vec<(Level, String)>,
        words: Vec<String>,
        outcomes: Vec<Outcome>,
        progress: Vec<Progress>,
        timers: Vec<TimerView>,
    }

    impl RenderSink for RecordingSink {
        fn show_loading(&mut self, level: Level) {
            self.loading.push(level);
        }
        fn show_load_error(&mut self, level: Level, message: &str) {
            self.errors.push((level, message.to_string()));
        }
        fn show_word(&mut self, word: &Word) {
            self.words.push(word.text.clone());
        }
        fn show_progress(&mut self, progress: &Progress) {
            self.progress.push(*progress);
        }
        fn show_outcome(&mut self, outcome: Outcome) {
            self.outcomes.push(outcome);
        }
        fn show_timer(&mut self, timer: TimerView) {
            self.timers.push(timer);
        }
    }

    #[derive(Debug, Default)]
    struct BrokenHost {
        attempts: Vec<Haptic>,
    }

    impl PlatformHost for BrokenHost {
        fn haptic(&mut self, kind: Haptic) -> Result<(), HostError> {
            self.attempts.push(kind);
            Err(HostError::Unavailable("no shell".to_string()))
        }
    }

    type Controller = QuizController<RecordingSink, BrokenHost>;

    fn word(text: &str, correct: usize) -> Word {
        Word {
            text: text.to_string(),
            transcription: None,
            options: (0..4)
                .map(|i| AnswerOption {
                    text: format!("{}-{}", text, i),
                    correct: i == correct,
                })
                .collect(),
        }
    }

    fn words() -> Vec<Word> {
        vec![word("cat", 1)]
    }

    fn load_serial(commands: &[Command]) -> u64 {
        commands
            .iter()
            .find_map(|c| match c {
                Command::Load { serial, .. } => Some(*serial),
                _ => None,
            })
            .expect("no load command")
    }

    fn deferred(commands: &[Command]) -> QuizEvent {
        commands
            .iter()
            .find_map(|c| match c {
                Command::Defer { event, .. } => Some(event.clone()),
                _ => None,
            })
            .expect("no deferred event")
    }

    /// Completes a pending load and reveals the first word.
    fn finish_load(c: &mut Controller, commands: &[Command], list: Vec<Word>) -> Vec<Command> {
        let serial = load_serial(commands);
        let after = c.handle(QuizEvent::WordsLoaded {
            serial,
            words: list,
        });
        assert_eq!(deferred(&after), QuizEvent::Reveal { serial });
        c.handle(QuizEvent::Reveal { serial })
    }

    fn controller_at(state: SessionState) -> Controller {
        let mut c = QuizController::with_session(state, RecordingSink::default(), BrokenHost::default())
            .seeded(7);
        let commands = c.start();
        finish_load(&mut c, &commands, words());
        assert_eq!(c.phase(), Phase::Presenting);
        c
    }

    fn fresh() -> Controller {
        controller_at(SessionState::default())
    }

    /// Answers correctly and lets the follow-up run. Returns the follow-up's commands.
    fn answer_correctly(c: &mut Controller) -> Vec<Command> {
        let commands = c.handle(QuizEvent::Choose(1));
        let follow_up = deferred(&commands);
        c.handle(follow_up)
    }

    #[test]
    fn test_start_requests_first_level() {
        let mut c: Controller =
            QuizController::new(LanguageDirection::RuEn, RecordingSink::default(), BrokenHost::default());
        assert_eq!(c.phase(), Phase::Idle);

        let commands = c.start();
        assert_eq!(
            commands,
            vec![Command::Load {
                serial: 1,
                direction: LanguageDirection::RuEn,
                level: Level::A1,
            }]
        );
        assert_eq!(c.phase(), Phase::Loading);
        assert_eq!(c.sink().loading, vec![Level::A1]);

        assert!(c.start().is_empty());
    }

    #[test]
    fn test_load_level_stops_timer_and_requests_list() {
        let mut c = fresh();
        c.start_timer();

        let commands = c.load_level(Level::B1);
        assert_eq!(
            commands,
            vec![
                Command::StopTicker,
                Command::Load {
                    serial: 2,
                    direction: LanguageDirection::EnRu,
                    level: Level::B1,
                },
            ]
        );
        assert_eq!(c.phase(), Phase::Loading);
        assert_eq!(c.state().level, Level::B1);
        assert!(!c.timer().running);
        assert!(c.words().is_empty());
        assert_eq!(c.sink().loading, vec![Level::A1, Level::B1]);
    }

    #[test]
    fn test_present_next_picks_with_replacement() {
        let mut c: Controller =
            QuizController::new(LanguageDirection::EnRu, RecordingSink::default(), BrokenHost::default())
                .seeded(3);
        let commands = c.start();
        finish_load(&mut c, &commands, vec![word("cat", 1), word("dog", 0), word("owl", 2)]);

        for _ in 0..60 {
            c.present_next();
            assert_eq!(c.phase(), Phase::Presenting);
        }
        let shown = &c.sink().words;
        assert_eq!(shown.len(), 61);
        assert!(shown.windows(2).any(|pair| pair[0] == pair[1]));
        let mut distinct = shown.clone();
        distinct.sort();
        distinct.dedup();
        assert!(distinct.len() > 1);
        assert_eq!(c.round(), 61);
    }

    #[test]
    fn test_present_next_waits_for_load() {
        let mut c = fresh();
        let switch = c.set_language_direction(LanguageDirection::RuEn);
        assert!(c.words().is_empty());

        assert!(c.present_next().is_empty());
        assert_eq!(c.phase(), Phase::Loading);

        c.handle(QuizEvent::LoadFailed {
            serial: load_serial(&switch),
            message: "IO error: not found".to_string(),
        });
        assert!(c.present_next().is_empty());
        assert_eq!(c.phase(), Phase::LoadFailed);
        assert_eq!(c.sink().words, vec!["cat".to_string()]);
    }

    #[test]
    fn test_stop_timer_is_idempotent() {
        let mut c = fresh();
        assert!(c.stop_timer().is_empty());

        c.start_timer();
        assert_eq!(c.stop_timer(), vec![Command::StopTicker]);
        assert!(c.stop_timer().is_empty());
        assert!(!c.timer().running);
    }

    #[test]
    fn test_first_word_does_not_start_timer() {
        let c = fresh();
        assert_eq!(c.sink().words, vec!["cat".to_string()]);
        assert!(!c.timer().running);
        assert!(!c.state().answered);
    }

    #[test]
    fn test_stale_load_result_dropped() {
        let mut c: Controller =
            QuizController::new(LanguageDirection::EnRu, RecordingSink::default(), BrokenHost::default());
        let first = c.start();
        let second = c.set_language_direction(LanguageDirection::RuEn);
        assert_ne!(load_serial(&first), load_serial(&second));

        let stale = c.handle(QuizEvent::WordsLoaded {
            serial: load_serial(&first),
            words: words(),
        });
        assert!(stale.is_empty());
        assert!(c.words().is_empty());
        assert_eq!(c.phase(), Phase::Loading);
    }

    #[test]
    fn test_load_failure_waits_for_retry() {
        let mut c: Controller =
            QuizController::new(LanguageDirection::EnRu, RecordingSink::default(), BrokenHost::default());
        let commands = c.start();
        let serial = load_serial(&commands);

        let after = c.handle(QuizEvent::LoadFailed {
            serial,
            message: "IO error: not found".to_string(),
        });
        assert!(after.is_empty());
        assert_eq!(c.phase(), Phase::LoadFailed);
        assert_eq!(
            c.sink().errors,
            vec![(Level::A1, "IO error: not found".to_string())]
        );

        let retry = c.handle(QuizEvent::Retry);
        assert_eq!(load_serial(&retry), serial + 1);
        assert_eq!(c.phase(), Phase::Loading);
        assert!(c.handle(QuizEvent::Retry).is_empty());
    }

    #[test]
    fn test_empty_word_list_is_load_failure() {
        let mut c: Controller =
            QuizController::new(LanguageDirection::EnRu, RecordingSink::default(), BrokenHost::default());
        let commands = c.start();
        c.handle(QuizEvent::WordsLoaded {
            serial: load_serial(&commands),
            words: Vec::new(),
        });
        assert_eq!(c.phase(), Phase::LoadFailed);
        assert_eq!(c.sink().errors.len(), 1);
    }

    #[test]
    fn test_streak_max_advances_level_once() {
        let mut c = fresh();
        for expected in 1..STREAK_MAX {
            answer_correctly(&mut c);
            assert_eq!(c.state().streak, expected);
            assert_eq!(c.state().level, Level::A1);
        }

        let commands = c.handle(QuizEvent::Choose(1));
        assert_eq!(c.state().streak, 0);
        assert_eq!(c.state().level, Level::A2);
        let follow_up = deferred(&commands);
        assert!(matches!(follow_up, QuizEvent::LevelUp { .. }));

        let reload = c.handle(follow_up);
        assert!(reload.contains(&Command::Load {
            serial: 2,
            direction: LanguageDirection::EnRu,
            level: Level::A2,
        }));
        assert_eq!(c.sink().loading, vec![Level::A1, Level::A2]);
    }

    #[test]
    fn test_streak_nine_correct_scenario() {
        let mut c = controller_at(SessionState {
            streak: 9,
            ..SessionState::default()
        });
        let commands = c.handle(QuizEvent::Choose(1));
        assert_eq!(c.state().streak, 0);
        assert_eq!(c.state().level, Level::A2);

        let reload = c.handle(deferred(&commands));
        assert_eq!(load_serial(&reload), 2);
        assert!(matches!(
            reload.last(),
            Some(Command::Load { level: Level::A2, .. })
        ));
    }

    #[test]
    fn test_top_level_fills_mastery_then_score() {
        let mut c = controller_at(SessionState {
            level: Level::C2,
            streak: 9,
            mastery: 9,
            score: 3,
            ..SessionState::default()
        });
        let commands = c.handle(QuizEvent::Choose(1));

        let state = c.state();
        assert_eq!(state.streak, 0);
        assert_eq!(state.mastery, 0);
        assert_eq!(state.score, 4);
        assert_eq!(state.level, Level::C2);
        assert!(matches!(deferred(&commands), QuizEvent::NextWord { .. }));
        assert!(!commands.iter().any(|c| matches!(c, Command::Load { .. })));
    }

    #[test]
    fn test_top_level_streak_max_bumps_mastery_only() {
        let mut c = controller_at(SessionState {
            level: Level::C2,
            streak: 9,
            mastery: 2,
            ..SessionState::default()
        });
        c.handle(QuizEvent::Choose(1));
        assert_eq!(c.state().mastery, 3);
        assert_eq!(c.state().score, 0);
        assert_eq!(c.state().level, Level::C2);
    }

    #[test]
    fn test_wrong_answer_demotes_after_delay() {
        let mut c = controller_at(SessionState {
            level: Level::B1,
            streak: 4,
            ..SessionState::default()
        });
        let commands = c.handle(QuizEvent::Choose(0));
        assert!(commands.contains(&Command::Defer {
            delay: WRONG_ANSWER_DELAY,
            event: QuizEvent::ResolveWrong { round: c.round() },
        }));
        // Nothing moves until the delay has elapsed.
        assert_eq!(c.state().streak, 4);
        assert_eq!(c.state().level, Level::B1);
        assert_eq!(c.sink().outcomes, vec![Outcome::Wrong { selected: Some(0) }]);

        let reload = c.handle(deferred(&commands));
        assert_eq!(c.state().streak, 0);
        assert_eq!(c.state().level, Level::A2);
        assert!(matches!(
            reload.last(),
            Some(Command::Load { level: Level::A2, .. })
        ));
    }

    #[test]
    fn test_wrong_answer_at_bottom_presents_new_word() {
        let mut c = controller_at(SessionState {
            streak: 6,
            ..SessionState::default()
        });
        let round = c.round();
        let commands = c.handle(QuizEvent::Choose(2));
        let after = c.handle(deferred(&commands));

        assert!(!after.iter().any(|c| matches!(c, Command::Load { .. })));
        assert_eq!(c.state().level, Level::A1);
        assert_eq!(c.state().streak, 0);
        assert_eq!(c.round(), round + 1);
        assert_eq!(c.phase(), Phase::Presenting);
        assert_eq!(c.sink().words.len(), 2);
    }

    #[test]
    fn test_second_answer_ignored() {
        let mut c = fresh();
        c.handle(QuizEvent::Choose(1));
        let snapshot = c.state().clone();

        assert!(c.handle(QuizEvent::Choose(0)).is_empty());
        assert!(c.submit_answer(true).is_empty());
        assert_eq!(c.state(), &snapshot);
        assert_eq!(c.sink().outcomes.len(), 1);
    }

    #[test]
    fn test_timeout_matches_explicit_wrong_answer() {
        let start = SessionState {
            level: Level::B2,
            streak: 2,
            ..SessionState::default()
        };

        let mut clicked = controller_at(start.clone());
        answer_correctly(&mut clicked);
        let commands = clicked.handle(QuizEvent::Choose(3));
        clicked.handle(deferred(&commands));

        let mut timed_out = controller_at(start);
        let next = answer_correctly(&mut timed_out);
        let start_timer = deferred(&next);
        assert_eq!(
            start_timer,
            QuizEvent::StartTimer {
                round: timed_out.round()
            }
        );
        let armed = timed_out.handle(start_timer);
        let generation = match armed.as_slice() {
            [Command::StartTicker { generation }] => *generation,
            other => panic!("unexpected commands: {:?}", other),
        };

        for _ in 1..TIMER_DURATION {
            timed_out.handle(QuizEvent::TimerTick { generation });
        }
        let last = timed_out.handle(QuizEvent::TimerTick { generation });
        assert!(last.contains(&Command::StopTicker));
        assert_eq!(
            timed_out.sink().outcomes.last(),
            Some(&Outcome::Wrong { selected: None })
        );
        timed_out.handle(deferred(&last));

        assert_eq!(clicked.state(), timed_out.state());
        assert_eq!(timed_out.state().level, Level::B1);
        assert_eq!(timed_out.state().streak, 0);
    }

    #[test]
    fn test_timer_warnings_reach_sink() {
        let mut c = fresh();
        let commands = c.start_timer();
        let generation = match commands.as_slice() {
            [Command::StartTicker { generation }] => *generation,
            other => panic!("unexpected commands: {:?}", other),
        };
        for _ in 0..8 {
            c.handle(QuizEvent::TimerTick { generation });
        }
        let warnings: Vec<TimerWarning> = c.sink().timers.iter().map(|t| t.warning).collect();
        assert!(warnings.contains(&TimerWarning::Caution));
        assert_eq!(warnings.last(), Some(&TimerWarning::Critical));
        assert_eq!(c.timer().remaining, 2);
    }

    #[test]
    fn test_answer_stops_running_timer() {
        let mut c = fresh();
        let commands = c.start_timer();
        let generation = match commands.as_slice() {
            [Command::StartTicker { generation }] => *generation,
            other => panic!("unexpected commands: {:?}", other),
        };

        let answered = c.handle(QuizEvent::Choose(1));
        assert_eq!(answered.first(), Some(&Command::StopTicker));
        assert!(!c.timer().running);
        assert!(c.handle(QuizEvent::TimerTick { generation }).is_empty());
    }

    #[test]
    fn test_no_timer_after_wrong_answer() {
        let mut c = fresh();
        answer_correctly(&mut c);
        assert!(c.state().auto_start_timer);

        let commands = c.handle(QuizEvent::Choose(0));
        assert!(!c.state().auto_start_timer);
        let next = c.handle(deferred(&commands));
        assert!(!next.iter().any(|c| matches!(
            c,
            Command::Defer {
                event: QuizEvent::StartTimer { .. },
                ..
            }
        )));
    }

    #[test]
    fn test_late_timer_start_after_answer_dropped() {
        let mut c = fresh();
        let next = answer_correctly(&mut c);
        let start_timer = deferred(&next);

        c.handle(QuizEvent::Choose(1));
        assert!(c.handle(start_timer).is_empty());
        assert!(!c.timer().running);
        assert!(c.state().answered);
    }

    #[test]
    fn test_language_switch_scenario() {
        let mut c = controller_at(SessionState {
            level: Level::B2,
            streak: 5,
            mastery: 4,
            score: 2,
            auto_start_timer: true,
            ..SessionState::default()
        });
        let commands = c.handle(QuizEvent::SetDirection(LanguageDirection::RuEn));

        let state = c.state();
        assert_eq!(state.streak, 0);
        assert!(!state.auto_start_timer);
        assert_eq!(state.level, Level::B2);
        assert_eq!(state.mastery, 4);
        assert_eq!(state.score, 2);
        assert_eq!(
            commands.last(),
            Some(&Command::Load {
                serial: 2,
                direction: LanguageDirection::RuEn,
                level: Level::B2,
            })
        );
        assert_eq!(c.host().attempts, vec![Haptic::Selection]);
    }

    #[test]
    fn test_same_direction_is_noop() {
        let mut c = fresh();
        assert!(c.set_language_direction(LanguageDirection::EnRu).is_empty());
        assert_eq!(c.phase(), Phase::Presenting);
    }

    #[test]
    fn test_follow_up_dropped_after_language_switch() {
        let mut c = fresh();
        let commands = c.handle(QuizEvent::Choose(1));
        c.handle(QuizEvent::SetDirection(LanguageDirection::RuEn));

        assert!(c.handle(deferred(&commands)).is_empty());
        assert_eq!(c.phase(), Phase::Loading);
    }

    #[test]
    fn test_wrong_answer_demotes_across_language_switch() {
        let mut c = controller_at(SessionState {
            level: Level::B1,
            streak: 3,
            ..SessionState::default()
        });
        let commands = c.handle(QuizEvent::Choose(0));
        let switch = c.handle(QuizEvent::SetDirection(LanguageDirection::RuEn));
        assert_eq!(c.state().level, Level::B1);

        let reload = c.handle(deferred(&commands));
        assert_eq!(c.state().level, Level::A2);
        assert_eq!(c.state().streak, 0);
        assert_eq!(
            reload.last(),
            Some(&Command::Load {
                serial: 3,
                direction: LanguageDirection::RuEn,
                level: Level::A2,
            })
        );

        // The list requested by the switch arrives too late to count.
        let stale = c.handle(QuizEvent::WordsLoaded {
            serial: load_serial(&switch),
            words: words(),
        });
        assert!(stale.is_empty());
        assert_eq!(c.phase(), Phase::Loading);

        // The mistake is only counted once.
        assert!(c.handle(deferred(&commands)).is_empty());
        assert_eq!(c.state().level, Level::A2);
    }

    #[test]
    fn test_wrong_answer_at_bottom_across_language_switch() {
        let mut c = controller_at(SessionState {
            streak: 5,
            ..SessionState::default()
        });
        let commands = c.handle(QuizEvent::Choose(3));
        c.handle(QuizEvent::SetDirection(LanguageDirection::RuEn));

        let after = c.handle(deferred(&commands));
        assert!(after.is_empty());
        assert_eq!(c.state().level, Level::A1);
        assert_eq!(c.state().streak, 0);
        assert_eq!(c.phase(), Phase::Loading);
        assert_eq!(c.sink().words.len(), 1);
    }

    #[test]
    fn test_host_failures_do_not_block_progress() {
        let mut c = controller_at(SessionState {
            streak: 9,
            ..SessionState::default()
        });
        c.handle(QuizEvent::Choose(1));
        assert_eq!(c.host().attempts, vec![Haptic::Impact, Haptic::Success]);
        assert_eq!(c.state().level, Level::A2);
    }

    #[test]
    fn test_pause_disarms_timer_chain() {
        let mut c = fresh();
        answer_correctly(&mut c);
        let commands = c.start_timer();
        assert!(matches!(commands.as_slice(), [Command::StartTicker { .. }]));

        let paused = c.handle(QuizEvent::Pause);
        assert_eq!(paused, vec![Command::StopTicker]);
        assert!(!c.state().auto_start_timer);
        assert!(!c.timer().running);
    }
}
