use std::fmt;

use crate::{algo::AgentParams, env::Transition};

/// Window used for the recent figures of a [`Summary`]
pub const RECENT_WINDOW: usize = 10;

/// Where a [`Session`] is in its lifecycle
///
/// `Idle → EpisodeRunning → EpisodeComplete → (Idle | SessionComplete)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    EpisodeRunning,
    EpisodeComplete,
    SessionComplete,
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured number of episodes was run
    EpisodeBudget,
    /// The agent met the mastery criterion
    Mastered,
}

/// An episode in progress
#[derive(Debug, Clone)]
pub struct Episode<S> {
    index: usize,
    total_reward: f64,
    steps: u32,
    done: bool,
    success: bool,
    state: S,
}

impl<S: Clone> Episode<S> {
    pub fn new(index: usize, initial: S) -> Self {
        Self {
            index,
            total_reward: 0.0,
            steps: 0,
            done: false,
            success: false,
            state: initial,
        }
    }

    /// Account for one step
    pub fn push(&mut self, transition: &Transition<S>) {
        self.total_reward += transition.reward;
        self.steps += 1;
        self.done = transition.done;
        self.success = transition.goal;
        self.state = transition.next_state.clone();
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn finish(self) -> EpisodeRecord<S> {
        EpisodeRecord {
            index: self.index,
            total_reward: self.total_reward,
            steps: self.steps,
            done: self.done,
            success: self.success,
            terminal_state: self.state,
        }
    }
}

/// Outcome of a finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord<S> {
    /// Zero-based position within the session
    pub index: usize,
    pub total_reward: f64,
    pub steps: u32,
    /// The environment reported a terminal state
    pub done: bool,
    /// The episode ended by reaching the goal
    pub success: bool,
    pub terminal_state: S,
}

/// Early stopping criterion
///
/// Reached after at least `min_episodes` episodes once either the last `streak` episodes all
/// succeeded or at least `rate` of the last `window` episodes did. Neither counts before that
/// many episodes have been played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mastery {
    pub min_episodes: usize,
    pub streak: usize,
    pub window: usize,
    pub rate: f64,
}

impl Default for Mastery {
    fn default() -> Self {
        Self {
            min_episodes: 5,
            streak: 3,
            window: 10,
            rate: 0.8,
        }
    }
}

impl Mastery {
    pub fn is_reached<S>(&self, records: &[EpisodeRecord<S>]) -> bool {
        if records.len() < self.min_episodes.max(1) {
            return false;
        }

        let on_streak = last(records, self.streak).is_some_and(|run| run.iter().all(|r| r.success));
        let by_rate =
            last(records, self.window).is_some_and(|window| success_rate(window) >= self.rate);

        on_streak || by_rate
    }
}

/// The last `n` records, `None` if there are fewer or `n` is zero
fn last<S>(records: &[EpisodeRecord<S>], n: usize) -> Option<&[EpisodeRecord<S>]> {
    (n > 0 && records.len() >= n).then(|| &records[records.len() - n..])
}

fn success_rate<S>(records: &[EpisodeRecord<S>]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().filter(|r| r.success).count() as f64 / records.len() as f64
}

fn average<S>(records: &[EpisodeRecord<S>], f: impl Fn(&EpisodeRecord<S>) -> f64) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(f).sum::<f64>() / records.len() as f64
}

/// A training session, passed to and returned from every
/// [`Trainer::step`](crate::trainer::Trainer::step)
#[derive(Debug, Clone)]
pub struct Session<S> {
    params: AgentParams,
    records: Vec<EpisodeRecord<S>>,
    phase: Phase,
    stop: Option<StopReason>,
}

impl<S> Session<S> {
    /// Start an idle session with the agent's parameters at this point
    pub fn new(params: AgentParams) -> Self {
        Self {
            params,
            records: Vec::new(),
            phase: Phase::Idle,
            stop: None,
        }
    }

    /// Agent parameters captured when the session started
    pub fn params(&self) -> AgentParams {
        self.params
    }

    pub fn records(&self) -> &[EpisodeRecord<S>] {
        &self.records
    }

    pub fn last(&self) -> Option<&EpisodeRecord<S>> {
        self.records.last()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::SessionComplete
    }

    /// Number of finished episodes
    pub fn completed(&self) -> usize {
        self.records.len()
    }

    pub fn successes(&self) -> usize {
        self.records.iter().filter(|r| r.success).count()
    }

    pub(crate) fn start_episode(&mut self) -> usize {
        debug_assert_eq!(self.phase, Phase::Idle);
        self.phase = Phase::EpisodeRunning;
        self.records.len()
    }

    pub(crate) fn finish_episode(&mut self, record: EpisodeRecord<S>) {
        debug_assert_eq!(self.phase, Phase::EpisodeRunning);
        self.records.push(record);
        self.phase = Phase::EpisodeComplete;
    }

    pub(crate) fn next_episode(&mut self) {
        self.phase = Phase::Idle;
    }

    pub(crate) fn complete(&mut self, reason: StopReason) {
        self.phase = Phase::SessionComplete;
        self.stop = Some(reason);
    }

    pub fn summary(&self) -> Summary {
        let records = &self.records;
        let recent = &records[records.len() - RECENT_WINDOW.min(records.len())..];
        Summary {
            episodes: records.len(),
            successes: self.successes(),
            success_rate: success_rate(records),
            average_reward: average(records, |r| r.total_reward),
            best_reward: records
                .iter()
                .map(|r| r.total_reward)
                .reduce(f64::max)
                .unwrap_or(0.0),
            average_steps: average(records, |r| r.steps as f64),
            recent_success_rate: success_rate(recent),
            recent_average_reward: average(recent, |r| r.total_reward),
        }
    }
}

/// Aggregate figures over a session
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub episodes: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub average_reward: f64,
    pub best_reward: f64,
    pub average_steps: f64,
    /// Success rate over the last [`RECENT_WINDOW`] episodes
    pub recent_success_rate: f64,
    pub recent_average_reward: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} episodes, {} successful ({:.1}%), avg reward {:.2}, best {:.2}, avg steps {:.1}, \
             recent success {:.1}%",
            self.episodes,
            self.successes,
            self.success_rate * 100.0,
            self.average_reward,
            self.best_reward,
            self.average_steps,
            self.recent_success_rate * 100.0,
        )
    }
}
