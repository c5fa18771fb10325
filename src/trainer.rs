use std::{fmt::Display, path::PathBuf};

use log::{debug, error, info, warn};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    algo::{Hashable, QTableAgent},
    config::TrainingConfig,
    decay::{self, Decay},
    env::Environment,
    error::{Error, Result},
    exp::Exp,
    session::{Episode, EpisodeRecord, Mastery, Session, StopReason},
    snapshot::Snapshot,
    training_log::TrainingLog,
};

/// Drives a [`QTableAgent`] through episodes of an [`Environment`]
///
/// A run goes [`begin`](Self::begin), [`step`](Self::step) until the session is complete, then
/// [`finish`](Self::finish). [`run`](Self::run) does all three. If the environment fails, the
/// table as it was after the last completed episode is saved before the error is returned.
pub struct Trainer<E, D = decay::Geometric>
where
    E: Environment,
    E::State: Hashable,
    E::Action: Hashable,
    D: Decay,
{
    env: E,
    agent: QTableAgent<E, D>,
    episodes: usize,
    max_steps: u32,
    snapshot_path: PathBuf,
    log_path: Option<PathBuf>,
    mastery: Option<Mastery>,
    log: Option<TrainingLog>,
    checkpoint: Option<Snapshot<E::State, E::Action>>,
}

impl<E, D> Trainer<E, D>
where
    E: Environment,
    E::State: Hashable + Serialize + DeserializeOwned + Display,
    E::Action: Hashable + Serialize + DeserializeOwned + Display,
    D: Decay,
{
    pub fn new(env: E, agent: QTableAgent<E, D>, config: &TrainingConfig) -> Self {
        Self {
            env,
            agent,
            episodes: config.episodes,
            max_steps: config.max_steps,
            snapshot_path: config.snapshot_path.clone(),
            log_path: config.log_path.clone(),
            mastery: config.mastery(),
            log: None,
            checkpoint: None,
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn agent(&self) -> &QTableAgent<E, D> {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut QTableAgent<E, D> {
        &mut self.agent
    }

    pub fn into_parts(self) -> (E, QTableAgent<E, D>) {
        (self.env, self.agent)
    }

    /// Restore the agent from its snapshot, open the training log and start a session
    ///
    /// A missing or unreadable snapshot is not an error, training then starts from an empty table.
    pub fn begin(&mut self) -> Result<Session<E::State>> {
        match self.agent.load(&self.snapshot_path) {
            Ok(()) => {}
            Err(err) if err.is_missing_snapshot() => info!(
                "no snapshot at {}, starting with an empty table",
                self.snapshot_path.display()
            ),
            Err(err) if err.is_recoverable() => {
                warn!("{err}, starting with an empty table")
            }
            Err(err) => return Err(err),
        }

        if let Some(path) = &self.log_path {
            self.log = Some(TrainingLog::create(path)?);
        }
        self.checkpoint = Some(self.agent.snapshot());

        let mut session = Session::new(self.agent.params());
        let params = session.params();
        info!(
            "starting session of up to {} episodes: α={} γ={} ε={:.3}",
            self.episodes, params.learning_rate, params.discount_factor, params.exploration_rate
        );
        if self.episodes == 0 {
            session.complete(StopReason::EpisodeBudget);
        }
        Ok(session)
    }

    /// Run exactly one episode of `session`
    ///
    /// A complete session is returned untouched. On failure the session is consumed and the
    /// error is an [`Error::SessionAborted`].
    pub fn step(&mut self, mut session: Session<E::State>) -> Result<Session<E::State>> {
        if session.is_complete() {
            return Ok(session);
        }

        let index = session.start_episode();
        let record = match self.run_episode(index) {
            Ok(record) => record,
            Err(err) => return Err(self.abort(err, session.completed())),
        };

        info!(
            "episode {}: reward {:.2}, {} steps, {}, ε={:.3}",
            index + 1,
            record.total_reward,
            record.steps,
            if record.success { "success" } else { "no success" },
            self.agent.epsilon()
        );
        if let Err(err) = self.log_record(&record) {
            return Err(self.abort(err, session.completed()));
        }

        self.agent.end_episode();
        self.checkpoint = Some(self.agent.snapshot());
        session.finish_episode(record);

        if session.completed() >= self.episodes {
            session.complete(StopReason::EpisodeBudget);
        } else if self
            .mastery
            .is_some_and(|mastery| mastery.is_reached(session.records()))
        {
            info!("mastered after {} episodes", session.completed());
            session.complete(StopReason::Mastered);
        } else {
            session.next_episode();
        }
        Ok(session)
    }

    /// Save the agent and flush the training log
    pub fn finish(&mut self, session: &Session<E::State>) -> Result<()> {
        self.agent.save(&self.snapshot_path)?;
        if let Some(log) = &mut self.log {
            log.flush()?;
        }
        info!("session finished: {}", session.summary());
        Ok(())
    }

    /// Train until the episode budget is used up or the agent masters the environment
    pub fn run(&mut self) -> Result<Session<E::State>> {
        let mut session = self.begin()?;
        while !session.is_complete() {
            session = self.step(session)?;
        }
        self.finish(&session)?;
        Ok(session)
    }

    /// Persist the last checkpoint and wrap `err` in [`Error::SessionAborted`]
    pub fn abort(&mut self, err: Error, completed: usize) -> Error {
        error!("aborting after {completed} completed episodes: {err}");

        if let Some(checkpoint) = &self.checkpoint {
            match checkpoint.write(&self.snapshot_path) {
                Ok(()) => info!(
                    "saved checkpoint with {} Q values to {}",
                    checkpoint.len(),
                    self.snapshot_path.display()
                ),
                Err(write_err) => error!("failed to save checkpoint: {write_err}"),
            }
        }
        if let Some(log) = &mut self.log {
            if let Err(flush_err) = log.flush() {
                warn!("failed to flush training log: {flush_err}");
            }
        }

        Error::SessionAborted {
            completed,
            source: Box::new(err),
        }
    }

    fn log_record(&mut self, record: &EpisodeRecord<E::State>) -> Result<()> {
        match &mut self.log {
            Some(log) => log.append(record),
            None => Ok(()),
        }
    }

    fn run_episode(&mut self, index: usize) -> Result<EpisodeRecord<E::State>> {
        let mut state = self.env.reset()?;
        let actions = self.env.actions();
        let mut episode = Episode::new(index, state.clone());

        while episode.steps() < self.max_steps {
            let Some(action) = self.agent.choose_action(&state, &actions) else {
                warn!("no actions available in {state}, ending episode");
                break;
            };

            let transition = self.env.step(&action)?;
            debug!(
                "step {}: {action} -> {} ({:.2})",
                episode.steps() + 1,
                transition.next_state,
                transition.reward
            );
            episode.push(&transition);

            let experience = Exp {
                state,
                action,
                reward: transition.reward,
                next_state: transition.next_state,
                done: transition.done,
            };
            self.agent.update(&experience, &self.env.actions());
            state = experience.next_state;

            if experience.done {
                break;
            }
        }

        Ok(episode.finish())
    }
}
