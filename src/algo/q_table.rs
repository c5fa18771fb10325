use std::{collections::HashMap, path::Path};

use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    decay::{self, Decay},
    ensure_interval,
    env::Environment,
    error::Result,
    exp::Exp,
    exploration::{Choice, EpsilonGreedy},
    snapshot::{Entry, Snapshot},
};

use super::Hashable;

/// Hyperparameters of a [`QTableAgent`] at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub exploration_rate: f64,
}

/// Configuration for the [`QTableAgent`]
pub struct QTableAgentConfig<D: Decay = decay::Geometric> {
    pub exploration: EpsilonGreedy<D>,
    pub alpha: f64,
    pub gamma: f64,
    /// Seed for exploration, random if `None`
    pub seed: Option<u64>,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(decay::Geometric::default()),
            alpha: 0.1,
            gamma: 0.95,
            seed: None,
        }
    }
}

/// A simple Q-learning agent that utilizes a Q-table to learn its environment
///
/// ### Generics
/// - `E` - The [`Environment`] in which the agent will learn
///     - The state and action types are used as keys in a [`HashMap`], so both must be [`Hashable`]
/// - `D` - The [`Decay`] schedule of the exploration rate
///
/// Unknown state-action pairs have a Q value of zero. Entries are only ever inserted or
/// overwritten, so the table never shrinks during training.
pub struct QTableAgent<E, D = decay::Geometric>
where
    E: Environment,
    E::State: Hashable,
    E::Action: Hashable,
    D: Decay,
{
    q_table: HashMap<E::State, HashMap<E::Action, f64>>,
    exploration: EpsilonGreedy<D>,
    alpha: f64,   // learning rate
    gamma: f64,   // discount factor
    episode: u32, // completed episodes
    rng: StdRng,
}

impl<E, D> QTableAgent<E, D>
where
    E: Environment,
    E::State: Hashable,
    E::Action: Hashable,
    D: Decay,
{
    /// Initialize a new `QTableAgent`
    ///
    /// **Errors** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(config: QTableAgentConfig<D>) -> Result<Self> {
        let QTableAgentConfig {
            exploration,
            alpha,
            gamma,
            seed,
        } = config;
        ensure_interval!(alpha, 0.0, 1.0);
        ensure_interval!(gamma, 0.0, 1.0);

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            q_table: HashMap::new(),
            exploration,
            alpha,
            gamma,
            episode: 0,
            rng,
        })
    }

    /// Q value of a state-action pair, zero if it has never been updated
    pub fn value(&self, state: &E::State, action: &E::Action) -> f64 {
        self.q_table
            .get(state)
            .and_then(|row| row.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Highest Q value among `actions` in `state`, zero if `actions` is empty
    pub fn max_value(&self, state: &E::State, actions: &[E::Action]) -> f64 {
        actions
            .iter()
            .map(|a| self.value(state, a))
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// The action with the highest Q value in `state`
    ///
    /// Ties go to whichever action comes first in `actions`.
    pub fn best_action<'a>(
        &self,
        state: &E::State,
        actions: &'a [E::Action],
    ) -> Option<&'a E::Action> {
        let mut best: Option<(&E::Action, f64)> = None;
        for action in actions {
            let value = self.value(state, action);
            if best.map_or(true, |(_, v)| value > v) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Choose an action based on the current state and exploration policy
    ///
    /// **Returns** `None` only if `actions` is empty
    pub fn choose_action(
        &mut self,
        state: &E::State,
        actions: &[E::Action],
    ) -> Option<E::Action> {
        match self.exploration.choose(self.episode, &mut self.rng) {
            Choice::Explore => {
                let action = actions.choose(&mut self.rng).cloned();
                debug!("exploring: {action:?}");
                action
            }
            Choice::Exploit => {
                let action = self.best_action(state, actions).cloned();
                debug!("exploiting: {action:?}");
                action
            }
        }
    }

    /// Apply the Q-learning update for one transition
    ///
    /// Q(s,a) ← Q(s,a) + α(r + γ max<sub>a'</sub> Q(s',a') − Q(s,a)), where the future term is
    /// dropped when the transition is terminal.
    ///
    /// ### Parameters
    /// - `experience` - The observed transition
    /// - `next_actions` - The actions available in `next_state`, used for the max
    pub fn update(&mut self, experience: &Exp<E>, next_actions: &[E::Action]) {
        let Exp {
            state,
            action,
            reward,
            next_state,
            done,
        } = experience;

        let q_value = self.value(state, action);
        let future = if *done {
            0.0
        } else {
            self.max_value(next_state, next_actions)
        };
        let target = reward + self.gamma * future;
        let updated = q_value + self.alpha * (target - q_value);

        debug!("Q({state:?}, {action:?}) = {updated:.3} (was {q_value:.3}, reward {reward:.2})");

        self.q_table
            .entry(state.clone())
            .or_default()
            .insert(action.clone(), updated);
    }

    /// Mark the end of an episode, which advances the exploration schedule
    pub fn end_episode(&mut self) {
        self.episode += 1;
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon(self.episode)
    }

    /// Number of completed episodes, including those restored from a snapshot
    pub fn episodes(&self) -> u32 {
        self.episode
    }

    pub fn params(&self) -> AgentParams {
        AgentParams {
            learning_rate: self.alpha,
            discount_factor: self.gamma,
            exploration_rate: self.epsilon(),
        }
    }

    /// Number of state-action pairs in the table
    pub fn len(&self) -> usize {
        self.q_table.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct states in the table
    pub fn states(&self) -> usize {
        self.q_table.len()
    }

    /// Forget everything learned so far
    pub fn clear(&mut self) {
        self.q_table.clear();
        self.episode = 0;
    }

    /// Iterate over all `(state, action, value)` entries
    pub fn iter(&self) -> impl Iterator<Item = (&E::State, &E::Action, f64)> {
        self.q_table
            .iter()
            .flat_map(|(s, row)| row.iter().map(move |(a, v)| (s, a, *v)))
    }
}

impl<E, D> QTableAgent<E, D>
where
    E: Environment,
    E::State: Hashable + Serialize + DeserializeOwned,
    E::Action: Hashable + Serialize + DeserializeOwned,
    D: Decay,
{
    /// Capture the table, parameters and episode count
    pub fn snapshot(&self) -> Snapshot<E::State, E::Action> {
        let entries = self
            .iter()
            .map(|(state, action, value)| Entry {
                state: state.clone(),
                action: action.clone(),
                value,
            })
            .collect();
        Snapshot::new(self.params(), self.episode, entries)
    }

    /// Replace the table and episode count with the contents of a snapshot
    ///
    /// The learning rate and discount factor stay as configured.
    pub fn restore(&mut self, snapshot: Snapshot<E::State, E::Action>) {
        if snapshot.params.learning_rate != self.alpha
            || snapshot.params.discount_factor != self.gamma
        {
            info!(
                "snapshot was trained with α={} γ={}, continuing with α={} γ={}",
                snapshot.params.learning_rate,
                snapshot.params.discount_factor,
                self.alpha,
                self.gamma
            );
        }

        self.q_table.clear();
        for Entry {
            state,
            action,
            value,
        } in snapshot.entries
        {
            self.q_table.entry(state).or_default().insert(action, value);
        }
        self.episode = snapshot.episodes;
    }

    /// Write a snapshot of the agent to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.snapshot().write(path)?;
        info!(
            "saved {} Q values over {} states to {}",
            self.len(),
            self.states(),
            path.display()
        );
        Ok(())
    }

    /// Restore the agent from a snapshot at `path`
    ///
    /// On failure the agent is left with an empty table and the (recoverable) error is returned.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match Snapshot::read(path) {
            Ok(snapshot) => {
                self.restore(snapshot);
                info!(
                    "loaded {} Q values over {} states from {}",
                    self.len(),
                    self.states(),
                    path.display()
                );
                Ok(())
            }
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }
}
