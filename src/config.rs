use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    algo::QTableAgentConfig,
    decay::Geometric,
    ensure_interval,
    error::{Error, Result},
    exploration::EpsilonGreedy,
    session::Mastery,
    web::{FormEnv, Page, RewardPolicy},
};

/// Settings for a training run
///
/// Read from a flat TOML table in which every key is optional. Reward coefficients sit at the
/// top level next to the other keys.
///
/// ```toml
/// episodes = 50
/// exploration_rate = 0.3
/// completion_bonus = 8.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Step budget of a single episode
    pub max_steps: u32,
    pub learning_rate: f64,
    pub discount_factor: f64,
    /// Initial exploration rate
    pub exploration_rate: f64,
    /// Factor applied to the exploration rate after every episode
    pub exploration_decay: f64,
    pub exploration_min: f64,
    pub seed: Option<u64>,
    pub snapshot_path: PathBuf,
    pub log_path: Option<PathBuf>,
    pub stop_on_mastery: bool,
    pub mastery_min_episodes: usize,
    pub mastery_streak: usize,
    pub mastery_window: usize,
    pub mastery_rate: f64,
    /// End the episode as soon as every required field is filled instead of waiting for a submit
    pub end_on_completion: bool,
    #[serde(flatten)]
    pub reward: RewardPolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 20,
            max_steps: 15,
            learning_rate: 0.15,
            discount_factor: 0.95,
            exploration_rate: 0.4,
            exploration_decay: 0.95,
            exploration_min: 0.01,
            seed: None,
            snapshot_path: PathBuf::from("trained_model.json"),
            log_path: None,
            stop_on_mastery: true,
            mastery_min_episodes: 5,
            mastery_streak: 3,
            mastery_window: 10,
            mastery_rate: 0.8,
            end_on_completion: true,
            reward: RewardPolicy::default(),
        }
    }
}

impl TrainingConfig {
    /// Parse and validate a configuration
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// **Errors** with [`Error::Config`] naming the first out-of-range value
    pub fn validate(&self) -> Result<()> {
        let &Self {
            episodes,
            max_steps,
            learning_rate,
            discount_factor,
            exploration_rate,
            exploration_decay,
            exploration_min,
            mastery_streak,
            mastery_window,
            mastery_rate,
            ..
        } = self;

        if episodes == 0 {
            return Err(Error::Config(String::from("`episodes` must be at least 1")));
        }
        if max_steps == 0 {
            return Err(Error::Config(String::from("`max_steps` must be at least 1")));
        }
        ensure_interval!(learning_rate, 0.0, 1.0);
        ensure_interval!(discount_factor, 0.0, 1.0);
        ensure_interval!(exploration_rate, 0.0, 1.0);
        ensure_interval!(exploration_min, 0.0, exploration_rate);
        ensure_interval!(exploration_decay, f64::MIN_POSITIVE, 1.0);
        ensure_interval!(mastery_rate, 0.0, 1.0);
        if mastery_streak == 0 || mastery_window == 0 {
            return Err(Error::Config(String::from(
                "`mastery_streak` and `mastery_window` must be at least 1",
            )));
        }

        if let Some((key, value)) = self.reward_values().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Config(format!("invalid value for `{key}`: {value}")));
        }
        Ok(())
    }

    fn reward_values(&self) -> impl Iterator<Item = (&'static str, f64)> {
        let r = &self.reward;
        [
            ("progress_scale", r.progress_scale),
            ("regress_penalty", r.regress_penalty),
            ("completion_bonus", r.completion_bonus),
            ("submission_bonus", r.submission_bonus),
            ("type_required_reward", r.type_required_reward),
            ("type_reward", r.type_reward),
            ("select_reward", r.select_reward),
            ("check_required_reward", r.check_required_reward),
            ("toggle_reward", r.toggle_reward),
            ("clear_reward", r.clear_reward),
            ("submit_click_reward", r.submit_click_reward),
            ("button_click_reward", r.button_click_reward),
            ("click_reward", r.click_reward),
            ("submit_reward", r.submit_reward),
            ("redundant_reward", r.redundant_reward),
            ("missing_penalty", r.missing_penalty),
            ("blocked_penalty", r.blocked_penalty),
        ]
        .into_iter()
    }

    /// Agent configuration with a geometrically decaying exploration rate
    pub fn agent_config(&self) -> Result<QTableAgentConfig<Geometric>> {
        Ok(QTableAgentConfig {
            exploration: EpsilonGreedy::new(Geometric::new(
                self.exploration_decay,
                self.exploration_rate,
                self.exploration_min,
            )?),
            alpha: self.learning_rate,
            gamma: self.discount_factor,
            seed: self.seed,
        })
    }

    /// Early stopping criterion, `None` if disabled
    pub fn mastery(&self) -> Option<Mastery> {
        self.stop_on_mastery.then_some(Mastery {
            min_episodes: self.mastery_min_episodes,
            streak: self.mastery_streak,
            window: self.mastery_window,
            rate: self.mastery_rate,
        })
    }

    /// Wrap `page` in an environment using these reward coefficients and step budget
    pub fn form_env<P: Page>(&self, page: P) -> FormEnv<P> {
        FormEnv::new(page)
            .with_policy(self.reward.clone())
            .with_step_budget(self.max_steps)
            .end_on_completion(self.end_on_completion)
    }
}
