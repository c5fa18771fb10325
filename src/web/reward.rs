use serde::{Deserialize, Serialize};

use super::{
    ActionKind, Completion, ElementDescriptor, ElementKind, FormAction, PageError, Performed,
};

/// Reward shaping coefficients
///
/// These are tuning knobs rather than fixed values. Every field can be overridden from the
/// training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    /// Reward per percentage point of progress gained
    pub progress_scale: f64,
    /// Reward when progress goes backwards
    pub regress_penalty: f64,
    /// Paid once per episode when every required field is filled
    pub completion_bonus: f64,
    /// Paid when the form is submitted successfully
    pub submission_bonus: f64,

    pub type_required_reward: f64,
    pub type_reward: f64,
    pub select_reward: f64,
    pub check_required_reward: f64,
    pub toggle_reward: f64,
    pub clear_reward: f64,
    pub submit_click_reward: f64,
    pub button_click_reward: f64,
    pub click_reward: f64,
    pub submit_reward: f64,
    /// Reward for an action that found the element already in the requested condition
    pub redundant_reward: f64,

    /// Target element missing or stale
    pub missing_penalty: f64,
    /// Target element disabled or not interactable
    pub blocked_penalty: f64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            progress_scale: 0.1,
            regress_penalty: -0.2,
            completion_bonus: 5.0,
            submission_bonus: 10.0,
            type_required_reward: 2.0,
            type_reward: 1.0,
            select_reward: 1.5,
            check_required_reward: 2.0,
            toggle_reward: 1.0,
            clear_reward: 0.5,
            submit_click_reward: 0.5,
            button_click_reward: 0.3,
            click_reward: 0.1,
            submit_reward: 0.5,
            redundant_reward: 0.0,
            missing_penalty: -0.2,
            blocked_penalty: -0.1,
        }
    }
}

impl RewardPolicy {
    /// Shaping reward for an action the page carried out
    ///
    /// `element` is the target as observed before the action. Typing, selecting or checking
    /// only pays when it fills an element that was empty.
    pub fn action_reward(
        &self,
        action: &FormAction,
        element: &ElementDescriptor,
        performed: Performed,
    ) -> f64 {
        let fills = matches!(
            action.kind,
            ActionKind::Type | ActionKind::Select | ActionKind::Check
        );
        if performed == Performed::Unchanged || (fills && element.filled) {
            return self.redundant_reward;
        }
        match action.kind {
            ActionKind::Type if element.required => self.type_required_reward,
            ActionKind::Type => self.type_reward,
            ActionKind::Select => self.select_reward,
            ActionKind::Check if element.required => self.check_required_reward,
            ActionKind::Check | ActionKind::Uncheck => self.toggle_reward,
            ActionKind::Clear => self.clear_reward,
            ActionKind::Submit => self.submit_reward,
            ActionKind::Click => match element.kind {
                ElementKind::Submit => self.submit_click_reward,
                ElementKind::Button => self.button_click_reward,
                _ => self.click_reward,
            },
        }
    }

    /// Penalty for an action the page could not carry out
    pub fn failure_penalty(&self, err: &PageError) -> f64 {
        match err {
            PageError::ElementNotFound(_) | PageError::Stale(_) => self.missing_penalty,
            _ => self.blocked_penalty,
        }
    }

    /// Reward for the change in completion caused by one step
    ///
    /// `best` is the highest progress reached earlier in the episode. Only progress above it is
    /// paid, so regaining lost ground earns nothing. Does not include the completion bonus, which
    /// is paid at most once per episode.
    pub fn progress_reward(&self, before: &Completion, after: &Completion, best: f64) -> f64 {
        let mut reward = if after.progress > best {
            (after.progress - best) * self.progress_scale
        } else if after.progress < before.progress {
            self.regress_penalty
        } else {
            0.0
        };
        if after.submitted && !before.submitted {
            reward += self.submission_bonus;
        }
        reward
    }
}
