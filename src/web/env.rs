use std::collections::HashSet;

use log::{debug, info, warn};

use crate::{
    env::{Environment, Transition},
    error::{Error, Result},
};

use super::{
    actions_for, ActionKind, Completion, ElementDescriptor, FormAction, FormState, Page, PageError,
    Performed, RewardPolicy,
};

/// Environment adapter that lets an agent fill out the form on a [`Page`]
///
/// The action set is rebuilt from the detected elements on every [`reset`](Environment::reset)
/// and stays fixed during an episode. An episode is done once the form is submitted, once all
/// required fields are filled (unless disabled with
/// [`end_on_completion`](Self::end_on_completion)), or when the step budget is used up.
///
/// Within an episode each kind of action pays its shaping reward at most once per element, and
/// progress is only paid above the episode's best so far.
pub struct FormEnv<P: Page> {
    page: P,
    policy: RewardPolicy,
    step_budget: u32,
    end_on_completion: bool,
    elements: Vec<ElementDescriptor>,
    completion: Completion,
    actions: Vec<FormAction>,
    steps: u32,
    completion_paid: bool,
    best_progress: f64,
    shaped: HashSet<(String, ActionKind)>,
}

impl<P: Page> FormEnv<P> {
    pub fn new(page: P) -> Self {
        Self {
            page,
            policy: RewardPolicy::default(),
            step_budget: 50,
            end_on_completion: true,
            elements: Vec::new(),
            completion: Completion::default(),
            actions: Vec::new(),
            steps: 0,
            completion_paid: false,
            best_progress: 0.0,
            shaped: HashSet::new(),
        }
    }

    pub fn with_policy(mut self, policy: RewardPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Maximum number of steps before an episode is cut off
    pub fn with_step_budget(mut self, steps: u32) -> Self {
        self.step_budget = steps;
        self
    }

    /// Whether filling every required field ends the episode, or only a submission does
    pub fn end_on_completion(mut self, yes: bool) -> Self {
        self.end_on_completion = yes;
        self
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    pub fn elements(&self) -> &[ElementDescriptor] {
        &self.elements
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Steps taken in the current episode
    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn state(&self) -> FormState {
        FormState::observe(&self.elements, &self.completion)
    }

    /// Re-read elements and completion from the page
    ///
    /// Only a lost session is an error, anything else keeps the previous observation.
    fn refresh(&mut self) -> Result<()> {
        match self.page.list_interactive_elements() {
            Ok(elements) => self.elements = elements,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => warn!("keeping previous element list: {err}"),
        }
        match self.page.completion() {
            Ok(completion) => self.completion = completion,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => warn!("keeping previous completion: {err}"),
        }
        Ok(())
    }

    /// Carry out an action and return its shaping reward
    fn act(&mut self, action: &FormAction) -> Result<f64> {
        let Some(element) = self.elements.iter().find(|e| e.id == action.target).cloned() else {
            debug!("{action}: target not on page");
            return Ok(self
                .policy
                .failure_penalty(&PageError::ElementNotFound(action.target.clone())));
        };

        if !element.enabled {
            debug!("{action}: target disabled");
            return Ok(self.policy.blocked_penalty);
        }

        match self.page.perform(action, &element) {
            Ok(performed) => {
                debug!("{action}: {performed:?}");
                let repeated = performed == Performed::Changed
                    && !self.shaped.insert((element.id.clone(), action.kind));
                if repeated {
                    return Ok(self.policy.redundant_reward);
                }
                Ok(self.policy.action_reward(action, &element, performed))
            }
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                debug!("{action}: {err}");
                Ok(self.policy.failure_penalty(&err))
            }
        }
    }
}

impl<P: Page> Environment for FormEnv<P> {
    type State = FormState;
    type Action = FormAction;

    fn actions(&self) -> Vec<Self::Action> {
        self.actions.clone()
    }

    fn reset(&mut self) -> Result<Self::State> {
        self.page.load()?;
        self.elements = self.page.list_interactive_elements()?;
        self.completion = self.page.completion()?;

        let actions = actions_for(&self.elements);
        if actions.is_empty() {
            return Err(Error::NoActions);
        }
        if actions != self.actions {
            info!(
                "detected {} interactive elements, {} actions",
                self.elements.len(),
                actions.len()
            );
            self.actions = actions;
        }

        self.steps = 0;
        self.completion_paid = self.completion.complete;
        self.best_progress = self.completion.progress;
        self.shaped.clear();
        Ok(self.state())
    }

    fn step(&mut self, action: &Self::Action) -> Result<Transition<Self::State>> {
        self.steps += 1;
        let before = self.completion;

        let mut reward = self.act(action)?;
        self.refresh()?;

        let after = self.completion;
        reward += self
            .policy
            .progress_reward(&before, &after, self.best_progress);
        self.best_progress = self.best_progress.max(after.progress);
        if after.complete && !self.completion_paid {
            reward += self.policy.completion_bonus;
            self.completion_paid = true;
        }

        let goal = after.submitted || (after.complete && self.end_on_completion);
        let done = goal || self.steps >= self.step_budget;

        Ok(Transition {
            next_state: self.state(),
            reward,
            done,
            goal,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        gym::SimulatedForm,
        web::{ActionKind, ElementKind},
    };

    use super::*;

    fn env() -> FormEnv<SimulatedForm> {
        FormEnv::new(SimulatedForm::new()).with_step_budget(20)
    }

    fn type_into(target: &str, text: &str) -> FormAction {
        FormAction::new(ActionKind::Type, target).with_text(text)
    }

    #[test]
    fn repeated_resets_yield_initial_state() {
        let mut env = env();
        let first = env.reset().unwrap();
        let actions = env.actions();

        env.step(&type_into("fullName", "John Doe")).unwrap();
        env.step(&type_into("email", "test@example.com")).unwrap();

        assert_eq!(env.reset().unwrap(), first);
        assert_eq!(env.reset().unwrap(), first);
        assert_eq!(env.actions(), actions);
        assert_eq!(env.steps(), 0);
    }

    #[test]
    fn filling_a_required_field_is_rewarded() {
        let mut env = env();
        let initial = env.reset().unwrap();
        let t = env.step(&type_into("fullName", "John Doe")).unwrap();

        // shaping for a required field plus 25 points of progress
        assert!((t.reward - (2.0 + 2.5)).abs() < 1e-9, "{}", t.reward);
        assert!(!t.done);
        assert_ne!(t.next_state, initial);
        assert_eq!(t.next_state.filled, 1);
    }

    #[test]
    fn refilling_a_field_earns_nothing() {
        let mut env = env().with_step_budget(100);
        env.reset().unwrap();
        env.step(&type_into("fullName", "John Doe")).unwrap();

        let mut total = 0.0;
        for text in ["Jane Smith", "John Doe"].iter().cycle().take(10) {
            total += env.step(&type_into("fullName", text)).unwrap().reward;
        }
        assert_eq!(total, 0.0);

        let clear = FormAction::new(ActionKind::Clear, "fullName");
        for _ in 0..5 {
            total += env.step(&clear).unwrap().reward;
            total += env.step(&type_into("fullName", "John Doe")).unwrap().reward;
        }
        assert!(total <= 0.0, "{total}");
        assert_eq!(env.completion().progress, 25.0);
        assert_eq!(env.state().filled, 1);
    }

    #[test]
    fn toggling_a_checkbox_earns_nothing() {
        let mut env = env().with_step_budget(100).end_on_completion(false);
        env.reset().unwrap();
        env.step(&FormAction::new(ActionKind::Check, "terms"))
            .unwrap();

        let mut total = 0.0;
        for _ in 0..6 {
            for kind in [ActionKind::Uncheck, ActionKind::Check] {
                total += env.step(&FormAction::new(kind, "terms")).unwrap().reward;
            }
        }
        assert!(total <= 0.0, "{total}");
        assert_eq!(env.completion().progress, 25.0);
    }

    #[test]
    fn shaping_resets_with_the_episode() {
        let mut env = env();
        for _ in 0..2 {
            env.reset().unwrap();
            let t = env.step(&type_into("fullName", "John Doe")).unwrap();
            assert!((t.reward - (2.0 + 2.5)).abs() < 1e-9, "{}", t.reward);
        }
    }

    #[test]
    fn missing_element_is_penalized_not_fatal() {
        let mut env = env();
        let state = env.reset().unwrap();
        let t = env
            .step(&FormAction::new(ActionKind::Click, "doesNotExist"))
            .unwrap();
        assert_eq!(t.reward, -0.2);
        assert!(!t.done);
        assert_eq!(t.next_state, state);
    }

    #[test]
    fn disabled_element_is_penalized() {
        let mut env = env();
        env.reset().unwrap();
        let newsletter = env
            .elements()
            .iter()
            .find(|e| e.id == "newsletter")
            .unwrap();
        assert!(!newsletter.enabled);
        let t = env
            .step(&FormAction::new(ActionKind::Check, "newsletter"))
            .unwrap();
        assert_eq!(t.reward, -0.1);
        assert!(!t.done);
    }

    #[test]
    fn wrong_action_for_element_is_penalized() {
        let mut env = env();
        env.reset().unwrap();
        let t = env.step(&type_into("terms", "yes")).unwrap();
        assert_eq!(t.reward, -0.1);
    }

    #[test]
    fn completion_ends_episode_with_bonus() {
        let mut env = env();
        env.reset().unwrap();
        env.step(&type_into("fullName", "John Doe")).unwrap();
        env.step(&type_into("email", "test@example.com")).unwrap();
        env.step(&FormAction::new(ActionKind::Select, "age").with_text("26-35"))
            .unwrap();
        let t = env
            .step(&FormAction::new(ActionKind::Check, "terms"))
            .unwrap();

        assert!(t.done && t.goal);
        assert!(t.next_state.complete);
        // required checkbox + 25 points of progress + completion bonus
        assert!((t.reward - (2.0 + 2.5 + 5.0)).abs() < 1e-9, "{}", t.reward);
    }

    #[test]
    fn submission_is_the_goal_when_completion_does_not_end() {
        let mut env = env().end_on_completion(false);
        env.reset().unwrap();
        env.step(&type_into("fullName", "John Doe")).unwrap();
        env.step(&type_into("email", "test@example.com")).unwrap();
        env.step(&FormAction::new(ActionKind::Select, "age").with_text("18-25"))
            .unwrap();
        let filled = env
            .step(&FormAction::new(ActionKind::Check, "terms"))
            .unwrap();
        assert!(!filled.done);

        let t = env
            .step(&FormAction::new(ActionKind::Submit, "submitBtn"))
            .unwrap();
        assert!(t.done && t.goal);
        assert!(t.next_state.submitted);
        assert!((t.reward - (0.5 + 10.0)).abs() < 1e-9, "{}", t.reward);
    }

    #[test]
    fn early_submit_does_nothing() {
        let mut env = env().end_on_completion(false);
        env.reset().unwrap();
        let t = env
            .step(&FormAction::new(ActionKind::Submit, "submitBtn"))
            .unwrap();
        assert_eq!(t.reward, 0.0);
        assert!(!t.done);
    }

    #[test]
    fn step_budget_ends_episode() {
        let mut env = env().with_step_budget(3);
        env.reset().unwrap();
        let click = FormAction::new(ActionKind::Click, "fullName");
        assert!(!env.step(&click).unwrap().done);
        assert!(!env.step(&click).unwrap().done);
        let last = env.step(&click).unwrap();
        assert!(last.done);
        assert!(!last.goal);
    }

    #[test]
    fn lost_session_is_fatal() {
        let mut env = FormEnv::new(SimulatedForm::new().lose_session_after(1));
        env.reset().unwrap();
        let click = FormAction::new(ActionKind::Click, "fullName");
        assert!(env.step(&click).is_ok());
        let err = env.step(&click).unwrap_err();
        assert!(matches!(err, Error::Page(PageError::SessionLost(_))), "{err}");
    }

    #[test]
    fn empty_page_has_no_actions() {
        let mut env = FormEnv::new(SimulatedForm::with_elements(vec![ElementDescriptor::new(
            "decoration",
            ElementKind::Unknown,
        )]));
        assert!(matches!(env.reset(), Err(Error::NoActions)));
    }
}
