use crate::error::Result;

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite action space that is fixed for a given configuration of the environment.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Clone;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Clone;

    /// Get the actions available to the agent
    ///
    /// The set only changes when the environment is reset against a differently configured target.
    fn actions(&self) -> Vec<Self::Action>;

    /// Reset the environment to an initial state
    ///
    /// Calling this repeatedly must yield the same state every time.
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Result<Self::State>;

    /// Update the environment in response to an action taken by an agent
    ///
    /// Actions that cannot be carried out are penalized through the reward. An `Err` means
    /// the environment itself is no longer usable.
    fn step(&mut self, action: &Self::Action) -> Result<Transition<Self::State>>;
}

/// Outcome of a single [`Environment::step`]
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    /// The state observed after the action
    pub next_state: S,
    /// Reward for the action
    pub reward: f64,
    /// Whether the episode is over
    pub done: bool,
    /// Whether the episode ended because the goal was reached
    pub goal: bool,
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::{error::Error, web::PageError};

    use super::*;

    /// A corridor of `len` cells. Action `1` moves right, anything else stays put.
    ///
    /// Reaching the last cell is the goal. With `fail_after` set, every step after that many
    /// successful steps fails as if the underlying session had been lost.
    pub struct MockEnv {
        pub pos: u32,
        pub len: u32,
        pub actions: Vec<u8>,
        pub fail_after: Option<u32>,
        pub total_steps: u32,
        pub resets: u32,
    }

    impl MockEnv {
        pub fn new(len: u32) -> Self {
            Self {
                pos: 0,
                len,
                actions: vec![1, 0],
                fail_after: None,
                total_steps: 0,
                resets: 0,
            }
        }

        /// An environment whose episodes only ever end through the step budget
        pub fn endless() -> Self {
            Self {
                actions: vec![0, 1],
                ..Self::new(u32::MAX)
            }
        }
    }

    impl Environment for MockEnv {
        type State = u32;
        type Action = u8;

        fn actions(&self) -> Vec<Self::Action> {
            self.actions.clone()
        }

        fn reset(&mut self) -> Result<Self::State> {
            self.resets += 1;
            self.pos = 0;
            Ok(self.pos)
        }

        fn step(&mut self, action: &Self::Action) -> Result<Transition<Self::State>> {
            if self.fail_after.is_some_and(|n| self.total_steps >= n) {
                return Err(Error::Page(PageError::SessionLost(String::from(
                    "mock session closed",
                ))));
            }
            self.total_steps += 1;

            if *action == 1 {
                self.pos += 1;
            }
            let goal = self.pos + 1 >= self.len;
            let reward = match (goal, *action) {
                (true, _) => 10.0,
                (false, 1) => 1.0,
                _ => -0.1,
            };

            Ok(Transition {
                next_state: self.pos,
                reward,
                done: goal,
                goal,
            })
        }
    }

    #[test]
    fn mock_env_reaches_goal() {
        let mut env = MockEnv::new(3);
        assert_eq!(env.reset().unwrap(), 0);
        let first = env.step(&1).unwrap();
        assert_eq!((first.next_state, first.done), (1, false));
        let second = env.step(&1).unwrap();
        assert!(second.done && second.goal);
        assert_eq!(second.reward, 10.0);
    }

    #[test]
    fn mock_env_fails_after_limit() {
        let mut env = MockEnv::new(10);
        env.fail_after = Some(1);
        env.reset().unwrap();
        assert!(env.step(&0).is_ok());
        assert!(matches!(env.step(&0), Err(Error::Page(_))));
    }
}
