//! Web form environment
//!
//! [`FormEnv`] turns a [`Page`] into an [`Environment`](crate::env::Environment). The page is a
//! narrow capability interface so that the agent and training loop never depend on a
//! particular browser automation library.

mod action;
mod element;
mod env;
mod reward;
mod state;

#[cfg(feature = "browser")]
pub mod chrome;

pub use action::{actions_for, sample_texts, ActionKind, FormAction};
pub use element::{ElementDescriptor, ElementKind};
pub use env::FormEnv;
pub use reward::RewardPolicy;
pub use state::FormState;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How far along the form is, as reported by the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Percentage of required fields filled, `0..=100`
    pub progress: f64,
    /// All required fields are filled
    pub complete: bool,
    /// The form was submitted successfully
    pub submitted: bool,
}

/// What an action that went through did to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performed {
    Changed,
    /// The element was already in the requested condition
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("element `{0}` not found")]
    ElementNotFound(String),

    #[error("element `{0}` is stale")]
    Stale(String),

    #[error("element `{id}` is not interactable: {reason}")]
    NotInteractable { id: String, reason: String },

    #[error("page script failed: {0}")]
    Script(String),

    #[error("browser session lost: {0}")]
    SessionLost(String),
}

impl PageError {
    /// Whether the page can no longer be used at all
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionLost(_))
    }
}

/// The capabilities [`FormEnv`] needs from a live page
pub trait Page {
    /// Bring the target page back to its initial condition
    fn load(&mut self) -> Result<(), PageError>;

    /// Interactive elements in document order
    fn list_interactive_elements(&mut self) -> Result<Vec<ElementDescriptor>, PageError>;

    fn completion(&mut self) -> Result<Completion, PageError>;

    /// Carry out `action` on `element`, which is the detected element the action targets
    fn perform(
        &mut self,
        action: &FormAction,
        element: &ElementDescriptor,
    ) -> Result<Performed, PageError>;
}
