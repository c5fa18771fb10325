//! Tabular Q-learning agent that learns to fill out web forms

/// Implemented RL algorithms
pub mod algo;

/// Training configuration
pub mod config;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Environment
pub mod env;

/// Error types
pub mod error;

/// Experience
pub mod exp;

/// Exploration policies
pub mod exploration;

/// Training sessions and episode records
pub mod session;

/// Q-table persistence
pub mod snapshot;

/// Training loop
pub mod trainer;

/// CSV training log
pub mod training_log;

/// Web form environment
pub mod web;

/// Testing environments
#[cfg(any(test, feature = "gym"))]
pub mod gym;

mod util;

pub use error::{Error, Result};
