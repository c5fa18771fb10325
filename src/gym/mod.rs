//! Pages for training and testing without a browser

pub mod simulated_form;

pub use simulated_form::SimulatedForm;
