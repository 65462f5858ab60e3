//! Portal onboarding — institution setup workflow engine.

pub mod cli;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod store;
