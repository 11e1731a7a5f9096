//! Binary-side orchestration: runtime, terminal, progress and exit mapping.

pub(crate) mod context;
pub(crate) mod exit_handler;
pub(crate) mod progress_manager;
pub(crate) mod runtime;
pub(crate) mod terminal;
