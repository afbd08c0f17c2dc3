/// Frame indices and theta schedules.
pub mod core;
/// Crate error type.
pub mod error;
