//! Sink implementations

pub mod console;
pub mod rotating_file;

pub use console::ConsoleSink;
pub use rotating_file::{RotatingFileSink, RotationPolicy};

pub use crate::core::Sink;
