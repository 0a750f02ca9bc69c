pub mod commands;
pub mod events;

pub use commands::{help, register};
