pub mod commands;
pub mod format;
pub mod handlers;
pub mod images;
pub mod query;
pub mod registry;

pub use commands::{list_servers, server_info};
