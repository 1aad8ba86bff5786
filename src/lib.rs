pub mod config;
pub mod handlers;
pub mod loader;
pub mod observability;
pub mod platform;
pub mod render;
pub mod uri;
pub mod worker;
