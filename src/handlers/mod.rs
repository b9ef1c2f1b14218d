// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod health;
pub mod news;
pub mod response;

pub use health::config as health_config;
pub use news::config as news_config;
