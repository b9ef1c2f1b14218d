// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod article_repository;
pub mod context;
#[cfg(test)]
pub mod memory_store;
pub mod store;

pub use article_repository::*;
pub use context::*;
pub use store::*;
