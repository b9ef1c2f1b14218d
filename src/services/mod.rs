// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod article_service;
pub mod gallery;
pub mod upload;

pub use article_service::NewsService;
pub use gallery::GalleryAggregator;
pub use upload::UploadWriter;
