// src/models/article.rs
// DOCUMENTATION: News article and gallery photo models
// PURPOSE: Database rows, request DTOs and response DTOs for the news subsystem

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// News article as stored in the `news` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub category: String,
    /// Event date, kept as the string the client sent
    pub event_date: String,
    pub description: String,
    /// RFC 3339 creation time, set once on insert
    pub created_at: String,
}

/// Gallery photo as stored in the `news_photos` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Photo {
    pub id: String,
    pub news_id: String,
    /// Generated name of the file inside the news upload directory
    pub filename: String,
}

/// One row of the `news LEFT JOIN news_photos` query
/// DOCUMENTATION: Article columns repeat on every row; an article without
/// photos yields a single row whose photo columns are empty strings
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ArticlePhotoRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub event_date: String,
    pub description: String,
    pub created_at: String,
    pub photo_id: String,
    pub photo_filename: String,
}

impl ArticlePhotoRow {
    pub fn article(&self) -> Article {
        Article {
            id: self.id.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            event_date: self.event_date.clone(),
            description: self.description.clone(),
            created_at: self.created_at.clone(),
        }
    }

    /// Photo carried by this row, if the join matched one
    pub fn photo(&self) -> Option<Photo> {
        if self.photo_id.is_empty() {
            return None;
        }
        Some(Photo {
            id: self.photo_id.clone(),
            news_id: self.id.clone(),
            filename: self.photo_filename.clone(),
        })
    }
}

/// Article with its ordered gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleWithPhotos {
    pub article: Article,
    pub photos: Vec<Photo>,
}

impl ArticleWithPhotos {
    /// Convert into the API response DTO
    pub fn to_response(&self) -> ArticleResponse {
        ArticleResponse {
            id: self.article.id.clone(),
            title: self.article.title.clone(),
            category: self.article.category.clone(),
            event_date: self.article.event_date.clone(),
            description: self.article.description.clone(),
            created_at: self.article.created_at.clone(),
            photos: self
                .photos
                .iter()
                .filter(|p| !p.filename.is_empty())
                .map(|p| p.filename.clone())
                .collect(),
        }
    }
}

/// Request DTO for creating a news article
/// DOCUMENTATION: Scalar multipart fields of POST /api/v1/news
/// Only the title is mandatory; photos travel separately as upload parts
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub event_date: String,

    #[serde(default)]
    pub description: String,
}

/// Request DTO for updating a news article
/// DOCUMENTATION: JSON body of PUT /api/v1/news/{id}
/// Every scalar is required; photos are never touched by an update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,

    #[validate(length(min = 1, message = "category must not be empty"))]
    pub category: String,

    #[validate(length(min = 1, message = "event_date must not be empty"))]
    pub event_date: String,

    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
}

/// Body of DELETE /api/v1/bulk/photo/news
#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeletePhotosRequest {
    #[serde(default)]
    pub filenames: Vec<String>,
}

/// Response DTO for API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub id: String,
    pub title: String,
    pub category: String,
    pub event_date: String,
    pub description: String,
    pub created_at: String,
    /// Stored filenames, in upload order
    pub photos: Vec<String>,
}
