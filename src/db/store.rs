// src/db/store.rs
// DOCUMENTATION: Storage gateway contract for news articles and photos
// PURPOSE: Transaction-scoped SQL operations, no business rules

use crate::db::OpContext;
use crate::errors::NewsError;
use crate::models::{Article, ArticlePhotoRow, Photo};
use async_trait::async_trait;

/// Row lock taken on an article before dependent writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Blocks deletion while photos are attached
    Share,
    /// Blocks photo attachment while the article is deleted
    Update,
}

/// Storage gateway for the news subsystem
///
/// Every operation runs inside a caller-supplied unit of work. A `Tx` that is
/// dropped without `commit` is rolled back.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Unit-of-work handle threaded through every call
    type Tx: Send;

    async fn begin(&self, ctx: &OpContext) -> Result<Self::Tx, NewsError>;

    async fn commit(&self, ctx: &OpContext, tx: Self::Tx) -> Result<(), NewsError>;

    /// Insert the article row followed by one row per photo
    async fn insert_article_with_photos(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article: &Article,
        photos: &[Photo],
    ) -> Result<(), NewsError>;

    /// Insert one photo; `NotFound` when the owning article is gone
    async fn insert_photo(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        photo: &Photo,
    ) -> Result<(), NewsError>;

    /// Lock the article row for the rest of the unit of work; false when missing
    async fn lock_article(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
        mode: LockMode,
    ) -> Result<bool, NewsError>;

    /// All articles joined with their photos, ordered by (article id, photo id)
    async fn list_articles_joined(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
    ) -> Result<Vec<ArticlePhotoRow>, NewsError>;

    /// One article joined with its photos, ordered by photo id; empty when missing
    async fn get_article_joined(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<Vec<ArticlePhotoRow>, NewsError>;

    /// Update scalar columns; returns affected rows
    async fn update_article_scalars(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article: &Article,
    ) -> Result<u64, NewsError>;

    async fn delete_photos_by_article(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<u64, NewsError>;

    async fn delete_article(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<u64, NewsError>;

    async fn delete_photo_by_filename(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        filename: &str,
    ) -> Result<u64, NewsError>;

    /// Delete photo rows by filename; returns the filenames that had a row
    async fn delete_photos_by_filenames(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        filenames: &[String],
    ) -> Result<Vec<String>, NewsError>;

    async fn list_photos_by_article(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<Vec<Photo>, NewsError>;
}
