// src/services/article_service.rs
// DOCUMENTATION: Business logic for news articles and their galleries
// PURPOSE: Coordinate validation, file writes, transactional DB writes and compensating cleanup

use crate::db::{ArticleStore, LockMode, OpContext, PgArticleRepository};
use crate::errors::NewsError;
use crate::models::{
    Article, ArticleResponse, ArticleWithPhotos, CreateArticleRequest, Photo,
    UpdateArticleRequest, UploadPart,
};
use crate::services::upload::{
    is_plain_filename, FileNaming, StoredBatch, MAX_FILES_PER_ADDITION, MAX_FILES_PER_ARTICLE,
};
use crate::services::{GalleryAggregator, UploadWriter};
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

/// Service wired to PostgreSQL, as used by the HTTP handlers
pub type NewsService = ArticleService<PgArticleRepository>;

/// Orchestrates the news subsystem
///
/// The service is the only writer of the news upload directory. Filesystem
/// changes never run ahead of committed database state: new files are
/// removed again when the transaction fails, and files of deleted rows are
/// removed only after commit.
pub struct ArticleService<S: ArticleStore> {
    store: S,
    uploads: UploadWriter,
    request_timeout: Duration,
}

/// Time-ordered identifier; keeps `ORDER BY id` equal to insertion order
fn new_id() -> String {
    Uuid::now_v7().to_string()
}

fn require_id(value: &str, field: &str) -> Result<(), NewsError> {
    if value.trim().is_empty() {
        return Err(NewsError::ValidationError(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn require_filename(filename: &str) -> Result<(), NewsError> {
    if !is_plain_filename(filename) {
        return Err(NewsError::ValidationError(format!(
            "invalid photo filename: {:?}",
            filename
        )));
    }
    Ok(())
}

fn photos_for(article_id: &str, stored: &StoredBatch) -> Vec<Photo> {
    stored
        .filenames()
        .iter()
        .map(|filename| Photo {
            id: new_id(),
            news_id: article_id.to_string(),
            filename: filename.clone(),
        })
        .collect()
}

impl<S: ArticleStore> ArticleService<S> {
    pub fn new(store: S, uploads: UploadWriter, request_timeout: Duration) -> Self {
        Self {
            store,
            uploads,
            request_timeout,
        }
    }

    fn context(&self) -> OpContext {
        OpContext::with_timeout(self.request_timeout)
    }

    /// Create an article with its initial gallery
    /// DOCUMENTATION: Files are written first, then article and photo rows are
    /// inserted in one transaction. Any DB failure deletes the files again.
    pub async fn create_article(
        &self,
        req: CreateArticleRequest,
        files: Vec<UploadPart>,
    ) -> Result<ArticleResponse, NewsError> {
        req.validate()?;
        UploadWriter::validate_batch(&files, MAX_FILES_PER_ARTICLE)?;

        let ctx = self.context();
        let article = Article {
            id: new_id(),
            title: req.title,
            category: req.category,
            event_date: req.event_date,
            description: req.description,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let stored = self
            .uploads
            .write_batch(
                &ctx,
                &FileNaming::initial(&article.id),
                files,
                MAX_FILES_PER_ARTICLE,
            )
            .await?;
        let photos = photos_for(&article.id, &stored);

        let persisted = async {
            let mut tx = self.store.begin(&ctx).await?;
            self.store
                .insert_article_with_photos(&ctx, &mut tx, &article, &photos)
                .await?;
            self.store.commit(&ctx, tx).await
        }
        .await;

        if let Err(e) = persisted {
            stored.discard().await;
            return Err(e);
        }

        log::info!("Created news {} with {} photos", article.id, photos.len());
        Ok(ArticleWithPhotos { article, photos }.to_response())
    }

    /// Add photos to an existing article
    /// DOCUMENTATION: Returns the stored filenames in upload order
    pub async fn add_photos(
        &self,
        article_id: &str,
        files: Vec<UploadPart>,
    ) -> Result<Vec<String>, NewsError> {
        require_id(article_id, "news_id")?;
        UploadWriter::validate_batch(&files, MAX_FILES_PER_ADDITION)?;

        let ctx = self.context();
        let mut tx = self.store.begin(&ctx).await?;

        // Held until commit so a concurrent delete waits for the new rows
        let exists = self
            .store
            .lock_article(&ctx, &mut tx, article_id, LockMode::Share)
            .await?;
        if !exists {
            return Err(NewsError::NotFound(format!(
                "news with id {} not found",
                article_id
            )));
        }

        let stored = self
            .uploads
            .write_batch(
                &ctx,
                &FileNaming::additional(article_id),
                files,
                MAX_FILES_PER_ADDITION,
            )
            .await?;
        let photos = photos_for(article_id, &stored);

        let persisted = async {
            for photo in &photos {
                self.store.insert_photo(&ctx, &mut tx, photo).await?;
            }
            self.store.commit(&ctx, tx).await
        }
        .await;

        if let Err(e) = persisted {
            stored.discard().await;
            return Err(e);
        }

        log::info!("Added {} photos to news {}", photos.len(), article_id);
        Ok(stored.into_filenames())
    }

    /// All articles with their galleries, in id (creation) order
    pub async fn list_articles(&self) -> Result<Vec<ArticleResponse>, NewsError> {
        let ctx = self.context();
        let mut tx = self.store.begin(&ctx).await?;
        let rows = self.store.list_articles_joined(&ctx, &mut tx).await?;
        self.store.commit(&ctx, tx).await?;

        Ok(GalleryAggregator::fold(rows)
            .iter()
            .map(ArticleWithPhotos::to_response)
            .collect())
    }

    pub async fn get_article(&self, article_id: &str) -> Result<ArticleResponse, NewsError> {
        require_id(article_id, "news id")?;

        let ctx = self.context();
        let mut tx = self.store.begin(&ctx).await?;
        let rows = self.store.get_article_joined(&ctx, &mut tx, article_id).await?;
        self.store.commit(&ctx, tx).await?;

        Ok(GalleryAggregator::fold_one(article_id, rows)?.to_response())
    }

    /// Update scalar fields only; the gallery is left untouched
    pub async fn update_article(
        &self,
        article_id: &str,
        req: UpdateArticleRequest,
    ) -> Result<ArticleResponse, NewsError> {
        require_id(article_id, "news id")?;
        req.validate()?;

        let ctx = self.context();
        let mut tx = self.store.begin(&ctx).await?;

        let article = Article {
            id: article_id.to_string(),
            title: req.title,
            category: req.category,
            event_date: req.event_date,
            description: req.description,
            // Not part of the update
            created_at: String::new(),
        };

        let updated = self.store.update_article_scalars(&ctx, &mut tx, &article).await?;
        if updated == 0 {
            return Err(NewsError::NotFound(format!(
                "news with id {} not found",
                article_id
            )));
        }

        let rows = self.store.get_article_joined(&ctx, &mut tx, article_id).await?;
        self.store.commit(&ctx, tx).await?;

        log::info!("Updated news {}", article_id);
        Ok(GalleryAggregator::fold_one(article_id, rows)?.to_response())
    }

    /// Delete an article, its photo rows and, after commit, its files
    /// DOCUMENTATION: A crash between commit and file removal leaves orphaned
    /// files behind; rows and files are never lost the other way round
    pub async fn delete_article(&self, article_id: &str) -> Result<(), NewsError> {
        require_id(article_id, "news id")?;

        let ctx = self.context();
        let mut tx = self.store.begin(&ctx).await?;

        let exists = self
            .store
            .lock_article(&ctx, &mut tx, article_id, LockMode::Update)
            .await?;
        if !exists {
            return Err(NewsError::NotFound(format!(
                "news with id {} not found",
                article_id
            )));
        }

        let photos = self.store.list_photos_by_article(&ctx, &mut tx, article_id).await?;
        self.store.delete_photos_by_article(&ctx, &mut tx, article_id).await?;
        let deleted = self.store.delete_article(&ctx, &mut tx, article_id).await?;
        if deleted == 0 {
            return Err(NewsError::NotFound(format!(
                "news with id {} not found",
                article_id
            )));
        }

        self.store.commit(&ctx, tx).await?;

        let filenames: Vec<String> = photos.into_iter().map(|p| p.filename).collect();
        self.uploads.remove_best_effort(&filenames).await;

        log::info!("Deleted news {} and {} photos", article_id, filenames.len());
        Ok(())
    }

    /// Delete one photo by its stored filename
    pub async fn delete_photo(&self, filename: &str) -> Result<(), NewsError> {
        require_filename(filename)?;

        let ctx = self.context();
        let mut tx = self.store.begin(&ctx).await?;

        let deleted = self.store.delete_photo_by_filename(&ctx, &mut tx, filename).await?;
        if deleted == 0 {
            return Err(NewsError::NotFound(format!("photo {} not found", filename)));
        }

        self.store.commit(&ctx, tx).await?;
        self.uploads.remove_best_effort(&[filename.to_string()]).await;

        Ok(())
    }

    /// Delete several photos by filename; unknown names are skipped
    /// DOCUMENTATION: Returns the number of photo rows removed. Only files
    /// whose row was deleted are removed from disk.
    pub async fn bulk_delete_photos(&self, filenames: Vec<String>) -> Result<u64, NewsError> {
        if filenames.is_empty() {
            return Err(NewsError::ValidationError(
                "filenames must not be empty".to_string(),
            ));
        }
        for filename in &filenames {
            require_filename(filename)?;
        }

        let ctx = self.context();
        let mut tx = self.store.begin(&ctx).await?;
        let deleted = self
            .store
            .delete_photos_by_filenames(&ctx, &mut tx, &filenames)
            .await?;
        self.store.commit(&ctx, tx).await?;

        self.uploads.remove_best_effort(&deleted).await;

        log::info!("Bulk deleted {} of {} photos", deleted.len(), filenames.len());
        Ok(deleted.len() as u64)
    }
}
