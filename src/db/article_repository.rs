// src/db/article_repository.rs
// DOCUMENTATION: PostgreSQL implementation of the news storage gateway
// PURPOSE: Parameterized SQL for news and news_photos inside a caller transaction

use crate::db::{ArticleStore, LockMode, OpContext};
use crate::errors::NewsError;
use crate::models::{Article, ArticlePhotoRow, Photo};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

/// Joined read shared by the list and detail queries
/// DOCUMENTATION: Photo columns are COALESCEd to '' so an article without
/// photos still produces one row with an empty photo id
const SELECT_ARTICLE_WITH_PHOTOS: &str = r#"
    SELECT
        n.id, n.title, n.category, n.event_date, n.description, n.created_at,
        COALESCE(p.id, '') AS photo_id,
        COALESCE(p.filename, '') AS photo_filename
    FROM news n
    LEFT JOIN news_photos p ON p.news_id = n.id
"#;

/// ArticleRepository: all database operations for news and their photos
/// DOCUMENTATION: Stateless apart from the pool used to open transactions
#[derive(Clone)]
pub struct PgArticleRepository {
    pool: PgPool,
}

impl PgArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PgArticleRepository {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self, ctx: &OpContext) -> Result<Self::Tx, NewsError> {
        ctx.run("Begin transaction failed", self.pool.begin()).await
    }

    async fn commit(&self, ctx: &OpContext, tx: Self::Tx) -> Result<(), NewsError> {
        ctx.run("Commit transaction failed", tx.commit()).await
    }

    /// Insert article and its initial gallery
    /// DOCUMENTATION: Used by POST /api/v1/news
    async fn insert_article_with_photos(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article: &Article,
        photos: &[Photo],
    ) -> Result<(), NewsError> {
        ctx.run(
            "Insert news failed",
            sqlx::query(
                r#"
                INSERT INTO news (id, title, category, event_date, description, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&article.id)
            .bind(&article.title)
            .bind(&article.category)
            .bind(&article.event_date)
            .bind(&article.description)
            .bind(&article.created_at)
            .execute(&mut **tx),
        )
        .await?;

        for photo in photos {
            self.insert_photo(ctx, tx, photo).await?;
        }

        log::debug!("Inserted news {} with {} photos", article.id, photos.len());
        Ok(())
    }

    async fn insert_photo(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        photo: &Photo,
    ) -> Result<(), NewsError> {
        let inserted = ctx
            .run("Insert news photo failed", async {
                let result = sqlx::query(
                    "INSERT INTO news_photos (id, news_id, filename) VALUES ($1, $2, $3)",
                )
                .bind(&photo.id)
                .bind(&photo.news_id)
                .bind(&photo.filename)
                .execute(&mut **tx)
                .await;

                match result {
                    Ok(_) => Ok(true),
                    // Owning article deleted by another transaction
                    Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Ok(false),
                    Err(e) => Err(e),
                }
            })
            .await?;

        if !inserted {
            return Err(NewsError::NotFound(format!(
                "news with id {} not found",
                photo.news_id
            )));
        }

        Ok(())
    }

    async fn lock_article(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
        mode: LockMode,
    ) -> Result<bool, NewsError> {
        let query = match mode {
            LockMode::Share => "SELECT id FROM news WHERE id = $1 FOR SHARE",
            LockMode::Update => "SELECT id FROM news WHERE id = $1 FOR UPDATE",
        };

        let row: Option<(String,)> = ctx
            .run(
                "Lock news failed",
                sqlx::query_as(query).bind(article_id).fetch_optional(&mut **tx),
            )
            .await?;

        Ok(row.is_some())
    }

    async fn list_articles_joined(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
    ) -> Result<Vec<ArticlePhotoRow>, NewsError> {
        let query = format!("{} ORDER BY n.id, p.id", SELECT_ARTICLE_WITH_PHOTOS);

        ctx.run(
            "Fetch news failed",
            sqlx::query_as::<_, ArticlePhotoRow>(&query).fetch_all(&mut **tx),
        )
        .await
    }

    async fn get_article_joined(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<Vec<ArticlePhotoRow>, NewsError> {
        let query = format!(
            "{} WHERE n.id = $1 ORDER BY p.id",
            SELECT_ARTICLE_WITH_PHOTOS
        );

        ctx.run(
            "Fetch news by id failed",
            sqlx::query_as::<_, ArticlePhotoRow>(&query)
                .bind(article_id)
                .fetch_all(&mut **tx),
        )
        .await
    }

    async fn update_article_scalars(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article: &Article,
    ) -> Result<u64, NewsError> {
        let result = ctx
            .run(
                "Update news failed",
                sqlx::query(
                    r#"
                    UPDATE news
                    SET title = $1, category = $2, event_date = $3, description = $4
                    WHERE id = $5
                    "#,
                )
                .bind(&article.title)
                .bind(&article.category)
                .bind(&article.event_date)
                .bind(&article.description)
                .bind(&article.id)
                .execute(&mut **tx),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_photos_by_article(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<u64, NewsError> {
        let result = ctx
            .run(
                "Delete news photos failed",
                sqlx::query("DELETE FROM news_photos WHERE news_id = $1")
                    .bind(article_id)
                    .execute(&mut **tx),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_article(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<u64, NewsError> {
        let result = ctx
            .run(
                "Delete news failed",
                sqlx::query("DELETE FROM news WHERE id = $1")
                    .bind(article_id)
                    .execute(&mut **tx),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_photo_by_filename(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        filename: &str,
    ) -> Result<u64, NewsError> {
        let result = ctx
            .run(
                "Delete photo failed",
                sqlx::query("DELETE FROM news_photos WHERE filename = $1")
                    .bind(filename)
                    .execute(&mut **tx),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_photos_by_filenames(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        filenames: &[String],
    ) -> Result<Vec<String>, NewsError> {
        if filenames.is_empty() {
            return Ok(Vec::new());
        }

        let deleted: Vec<(String,)> = ctx
            .run(
                "Bulk delete photos failed",
                sqlx::query_as(
                    "DELETE FROM news_photos WHERE filename = ANY($1) RETURNING filename",
                )
                .bind(filenames)
                .fetch_all(&mut **tx),
            )
            .await?;

        Ok(deleted.into_iter().map(|(filename,)| filename).collect())
    }

    async fn list_photos_by_article(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<Vec<Photo>, NewsError> {
        ctx.run(
            "Fetch news photos failed",
            sqlx::query_as::<_, Photo>(
                r#"
                SELECT id, news_id, filename FROM news_photos
                WHERE news_id = $1
                ORDER BY id
                "#,
            )
            .bind(article_id)
            .fetch_all(&mut **tx),
        )
        .await
    }
}
