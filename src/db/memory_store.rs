// src/db/memory_store.rs
// DOCUMENTATION: In-memory storage gateway used by service tests
// PURPOSE: Staged transactions with the same constraints as the SQL schema

use crate::db::{ArticleStore, LockMode, OpContext};
use crate::errors::NewsError;
use crate::models::{Article, ArticlePhotoRow, Photo};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Points where the store can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    InsertPhoto,
    Commit,
    /// Sleep inside `begin` so the request deadline expires
    StallBegin,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    articles: BTreeMap<String, Article>,
    photos: BTreeMap<String, Photo>,
}

/// A write replayed against the committed tables on commit
#[derive(Debug, Clone)]
enum Op {
    InsertArticle(Article),
    InsertPhoto(Photo),
    UpdateArticle(Article),
    DeletePhotosByArticle(String),
    DeleteArticle(String),
    DeletePhotosByFilenames(Vec<String>),
}

impl Tables {
    fn apply(&mut self, op: &Op) -> Result<u64, String> {
        match op {
            Op::InsertArticle(article) => {
                if self.articles.contains_key(&article.id) {
                    return Err(format!("duplicate news id {}", article.id));
                }
                self.articles.insert(article.id.clone(), article.clone());
                Ok(1)
            }
            Op::InsertPhoto(photo) => {
                if !self.articles.contains_key(&photo.news_id) {
                    return Err(format!("news {} does not exist", photo.news_id));
                }
                if self.photos.contains_key(&photo.id)
                    || self.photos.values().any(|p| p.filename == photo.filename)
                {
                    return Err(format!("duplicate photo {}", photo.filename));
                }
                self.photos.insert(photo.id.clone(), photo.clone());
                Ok(1)
            }
            Op::UpdateArticle(article) => match self.articles.get_mut(&article.id) {
                Some(existing) => {
                    *existing = Article {
                        created_at: existing.created_at.clone(),
                        ..article.clone()
                    };
                    Ok(1)
                }
                None => Ok(0),
            },
            Op::DeletePhotosByArticle(article_id) => {
                let before = self.photos.len();
                self.photos.retain(|_, p| &p.news_id != article_id);
                Ok((before - self.photos.len()) as u64)
            }
            Op::DeleteArticle(article_id) => {
                if self.articles.remove(article_id).is_none() {
                    return Ok(0);
                }
                // ON DELETE CASCADE
                self.photos.retain(|_, p| &p.news_id != article_id);
                Ok(1)
            }
            Op::DeletePhotosByFilenames(filenames) => {
                let before = self.photos.len();
                self.photos.retain(|_, p| !filenames.contains(&p.filename));
                Ok((before - self.photos.len()) as u64)
            }
        }
    }

    fn joined(&self, only: Option<&str>) -> Vec<ArticlePhotoRow> {
        let mut rows = Vec::new();
        for article in self.articles.values() {
            if only.is_some_and(|id| id != article.id) {
                continue;
            }
            let base = ArticlePhotoRow {
                id: article.id.clone(),
                title: article.title.clone(),
                category: article.category.clone(),
                event_date: article.event_date.clone(),
                description: article.description.clone(),
                created_at: article.created_at.clone(),
                photo_id: String::new(),
                photo_filename: String::new(),
            };
            let photos: Vec<&Photo> = self
                .photos
                .values()
                .filter(|p| p.news_id == article.id)
                .collect();
            if photos.is_empty() {
                rows.push(base);
                continue;
            }
            for photo in photos {
                rows.push(ArticlePhotoRow {
                    photo_id: photo.id.clone(),
                    photo_filename: photo.filename.clone(),
                    ..base.clone()
                });
            }
        }
        rows
    }
}

/// Uncommitted view plus the writes to replay
pub struct MemoryTx {
    view: Tables,
    ops: Vec<Op>,
}

impl MemoryTx {
    fn write(&mut self, op: Op) -> Result<u64, NewsError> {
        let affected = self
            .view
            .apply(&op)
            .map_err(|e| NewsError::storage("Memory store write failed", e))?;
        self.ops.push(op);
        Ok(affected)
    }
}

/// In-memory [`ArticleStore`]
///
/// Reads inside a transaction see the snapshot taken at `begin` plus the
/// transaction's own writes; commit replays the writes onto the shared tables.
#[derive(Default)]
pub struct MemoryArticleStore {
    committed: Mutex<Tables>,
    fail_points: Mutex<HashSet<FailPoint>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(&self, point: FailPoint) {
        self.fail_points.lock().unwrap().insert(point);
    }

    pub fn clear_failures(&self) {
        self.fail_points.lock().unwrap().clear();
    }

    fn should_fail(&self, point: FailPoint) -> bool {
        self.fail_points.lock().unwrap().contains(&point)
    }

    /// Committed articles, ordered by id
    pub fn articles(&self) -> Vec<Article> {
        self.committed.lock().unwrap().articles.values().cloned().collect()
    }

    /// Committed photos, ordered by id
    pub fn photos(&self) -> Vec<Photo> {
        self.committed.lock().unwrap().photos.values().cloned().collect()
    }

    /// Seed committed rows directly, bypassing transactions
    pub fn seed(&self, article: Article, photos: Vec<Photo>) {
        let mut tables = self.committed.lock().unwrap();
        tables.apply(&Op::InsertArticle(article)).unwrap();
        for photo in photos {
            tables.apply(&Op::InsertPhoto(photo)).unwrap();
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    type Tx = MemoryTx;

    async fn begin(&self, ctx: &OpContext) -> Result<Self::Tx, NewsError> {
        let stall = self.should_fail(FailPoint::StallBegin);
        let fail = self.should_fail(FailPoint::Begin);
        ctx.run("Begin transaction failed", async {
            if stall {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            if fail {
                return Err("connection refused".to_string());
            }
            Ok(MemoryTx {
                view: self.committed.lock().unwrap().clone(),
                ops: Vec::new(),
            })
        })
        .await
    }

    async fn commit(&self, ctx: &OpContext, tx: Self::Tx) -> Result<(), NewsError> {
        let fail = self.should_fail(FailPoint::Commit);
        ctx.run("Commit transaction failed", async {
            if fail {
                return Err("connection reset during commit".to_string());
            }
            let mut committed = self.committed.lock().unwrap();
            let mut next = committed.clone();
            for op in &tx.ops {
                next.apply(op)?;
            }
            *committed = next;
            Ok(())
        })
        .await
    }

    async fn insert_article_with_photos(
        &self,
        ctx: &OpContext,
        tx: &mut Self::Tx,
        article: &Article,
        photos: &[Photo],
    ) -> Result<(), NewsError> {
        tx.write(Op::InsertArticle(article.clone()))?;
        for photo in photos {
            self.insert_photo(ctx, tx, photo).await?;
        }
        Ok(())
    }

    async fn insert_photo(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
        photo: &Photo,
    ) -> Result<(), NewsError> {
        if self.should_fail(FailPoint::InsertPhoto) {
            return Err(NewsError::storage("Insert news photo failed", "injected failure"));
        }
        if !tx.view.articles.contains_key(&photo.news_id) {
            return Err(NewsError::NotFound(format!(
                "news with id {} not found",
                photo.news_id
            )));
        }
        tx.write(Op::InsertPhoto(photo.clone()))?;
        Ok(())
    }

    async fn lock_article(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
        _mode: LockMode,
    ) -> Result<bool, NewsError> {
        Ok(tx.view.articles.contains_key(article_id))
    }

    async fn list_articles_joined(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
    ) -> Result<Vec<ArticlePhotoRow>, NewsError> {
        Ok(tx.view.joined(None))
    }

    async fn get_article_joined(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<Vec<ArticlePhotoRow>, NewsError> {
        Ok(tx.view.joined(Some(article_id)))
    }

    async fn update_article_scalars(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
        article: &Article,
    ) -> Result<u64, NewsError> {
        tx.write(Op::UpdateArticle(article.clone()))
    }

    async fn delete_photos_by_article(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<u64, NewsError> {
        tx.write(Op::DeletePhotosByArticle(article_id.to_string()))
    }

    async fn delete_article(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<u64, NewsError> {
        tx.write(Op::DeleteArticle(article_id.to_string()))
    }

    async fn delete_photo_by_filename(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
        filename: &str,
    ) -> Result<u64, NewsError> {
        tx.write(Op::DeletePhotosByFilenames(vec![filename.to_string()]))
    }

    async fn delete_photos_by_filenames(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
        filenames: &[String],
    ) -> Result<Vec<String>, NewsError> {
        let matched: Vec<String> = tx
            .view
            .photos
            .values()
            .filter(|p| filenames.contains(&p.filename))
            .map(|p| p.filename.clone())
            .collect();
        tx.write(Op::DeletePhotosByFilenames(filenames.to_vec()))?;
        Ok(matched)
    }

    async fn list_photos_by_article(
        &self,
        _ctx: &OpContext,
        tx: &mut Self::Tx,
        article_id: &str,
    ) -> Result<Vec<Photo>, NewsError> {
        Ok(tx
            .view
            .photos
            .values()
            .filter(|p| p.news_id == article_id)
            .cloned()
            .collect())
    }
}
