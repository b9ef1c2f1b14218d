// src/services/gallery.rs
// DOCUMENTATION: Gallery aggregation for the news read path
// PURPOSE: Fold flat `news LEFT JOIN news_photos` rows back into articles with photo lists

use crate::errors::NewsError;
use crate::models::{ArticlePhotoRow, ArticleWithPhotos};
use std::collections::HashMap;

/// Order-preserving fold of joined rows
/// DOCUMENTATION: `order` remembers the first time each article id was seen,
/// `index` points from id to its slot in `articles`. Output order therefore
/// follows the query's ORDER BY and never depends on map iteration order.
#[derive(Debug, Default)]
pub struct GalleryAggregator {
    articles: Vec<ArticleWithPhotos>,
    index: HashMap<String, usize>,
}

impl GalleryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one joined row
    pub fn push(&mut self, row: ArticlePhotoRow) {
        let photo = row.photo();

        match self.index.get(&row.id) {
            Some(&slot) => {
                if let Some(photo) = photo {
                    self.articles[slot].photos.push(photo);
                }
            }
            None => {
                self.index.insert(row.id.clone(), self.articles.len());
                self.articles.push(ArticleWithPhotos {
                    article: row.article(),
                    photos: photo.into_iter().collect(),
                });
            }
        }
    }

    /// Articles in first-seen order
    pub fn finish(self) -> Vec<ArticleWithPhotos> {
        self.articles
    }

    /// Fold every row of a list query
    pub fn fold<I>(rows: I) -> Vec<ArticleWithPhotos>
    where
        I: IntoIterator<Item = ArticlePhotoRow>,
    {
        let mut aggregator = Self::new();
        for row in rows {
            aggregator.push(row);
        }
        aggregator.finish()
    }

    /// Fold the rows of a single-article query
    /// DOCUMENTATION: Rows for other ids are ignored; no matching row means NotFound
    pub fn fold_one<I>(article_id: &str, rows: I) -> Result<ArticleWithPhotos, NewsError>
    where
        I: IntoIterator<Item = ArticlePhotoRow>,
    {
        Self::fold(rows.into_iter().filter(|row| row.id == article_id))
            .into_iter()
            .next()
            .ok_or_else(|| NewsError::NotFound(format!("news with id {} not found", article_id)))
    }
}
