// src/handlers/news.rs
// DOCUMENTATION: HTTP handlers for news articles and gallery photos
// PURPOSE: Parse requests into DTOs, call NewsService, wrap results in the JSON envelope

use crate::config::Config;
use crate::errors::NewsError;
use crate::handlers::response::{success, success_no_data};
use crate::models::{BulkDeletePhotosRequest, CreateArticleRequest, UpdateArticleRequest, UploadPart};
use crate::services::upload::MAX_FILE_SIZE;
use crate::services::NewsService;
use actix_multipart::Multipart;
use actix_web::{web, Responder};
use futures::StreamExt;
use std::collections::HashMap;

/// Multipart field carrying image files
const IMAGE_FIELD: &str = "images";

/// Text fields and file parts of one multipart body
#[derive(Debug, Default)]
struct MultipartForm {
    fields: HashMap<String, String>,
    files: Vec<UploadPart>,
}

impl MultipartForm {
    fn take(&mut self, name: &str) -> String {
        self.fields.remove(name).unwrap_or_default()
    }
}

/// Drain a multipart body
/// DOCUMENTATION: Enforces `max_bytes` over the whole body; file parts outside
/// `file_field` are dropped. At most `MAX_FILE_SIZE + 1` bytes of a file part
/// are buffered, while its declared size is the full count seen on the wire.
async fn read_multipart(
    mut payload: Multipart,
    file_field: &str,
    max_bytes: usize,
) -> Result<MultipartForm, NewsError> {
    let mut form = MultipartForm::default();
    let mut total = 0usize;
    let file_cap = MAX_FILE_SIZE as usize + 1;

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| NewsError::ValidationError(format!("invalid form data: {}", e)))?;

        let disposition = field.content_disposition();
        let name = disposition.and_then(|d| d.get_name()).unwrap_or_default().to_string();
        let filename = disposition.and_then(|d| d.get_filename()).map(str::to_string);

        let keep = match &filename {
            Some(_) if name == file_field => file_cap,
            Some(_) => 0,
            None => max_bytes,
        };

        let mut data = Vec::new();
        let mut size = 0usize;
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| NewsError::ValidationError(format!("invalid form data: {}", e)))?;
            size += chunk.len();
            total += chunk.len();
            if total > max_bytes {
                return Err(NewsError::ValidationError(format!(
                    "request body exceeds {} bytes",
                    max_bytes
                )));
            }
            let room = keep.saturating_sub(data.len());
            data.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }

        match filename {
            Some(original) if name == file_field => {
                form.files.push(UploadPart::new(
                    original,
                    size as u64,
                    std::io::Cursor::new(data),
                ));
            }
            Some(original) => {
                log::debug!("Ignoring file {} in unexpected field {}", original, name);
            }
            None => {
                form.fields
                    .insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }
    }

    Ok(form)
}

/// POST /api/v1/news
/// Create an article with its initial photos (multipart)
pub async fn create_news(
    service: web::Data<NewsService>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<impl Responder, NewsError> {
    let mut form = read_multipart(payload, IMAGE_FIELD, config.max_request_bytes).await?;

    let req = CreateArticleRequest {
        title: form.take("title"),
        category: form.take("category"),
        event_date: form.take("event_date"),
        description: form.take("description"),
    };

    let created = service.create_article(req, form.files).await?;
    Ok(success(created, "news created"))
}

/// GET /api/v1/news
pub async fn list_news(service: web::Data<NewsService>) -> Result<impl Responder, NewsError> {
    let articles = service.list_articles().await?;
    Ok(success(articles, "news retrieved"))
}

/// GET /api/v1/news/{id}
pub async fn get_news(
    service: web::Data<NewsService>,
    path: web::Path<String>,
) -> Result<impl Responder, NewsError> {
    let article = service.get_article(&path.into_inner()).await?;
    Ok(success(article, "news retrieved"))
}

/// PUT /api/v1/news/{id}
/// Update scalar fields; photos are managed through the photo endpoints
pub async fn update_news(
    service: web::Data<NewsService>,
    path: web::Path<String>,
    req: web::Json<UpdateArticleRequest>,
) -> Result<impl Responder, NewsError> {
    let article = service
        .update_article(&path.into_inner(), req.into_inner())
        .await?;
    Ok(success(article, "news updated"))
}

/// DELETE /api/v1/news/{id}
pub async fn delete_news(
    service: web::Data<NewsService>,
    path: web::Path<String>,
) -> Result<impl Responder, NewsError> {
    service.delete_article(&path.into_inner()).await?;
    Ok(success_no_data("news deleted"))
}

/// POST /api/v1/photo/news
/// Add photos to an existing article (multipart: news_id + images)
pub async fn add_news_photos(
    service: web::Data<NewsService>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<impl Responder, NewsError> {
    let mut form = read_multipart(payload, IMAGE_FIELD, config.max_request_bytes).await?;
    let news_id = form.take("news_id");

    let filenames = service.add_photos(&news_id, form.files).await?;
    Ok(success(filenames, "news photos added"))
}

/// DELETE /api/v1/photo/news/{filename}
pub async fn delete_news_photo(
    service: web::Data<NewsService>,
    path: web::Path<String>,
) -> Result<impl Responder, NewsError> {
    service.delete_photo(&path.into_inner()).await?;
    Ok(success_no_data("photo deleted"))
}

/// DELETE /api/v1/bulk/photo/news
pub async fn bulk_delete_news_photos(
    service: web::Data<NewsService>,
    req: web::Json<BulkDeletePhotosRequest>,
) -> Result<impl Responder, NewsError> {
    let deleted = service.bulk_delete_photos(req.into_inner().filenames).await?;
    Ok(success(serde_json::json!({ "deleted": deleted }), "photos deleted"))
}

/// Configuration for news routes
pub fn config(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        NewsError::ValidationError(format!("invalid JSON body: {}", err)).into()
    });

    cfg.service(
        web::scope("/api/v1")
            .app_data(json_config)
            .route("/news", web::post().to(create_news))
            .route("/news", web::get().to(list_news))
            .route("/news/{id}", web::get().to(get_news))
            .route("/news/{id}", web::put().to(update_news))
            .route("/news/{id}", web::delete().to(delete_news))
            .route("/photo/news", web::post().to(add_news_photos))
            .route("/photo/news/{filename}", web::delete().to(delete_news_photo))
            .route("/bulk/photo/news", web::delete().to(bulk_delete_news_photos)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::error::PayloadError;
    use actix_web::http::header::{self, HeaderMap, HeaderValue};
    use actix_web::web::Bytes;
    use tokio::io::AsyncReadExt;

    const BOUNDARY: &str = "desa-news-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, Vec<u8>),
    }

    fn multipart(parts: Vec<Part<'_>>) -> Multipart {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                            name, value
                        )
                        .as_bytes(),
                    );
                }
                Part::File(name, filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name, filename
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&data);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(&format!("multipart/form-data; boundary={}", BOUNDARY))
                .unwrap(),
        );
        let stream = futures::stream::once(async move { Ok::<_, PayloadError>(Bytes::from(body)) });
        Multipart::new(&headers, stream)
    }

    #[actix_web::test]
    async fn test_read_multipart_extracts_fields_and_images() {
        let payload = multipart(vec![
            Part::Text("title", "Kerja bakti"),
            Part::Text("news_id", "abc"),
            Part::File("images", "foto.jpg", b"jpeg-bytes".to_vec()),
            Part::File("attachment", "notes.pdf", b"pdf".to_vec()),
        ]);

        let mut form = read_multipart(payload, IMAGE_FIELD, 1024 * 1024).await.unwrap();

        assert_eq!(form.take("title"), "Kerja bakti");
        assert_eq!(form.take("news_id"), "abc");
        assert_eq!(form.take("missing"), "");
        assert_eq!(form.files.len(), 1);

        let mut part = form.files.remove(0);
        assert_eq!(part.original_name, "foto.jpg");
        assert_eq!(part.declared_size, 10);
        let mut stored = Vec::new();
        part.reader.read_to_end(&mut stored).await.unwrap();
        assert_eq!(stored, b"jpeg-bytes");
    }

    #[actix_web::test]
    async fn test_read_multipart_rejects_oversized_body() {
        let payload = multipart(vec![
            Part::Text("title", "x"),
            Part::File("images", "big.png", vec![1u8; 4096]),
        ]);

        let err = read_multipart(payload, IMAGE_FIELD, 1024).await.unwrap_err();

        assert!(matches!(err, NewsError::ValidationError(ref m) if m.contains("1024")));
    }

    #[actix_web::test]
    async fn test_read_multipart_buffers_at_most_the_file_cap() {
        let size = MAX_FILE_SIZE as usize + 4096;
        let payload = multipart(vec![Part::File("images", "huge.gif", vec![9u8; size])]);

        let mut form = read_multipart(payload, IMAGE_FIELD, 2 * size).await.unwrap();

        let mut part = form.files.remove(0);
        assert_eq!(part.declared_size, size as u64);
        let mut stored = Vec::new();
        part.reader.read_to_end(&mut stored).await.unwrap();
        assert_eq!(stored.len(), MAX_FILE_SIZE as usize + 1);

        // The full count reaches the batch validator
        let err = crate::services::UploadWriter::validate_batch(&[part], 10).unwrap_err();
        assert!(matches!(err, NewsError::ValidationError(_)));
    }
}
