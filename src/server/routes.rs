use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::{
    error::FixtralError,
    imaging::{self, DEFAULT_OPTIMIZE_QUALITY},
    models::{EditRequest, ErrorResponse},
};

pub const MISSING_FIELDS: &str = "Image URL and change summary are required";
pub const HOST_NOT_ALLOWED: &str = "Hostname is not configured for image optimization";
const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";

fn client_error(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": message }))
}

fn server_error(err: &FixtralError) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse::new(err.to_string()))
}

/// `POST /api/edit`
pub async fn execute_edit(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request: EditRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Rejected edit request body: {}", e);
            return client_error(MISSING_FIELDS);
        }
    };

    let Some((image_url, change_summary)) = request.required_fields() else {
        return client_error(MISSING_FIELDS);
    };

    match state.edits.execute(image_url, change_summary).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Edit execution error: {}", e);
            server_error(&e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub url: Option<String>,
    pub w: Option<u32>,
    pub q: Option<u8>,
}

/// `GET /api/image?url=&w=&q=`
pub async fn optimize_image(
    state: web::Data<AppState>,
    query: web::Query<ImageQuery>,
) -> HttpResponse {
    let ImageQuery { url, w, q } = query.into_inner();
    let Some(url) = url.filter(|u| !u.is_empty()) else {
        return client_error("\"url\" parameter is required");
    };
    if !state.images.is_allowed_url(&url) {
        log::warn!("Blocked image optimization for {}", url);
        return client_error(HOST_NOT_ALLOWED);
    }

    let fetched = match state.optimizer_fetcher.fetch(&url).await {
        Ok(fetched) => fetched,
        Err(FixtralError::HostNotAllowed(target)) => {
            log::warn!("Blocked image optimization redirect {} -> {}", url, target);
            return client_error(HOST_NOT_ALLOWED);
        }
        Err(e) => {
            log::error!("Image optimization fetch failed: {}", e);
            return server_error(&e);
        }
    };

    let quality = q.unwrap_or(DEFAULT_OPTIMIZE_QUALITY).clamp(1, 100);
    let optimized = web::block(move || imaging::optimize(&fetched.bytes, w, quality))
        .await
        .map_err(|e| FixtralError::InternalError(e.to_string()))
        .and_then(|result| result);

    match optimized {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("image/jpeg")
            .insert_header((header::CACHE_CONTROL, IMAGE_CACHE_CONTROL))
            .body(bytes),
        Err(e) => {
            log::error!("Image optimization failed for {}: {}", url, e);
            server_error(&e)
        }
    }
}
