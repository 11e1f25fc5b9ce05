use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use std::path::Path;
use uuid::Uuid;

use crate::{AppState, Error};
use domain::error::Error as DomainError;
use log::*;

/// Multipart field holding the images.
const IMAGES_FIELD: &str = "images";

/// Request body limit for multi-image uploads.
pub(crate) const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Public path prefix uploaded images are served from.
pub(crate) const PUBLIC_IMAGES_PATH: &str = "/uploads/images";

/// POST store up to `upload_max_files` images and return their public URLs.
#[utoipa::path(
    post,
    path = "/api/upload/multiple-images",
    request_body(content = String, content_type = "multipart/form-data", description = "One or more `images` parts"),
    responses(
        (status = 200, description = "URLs of the stored images", body = [String]),
        (status = 400, description = "No files uploaded or too many files"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn upload_images(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, Error> {
    let upload_dir = app_state.config.upload_dir();
    let mut stored = Vec::new();

    if let Err(e) = receive_images(
        &mut multipart,
        upload_dir,
        app_state.config.upload_max_files,
        &mut stored,
    )
    .await
    {
        remove_files(upload_dir, &stored).await;
        return Err(e.into());
    }

    if stored.is_empty() {
        return Err(DomainError::invalid("No files uploaded.").into());
    }
    debug!("Stored {} uploaded images", stored.len());

    let base = public_base_url(&headers);
    let urls: Vec<String> = stored
        .iter()
        .map(|file_name| format!("{base}{PUBLIC_IMAGES_PATH}/{file_name}"))
        .collect();

    Ok(Json(urls))
}

/// Writes every `images` part to `upload_dir`, recording each stored name in `stored` as it
/// goes so a caller can remove them when the request is rejected part way.
async fn receive_images(
    multipart: &mut Multipart,
    upload_dir: &str,
    max_files: usize,
    stored: &mut Vec<String>,
) -> Result<(), DomainError> {
    let stamp = Utc::now().timestamp_millis();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart upload: {e}");
        DomainError::invalid("Malformed upload.")
    })? {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }
        if stored.len() == max_files {
            return Err(DomainError::invalid(format!(
                "At most {max_files} files can be uploaded."
            )));
        }

        let file_name = stored_name(stamp, field.file_name().unwrap_or_default());
        let bytes = field.bytes().await.map_err(|e| {
            warn!("Failed to read uploaded file: {e}");
            DomainError::invalid("Malformed upload.")
        })?;

        write_file(upload_dir, &file_name, &bytes).await?;
        stored.push(file_name);
    }
    Ok(())
}

/// `<millis>-<uuid><.ext>`, unique across concurrent requests.
fn stored_name(stamp: i64, original_name: &str) -> String {
    format!(
        "{stamp}-{}{}",
        Uuid::new_v4().simple(),
        extension(original_name)
    )
}

async fn remove_files(dir: &str, file_names: &[String]) {
    for file_name in file_names {
        if let Err(e) = tokio::fs::remove_file(Path::new(dir).join(file_name)).await {
            warn!("Failed to remove rejected upload {file_name}: {e}");
        }
    }
    debug!("Removed {} files of a rejected upload", file_names.len());
}

/// `.ext` of the client's file name, or empty when it has none. Only the extension is kept.
fn extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

async fn write_file(dir: &str, file_name: &str, bytes: &[u8]) -> Result<(), DomainError> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        error!("Failed to create upload directory {dir}: {e}");
        DomainError::internal("Failed to store upload")
    })?;
    tokio::fs::write(Path::new(dir).join(file_name), bytes)
        .await
        .map_err(|e| {
            error!("Failed to write upload {file_name}: {e}");
            DomainError::internal("Failed to store upload")
        })
}

/// `<scheme>://<host>` as seen by the client, honoring a proxy's `x-forwarded-proto`.
fn public_base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}
