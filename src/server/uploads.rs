// src/server/uploads.rs

//! Stateless upload endpoints. Neither touches the connection registry.

use crate::core::HostwatchError;
use crate::core::state::ServerState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// The multipart field carrying the uploaded file.
pub const FILE_PART_NAME: &str = "InputFile";

/// Stores the `InputFile` part of a multipart form in the upload directory.
///
/// Only the final path component of the client's filename is used. A failed
/// write is logged and the remaining parts are still processed.
pub async fn upload_file_handler(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> Result<StatusCode, HostwatchError> {
    let upload_dir = Path::new(&state.config.upload_dir);

    while let Some(field) = multipart.next_field().await? {
        let part_name = field.name().unwrap_or_default().to_string();
        debug!("Part: {}", part_name);

        if part_name != FILE_PART_NAME {
            let value = field.text().await?;
            debug!(" Value: {}", value);
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_owned) else {
            error!("Part with name \"{}\" should have a file", FILE_PART_NAME);
            return Err(HostwatchError::Upload(format!(
                "part \"{FILE_PART_NAME}\" has no filename"
            )));
        };
        if let Some(content_type) = field.content_type() {
            debug!(" Content-Type: {}", content_type);
        }

        let Some(target) = upload_target(upload_dir, &file_name) else {
            error!(" Rejected upload with unusable filename {:?}", file_name);
            continue;
        };

        let body = field.bytes().await?;
        match tokio::fs::write(&target, &body).await {
            Ok(()) => info!(" Contents written to {}", target.display()),
            Err(e) => error!(" Write to {} failed: {}", target.display(), e),
        }
    }

    Ok(StatusCode::OK)
}

/// Resolves where an uploaded file named `file_name` is stored.
///
/// Returns `None` when the name has no final component (e.g. `..` or `/`).
pub fn upload_target(upload_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let base = Path::new(file_name).file_name()?;
    Some(upload_dir.join(base))
}

/// Accepts any well-formed JSON document and logs it.
pub async fn upload_json_handler(body: String) -> Result<&'static str, HostwatchError> {
    let value: serde_json::Value = serde_json::from_str(&body)?;
    info!("Received JSON: {}", value);
    Ok("JSON received successfully")
}
