//! Picking List Upload Handler
//!
//! Parses uploaded picking lists and returns the extracted orders.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Json,
};
use picking_models::PickingListParseResult;
use picking_utils::{ParseError, PickingError, TableFormat};
use std::path::Path;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// Upload and parse a picking list
///
/// POST /api/v1/picking-lists/parse
///
/// Responds 201 when at least one order was found and 206 when the document
/// was readable but yielded no orders.
pub async fn parse_picking_list(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PickingListParseResult>), ApiError> {
    let limit = state.config.server.max_upload_bytes;

    // Take the first field that carries a file; other form fields are ignored.
    let (filename, format, data) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| upload_error(e, limit, "Failed to read upload"))?
            .ok_or_else(|| PickingError::validation("file", "No file provided"))?;
        let Some(name) = field.file_name() else {
            continue;
        };

        let filename = if name.trim().is_empty() {
            state.config.parser.default_source_name.clone()
        } else {
            name.to_string()
        };
        let format = detect_format(&filename, field.content_type())?;

        let data = field
            .bytes()
            .await
            .map_err(|e| upload_error(e, limit, "Failed to read file data"))?;
        break (filename, format, data);
    };

    info!(filename = %filename, %format, size_bytes = data.len(), "Picking list uploaded");

    let extractor = state.extractor.clone();
    let result = tokio::task::spawn_blocking(move || {
        extractor.parse_bytes(&filename, &data, Some(format))
    })
    .await
    .map_err(|e| PickingError::internal(format!("Parser task failed: {e}")))??;

    let status = if result.statistics.parsing_success {
        StatusCode::CREATED
    } else {
        StatusCode::PARTIAL_CONTENT
    };

    Ok((status, Json(result)))
}

/// The body limit layer cuts the stream short; that surfaces here as a multipart error.
fn upload_error(error: MultipartError, limit: usize, context: &str) -> PickingError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PickingError::PayloadTooLarge { limit }
    } else {
        PickingError::validation("file", format!("{context}: {error}"))
    }
}

/// The file extension decides; the content type is consulted only for names without one.
fn detect_format(filename: &str, content_type: Option<&str>) -> Result<TableFormat, ParseError> {
    let path = Path::new(filename);
    let format = match path.extension() {
        Some(_) => TableFormat::from_extension(path),
        None => content_type.and_then(TableFormat::from_content_type),
    };

    format.ok_or_else(|| ParseError::UnsupportedFormat {
        filename: filename.to_string(),
    })
}
