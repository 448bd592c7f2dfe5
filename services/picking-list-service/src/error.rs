use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use picking_utils::{ErrorResponse, ParseError, PickingError};
use tracing::{error, warn};

/// Handler error rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(pub PickingError);

impl From<PickingError> for ApiError {
    fn from(error: PickingError) -> Self {
        Self(error)
    }
}

impl From<ParseError> for ApiError {
    fn from(error: ParseError) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        } else {
            warn!(code = self.0.error_code(), error = %self.0, "Request rejected");
        }

        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}
