use axum::{routing::post, Router};

use crate::{handlers::*, AppState};

pub fn create_api_routes() -> Router<AppState> {
    Router::new().route("/picking-lists/parse", post(parse_picking_list))
}
