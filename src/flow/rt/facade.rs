use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use super::dto::Request;
use super::executor;
use crate::web::server::{to_res, AppState};

pub(crate) async fn answer(
    State(app): State<Arc<AppState>>,
    Json(req): Json<Request>,
) -> impl IntoResponse {
    let now = std::time::Instant::now();
    let r = executor::process(req, &app.store, &app.services, &app.table).await;
    let res = to_res(r);
    log::info!("Response used time:{:?}", now.elapsed());
    res
}
