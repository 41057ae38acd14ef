use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};

use crate::{
    model::{ResourceTyped, entity::Category},
    web::{AppState, WebError, WebResult, error::ErrorResponse},
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(categories_list_handler))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    description = "Lists all course categories by name",
    responses(
        (status = 200, description = "Categories", body = Vec<Category>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "categories"
)]
async fn categories_list_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let categories = Category::all(state.pool())
        .await
        .map_err(|e| WebError::resource(Category::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(categories)))
}
