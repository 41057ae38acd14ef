use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        ResourceTyped,
        entity::{Course, CourseProgress},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{ProgressResponse, ToggleBody, ToggleResponse},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}/progress",
            get(progress_get_handler).post(progress_toggle_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Progress is only tracked on courses the caller can see.
async fn visible_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    let course = Course::get(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    if !course.is_visible_to(Some(user)) {
        return Err(WebError::resource_not_found(Course::get_resource_type()));
    }
    Ok(course)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/progress",
    description = "Completion percentage of the course for the caller, floored to an integer",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Current progress", body = ProgressResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(
        ("cookie" = [])
    )
)]
async fn progress_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = visible_course(&state, user, id).await?;

    let progress = CourseProgress::compute(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource(CourseProgress::get_resource_type(), e))?;
    let completed_chapter_ids = CourseProgress::completed_chapter_ids(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource(CourseProgress::get_resource_type(), e))?;

    let body = ProgressResponse {
        course_id: course.id(),
        progress,
        completed_chapter_ids,
    };
    Ok((StatusCode::OK, Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/progress",
    request_body = ToggleBody,
    description = "Flips the completion mark of one chapter for the caller",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "New state of the chapter and course progress", body = ToggleResponse),
        (status = 400, description = "Chapter does not belong to the course", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(
        ("cookie" = [])
    )
)]
async fn progress_toggle_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = visible_course(&state, user, id).await?;

    let completed = CourseProgress::toggle_chapter(state.pool(), user, course.id(), payload.chapter_id)
        .await
        .map_err(|e| WebError::resource(CourseProgress::get_resource_type(), e))?;

    let progress = CourseProgress::compute(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource(CourseProgress::get_resource_type(), e))?;

    let body = ToggleResponse {
        chapter_id: payload.chapter_id,
        completed,
        progress,
    };
    Ok((StatusCode::OK, Json(body)))
}
