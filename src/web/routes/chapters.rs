use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{Attachment, AttachmentCreate, Chapter, ChapterUpdate, Course},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{ChapterBody, ReorderBody},
        error::ErrorResponse,
        middlewares,
    },
};

/// Upper bound for a single multipart upload (videos included).
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{id}/chapters", post(chapters_create_handler))
        .route("/{id}/chapters/reorder", post(chapters_reorder_handler))
        .route(
            "/{id}/chapters/{chapter_id}",
            put(chapters_update_handler).delete(chapters_delete_handler),
        )
        .route("/{id}/chapters/{chapter_id}/video", post(chapters_video_handler))
        .route(
            "/{id}/chapters/{chapter_id}/attachments",
            post(attachments_upload_handler),
        )
        .route(
            "/{id}/chapters/{chapter_id}/attachments/{attachment_id}",
            delete(attachments_delete_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Resolves `(course, chapter)` from the path and makes sure the caller owns the course.
async fn owned_chapter(
    state: &AppState,
    user: &AuthenticatedUser,
    course_id: Uuid,
    chapter_id: Uuid,
) -> WebResult<Chapter> {
    Course::get(state.pool(), user, course_id)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    let chapter = Chapter::get_in_course(state.pool(), user, course_id, chapter_id)
        .await
        .map_err(|e| WebError::resource(Chapter::get_resource_type(), e))?;

    check_access(state.pool(), user, &chapter, user.user_id())
        .await
        .map_err(|e| WebError::resource(Chapter::get_resource_type(), e))?;

    Ok(chapter)
}

/// Pulls the `file` field out of a multipart body.
async fn read_file_field(mut multipart: Multipart) -> WebResult<(String, Bytes)> {
    let bad_request = |details: String| WebError::resource_bad_request(Attachment::get_resource_type(), details);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("file").to_string();
        let bytes = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
        return Ok((filename, bytes));
    }

    Err(bad_request(String::from("multipart field `file` is missing")))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/chapters",
    request_body = ChapterBody,
    description = "Adds a chapter to the course, appended last unless a position is given",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 201, description = "Chapter created", body = Chapter),
        (status = 400, description = "Invalid title or position", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning teacher can do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Position already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "chapters",
    security(
        ("cookie" = [])
    )
)]
async fn chapters_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChapterBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let created = Chapter::create(state.pool(), user, payload.into_create(id))
        .await
        .map_err(|e| WebError::resource(Chapter::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/chapters/reorder",
    request_body = ReorderBody,
    description = "Rewrites the chapter order. The ids must be exactly the chapters of the course",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Chapters in their new order", body = Vec<Chapter>),
        (status = 400, description = "Ids are not a permutation of the course chapters", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning teacher can do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "chapters",
    security(
        ("cookie" = [])
    )
)]
async fn chapters_reorder_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReorderBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    Chapter::reorder(state.pool(), user, id, &payload.ordered_ids)
        .await
        .map_err(|e| WebError::resource(Chapter::get_resource_type(), e))?;

    let chapters = Chapter::all_by_course(state.pool(), id)
        .await
        .map_err(|e| WebError::resource(Chapter::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(chapters)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}/chapters/{chapter_id}",
    request_body = ChapterUpdate,
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("chapter_id" = Uuid, Path, description = "Chapter id"),
    ),
    responses(
        (status = 200, description = "Chapter updated", body = Chapter),
        (status = 400, description = "Invalid payload or chapter not in course", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning teacher can do this", body = ErrorResponse),
        (status = 404, description = "Course or chapter not found", body = ErrorResponse),
        (status = 409, description = "Position already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "chapters",
    security(
        ("cookie" = [])
    )
)]
async fn chapters_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, chapter_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ChapterUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let chapter = owned_chapter(&state, user, id, chapter_id).await?;

    let updated = chapter
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource(Chapter::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/chapters/{chapter_id}",
    description = "Deletes the chapter, later chapters move up one position",
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("chapter_id" = Uuid, Path, description = "Chapter id"),
    ),
    responses(
        (status = 200, description = "Chapter deleted"),
        (status = 400, description = "Chapter not in course", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning teacher can do this", body = ErrorResponse),
        (status = 404, description = "Course or chapter not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "chapters",
    security(
        ("cookie" = [])
    )
)]
async fn chapters_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, chapter_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let chapter = owned_chapter(&state, user, id, chapter_id).await?;

    chapter
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource(Chapter::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/chapters/{chapter_id}/video",
    description = "Multipart upload (field `file`). The file is handed to the video host and the playback url stored on the chapter",
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("chapter_id" = Uuid, Path, description = "Chapter id"),
    ),
    responses(
        (status = 200, description = "Chapter with its new video url", body = Chapter),
        (status = 400, description = "Missing file or chapter not in course", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning teacher can do this", body = ErrorResponse),
        (status = 404, description = "Course or chapter not found", body = ErrorResponse),
        (status = 502, description = "Video host failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "chapters",
    security(
        ("cookie" = [])
    )
)]
async fn chapters_video_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, chapter_id)): Path<(Uuid, Uuid)>,
    multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let chapter = owned_chapter(&state, user, id, chapter_id).await?;
    let (filename, bytes) = read_file_field(multipart).await?;

    let reference = state
        .gateways()
        .storage()
        .save("videos", &filename, &bytes)
        .await
        .map_err(WebError::gateway)?;

    // the video host pulls the file from us
    let source_url = format!("{}{}", state.storefront().public_url, reference);
    let playback_url = state
        .gateways()
        .video()
        .upload(&source_url)
        .await
        .map_err(WebError::gateway)?;

    let updated = chapter
        .set_video_url(state.pool(), user, &playback_url)
        .await
        .map_err(|e| WebError::resource(Chapter::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/chapters/{chapter_id}/attachments",
    description = "Multipart upload (field `file`) of a downloadable chapter attachment",
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("chapter_id" = Uuid, Path, description = "Chapter id"),
    ),
    responses(
        (status = 201, description = "Attachment stored", body = Attachment),
        (status = 400, description = "Missing file or chapter not in course", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning teacher can do this", body = ErrorResponse),
        (status = 404, description = "Course or chapter not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "chapters",
    security(
        ("cookie" = [])
    )
)]
async fn attachments_upload_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, chapter_id)): Path<(Uuid, Uuid)>,
    multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let chapter = owned_chapter(&state, user, id, chapter_id).await?;
    let (filename, bytes) = read_file_field(multipart).await?;

    let url = state
        .gateways()
        .storage()
        .save("attachments", &filename, &bytes)
        .await
        .map_err(WebError::gateway)?;

    let payload = AttachmentCreate {
        chapter_id: chapter.id(),
        filename,
        url,
    };
    let created = Attachment::create(state.pool(), user, &chapter, payload)
        .await
        .map_err(|e| WebError::resource(Attachment::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/chapters/{chapter_id}/attachments/{attachment_id}",
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("chapter_id" = Uuid, Path, description = "Chapter id"),
        ("attachment_id" = Uuid, Path, description = "Attachment id"),
    ),
    responses(
        (status = 200, description = "Attachment deleted"),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning teacher can do this", body = ErrorResponse),
        (status = 404, description = "Attachment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "chapters",
    security(
        ("cookie" = [])
    )
)]
async fn attachments_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, chapter_id, attachment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    owned_chapter(&state, user, id, chapter_id).await?;

    let attachment = Attachment::find_by_id(state.pool(), attachment_id)
        .await
        .map_err(|e| WebError::resource(Attachment::get_resource_type(), e))?
        .filter(|a| a.chapter_id() == chapter_id)
        .ok_or(WebError::resource_not_found(Attachment::get_resource_type()))?;

    attachment
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource(Attachment::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
