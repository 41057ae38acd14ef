use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped,
        entity::{Attachment, Chapter, Course, CourseCreate, CourseProgress, CourseUpdate, Enrollment},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{ChapterWithAttachments, CourseDetails, Dashboard},
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler).post(courses_create_handler))
        .route("/dashboard", get(courses_dashboard_handler))
        .route(
            "/{id}",
            get(courses_details_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses",
    description = "Lists published courses, newest first",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Requested page of courses", body = crate::model::Page<Course>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
async fn courses_list_handler(
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let courses = Course::page(state.pool(), &AuthenticatedUser::admin(), page.limit, page.offset)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CourseCreate,
    description = "Creates an unpublished course owned by the calling teacher",
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid title or price", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only teachers can create courses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/dashboard",
    description = "Courses the caller teaches and courses the caller is enrolled in",
    responses(
        (status = 200, description = "Dashboard", body = Dashboard),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_dashboard_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let created = if user.is_teacher() {
        Course::all_by_teacher(state.pool(), user.user_id())
            .await
            .map_err(|e| WebError::resource(Course::get_resource_type(), e))?
    } else {
        Vec::new()
    };

    let enrolled = Course::all_enrolled(state.pool(), user.user_id())
        .await
        .map_err(|e| WebError::resource(Enrollment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(Dashboard { created, enrolled })))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    description = "Course with its ordered chapters, their attachments and the caller's progress",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course details", body = CourseDetails),
        (status = 404, description = "Course not found or not published", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        (),
        ("cookie" = [])
    )
)]
async fn courses_details_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let lookup = AuthenticatedUser::admin();
    let course = Course::get(state.pool(), &lookup, id)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    let maybe_user = ctx.maybe_user();
    if !course.is_visible_to(maybe_user) {
        return Err(WebError::resource_not_found(Course::get_resource_type()));
    }
    let is_owner = maybe_user.is_some_and(|u| u.user_id() == course.teacher_id());

    let mut chapters = Chapter::all_by_course(state.pool(), course.id())
        .await
        .map_err(|e| WebError::resource(Chapter::get_resource_type(), e))?;
    if !is_owner {
        chapters.retain(|c| c.is_published());
    }

    let attachments = Attachment::all_by_course(state.pool(), course.id())
        .await
        .map_err(|e| WebError::resource(Attachment::get_resource_type(), e))?;

    let (completed_chapter_ids, progress, is_enrolled) = match maybe_user {
        Some(user) => {
            let completed = CourseProgress::completed_chapter_ids(state.pool(), user, course.id())
                .await
                .map_err(|e| WebError::resource(CourseProgress::get_resource_type(), e))?;
            let progress = CourseProgress::compute(state.pool(), user, course.id())
                .await
                .map_err(|e| WebError::resource(CourseProgress::get_resource_type(), e))?;
            let enrolled = Enrollment::exists(state.pool(), user.user_id(), course.id())
                .await
                .map_err(|e| WebError::resource(Enrollment::get_resource_type(), e))?;
            (completed, progress, enrolled)
        }
        None => (Vec::new(), 0, false),
    };

    let details = CourseDetails {
        chapters: ChapterWithAttachments::group(chapters, attachments),
        course,
        completed_chapter_ids,
        progress,
        is_enrolled,
    };

    Ok((StatusCode::OK, Json(details)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CourseUpdate,
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid title or price", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning teacher can do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = Course::get(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    description = "Deletes the course with its chapters, attachments, enrollments and progress",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning teacher can do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn courses_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = Course::get(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
