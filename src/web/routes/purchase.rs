use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    gateway::{CheckoutRequest, GatewayError},
    model::{
        ResourceTyped,
        entity::{Course, Enrollment, Purchase, PurchaseCreate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{CheckoutSuccessQuery, PurchaseResponse, PurchaseStatus},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{id}/purchase", post(purchase_handler))
        .route("/{id}/checkout/success", get(checkout_success_handler))
        .route("/{id}/checkout/cancel", get(checkout_cancel_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// A course the caller may buy: it exists and is visible to them.
async fn purchasable_course(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Course> {
    let course = Course::get(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource(Course::get_resource_type(), e))?;

    if !course.is_visible_to(Some(user)) {
        return Err(WebError::resource_not_found(Course::get_resource_type()));
    }
    Ok(course)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/purchase",
    description = "Starts a purchase. Owned courses are reported as such, free courses are granted \
                   right away, paid courses get a hosted checkout session to redirect to",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "`already_owned`, `purchased` or `pending` with a checkout url", body = PurchaseResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 502, description = "Payment provider failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "purchase",
    security(
        ("cookie" = [])
    )
)]
async fn purchase_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = purchasable_course(&state, user, id).await?;

    let owned = Enrollment::exists(state.pool(), user.user_id(), course.id())
        .await
        .map_err(|e| WebError::resource(Enrollment::get_resource_type(), e))?;
    if owned {
        let body = PurchaseResponse::settled(course.id(), PurchaseStatus::AlreadyOwned);
        return Ok((StatusCode::OK, Json(body)));
    }

    let storefront = state.storefront();

    if course.is_free() {
        let outcome = Purchase::record(
            state.pool(),
            user,
            PurchaseCreate {
                user_id: user.user_id(),
                course_id: course.id(),
                session_id: None,
                amount: 0,
                currency: storefront.currency.clone(),
            },
        )
        .await
        .map_err(|e| WebError::resource(Purchase::get_resource_type(), e))?;

        let body = PurchaseResponse::settled(course.id(), outcome.into());
        return Ok((StatusCode::OK, Json(body)));
    }

    let base = format!("{}/api/v1/courses/{}/checkout", storefront.public_url, course.id());
    let request = CheckoutRequest {
        course_id: course.id(),
        user_id: user.user_id(),
        title: course.title().to_string(),
        amount: course.price(),
        currency: storefront.currency.clone(),
        // the provider substitutes the placeholder with the real session id
        success_url: format!("{base}/success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{base}/cancel"),
    };

    let session = state
        .gateways()
        .payment()
        .create_checkout_session(request)
        .await
        .map_err(WebError::gateway)?;

    tracing::info!(user_id = %user.user_id(), course_id = %course.id(), session_id = %session.id, "checkout started");

    let body = PurchaseResponse {
        course_id: course.id(),
        status: PurchaseStatus::Pending,
        session_id: Some(session.id),
        checkout_url: Some(session.url),
    };
    Ok((StatusCode::OK, Json(body)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/checkout/success",
    description = "Confirms a checkout session with the payment provider and grants the course",
    params(
        ("id" = Uuid, Path, description = "Course id"),
        CheckoutSuccessQuery,
    ),
    responses(
        (status = 200, description = "`purchased`, or `already_owned` on a repeated confirmation", body = PurchaseResponse),
        (status = 400, description = "Session belongs to another course or user", body = ErrorResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 402, description = "Session is not paid", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Session already used for another purchase", body = ErrorResponse),
        (status = 502, description = "Payment provider failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "purchase",
    security(
        ("cookie" = [])
    )
)]
async fn checkout_success_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<CheckoutSuccessQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = purchasable_course(&state, user, id).await?;

    let confirmation = state
        .gateways()
        .payment()
        .confirm(&query.session_id)
        .await
        .map_err(WebError::gateway)?;

    if confirmation.course_id != Some(course.id()) || confirmation.user_id != Some(user.user_id()) {
        return Err(WebError::gateway(GatewayError::SessionMismatch {
            session_id: confirmation.session_id,
        }));
    }
    if !confirmation.paid {
        return Err(WebError::gateway(GatewayError::NotPaid {
            session_id: confirmation.session_id,
        }));
    }

    let outcome = Purchase::record(
        state.pool(),
        user,
        PurchaseCreate {
            user_id: user.user_id(),
            course_id: course.id(),
            session_id: Some(confirmation.session_id),
            amount: confirmation.amount,
            currency: confirmation.currency,
        },
    )
    .await
    .map_err(|e| WebError::resource(Purchase::get_resource_type(), e))?;

    let body = PurchaseResponse::settled(course.id(), outcome.into());
    Ok((StatusCode::OK, Json(body)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/checkout/cancel",
    description = "Landing point for an abandoned checkout, nothing is recorded",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "`cancelled`", body = PurchaseResponse),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "purchase",
    security(
        ("cookie" = [])
    )
)]
async fn checkout_cancel_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = purchasable_course(&state, user, id).await?;

    tracing::debug!(user_id = %user.user_id(), course_id = %course.id(), "checkout cancelled");

    let body = PurchaseResponse::settled(course.id(), PurchaseStatus::Cancelled);
    Ok((StatusCode::OK, Json(body)))
}
