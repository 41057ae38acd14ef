use crate::{
    Config,
    gateway::STATIC_PREFIX,
    utils::uploads::get_uploads_dir,
    web::{AppState, doc::ApiDoc},
};
use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod categories;
pub mod chapters;
pub mod courses;
pub mod progress;
pub mod purchase;
pub mod user;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    20
}

pub fn build_app<S: Send + Sync + Clone + 'static>(
    state: AppState,
    config: &'static Config,
) -> Router<S> {
    // every course scoped operation shares the /courses prefix
    let courses = courses::routes(state.clone())
        .merge(chapters::routes(state.clone()))
        .merge(progress::routes(state.clone()))
        .merge(purchase::routes(state.clone()));

    let uploads = get_uploads_dir(config.app().upload_dir())
        .unwrap_or_else(|_| config.app().upload_dir().into());

    let mut router = Router::new()
        .nest("/api/v1/account", user::routes(state.clone()))
        .nest("/api/v1/categories", categories::routes(state.clone()))
        .nest("/api/v1/courses", courses)
        .nest_service(STATIC_PREFIX, ServeDir::new(uploads))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}
