use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT issued by the identity provider for the current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::user::user_me_handler,
        crate::web::routes::user::user_verify_handler,
        crate::web::routes::user::user_purchases_handler,
        crate::web::routes::categories::categories_list_handler,
        crate::web::routes::courses::courses_list_handler,
        crate::web::routes::courses::courses_create_handler,
        crate::web::routes::courses::courses_dashboard_handler,
        crate::web::routes::courses::courses_details_handler,
        crate::web::routes::courses::courses_update_handler,
        crate::web::routes::courses::courses_delete_handler,
        crate::web::routes::chapters::chapters_create_handler,
        crate::web::routes::chapters::chapters_reorder_handler,
        crate::web::routes::chapters::chapters_update_handler,
        crate::web::routes::chapters::chapters_delete_handler,
        crate::web::routes::chapters::chapters_video_handler,
        crate::web::routes::chapters::attachments_upload_handler,
        crate::web::routes::chapters::attachments_delete_handler,
        crate::web::routes::progress::progress_get_handler,
        crate::web::routes::progress::progress_toggle_handler,
        crate::web::routes::purchase::purchase_handler,
        crate::web::routes::purchase::checkout_success_handler,
        crate::web::routes::purchase::checkout_cancel_handler,
    ),
    modifiers(&CookieAuthModifier),
    tags(
        (name = "account", description = "Current user"),
        (name = "courses", description = "Catalog and course authoring"),
        (name = "chapters", description = "Chapter authoring, ordering and uploads"),
        (name = "progress", description = "Per chapter completion tracking"),
        (name = "purchase", description = "Checkout and enrollment"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn openapi_lists_course_routes_test() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/v1/courses/{id}/chapters/reorder"));
        assert!(paths.contains_key("/api/v1/courses/{id}/progress"));
        assert!(paths.contains_key("/api/v1/courses/{id}/checkout/success"));
        assert!(paths.contains_key("/api/v1/account/purchases"));
    }
}
