mod common;
use axum::http::StatusCode;
use coursemart::model::{CrudRepository, entity::Course};
use serde_json::json;

use crate::common::{Action, Flow, seed_course, seed_user, setup_server, setup_test_db};

fn course_body(title: &str, price: i64, is_published: bool) -> serde_json::Value {
    json!({
        "title": title,
        "description": "Async Rust from the ground up",
        "image_url": null,
        "price": price,
        "category_id": null,
        "is_published": is_published,
    })
}

#[tokio::test]
async fn route_course_authoring_test() {
    let db = setup_test_db().await;
    let mut app = setup_server(&db).await;

    let teacher = seed_user(&db, "teacher@example.com", true).await;
    let stranger = seed_user(&db, "stranger@example.com", true).await;
    let student = seed_user(&db, "student@example.com", false).await;

    Flow::new()
        .step(
            Action::new("create", "POST", "/api/v1/courses")
                .as_user(&teacher)
                .with_body(course_body("Tokio in practice", 2900, false))
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| assert_eq!(body["is_published"], false))
                .with_save_as("course"),
        )
        .step(
            Action::new("student_create", "POST", "/api/v1/courses")
                .as_user(&student)
                .with_body(course_body("Not a teacher", 100, false))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("negative_price", "POST", "/api/v1/courses")
                .as_user(&teacher)
                .with_body(course_body("Broken", -1, false))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("hidden_from_students", "GET", "")
                .as_user(&student)
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id_of("course")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("visible_to_owner", "GET", "")
                .as_user(&teacher)
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id_of("course"))),
        )
        .step(
            Action::new("edit_by_stranger", "PUT", "")
                .as_user(&stranger)
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id_of("course")))
                .with_body(course_body("Hijacked", 1, true))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("publish", "PUT", "")
                .as_user(&teacher)
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id_of("course")))
                .with_body(course_body("Tokio in practice", 2900, true))
                .assert_body(|body| assert_eq!(body["is_published"], true)),
        )
        .step(
            Action::new("listed", "GET", "/api/v1/courses")
                .with_param("limit", "10")
                .assert_body(|body| {
                    assert_eq!(body["total"], 1);
                    assert_eq!(body["items"][0]["title"], "Tokio in practice");
                }),
        )
        .step(
            Action::new("edit_missing", "PUT", &format!("/api/v1/courses/{}", uuid::Uuid::new_v4()))
                .as_user(&teacher)
                .with_body(course_body("Ghost", 1, true))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("delete_by_stranger", "DELETE", "")
                .as_user(&stranger)
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id_of("course")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("delete", "DELETE", "")
                .as_user(&teacher)
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id_of("course"))),
        )
        .step(
            Action::new("gone", "GET", "")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", ctx.id_of("course")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut app.server)
        .await;

    assert_eq!(Course::count(&db.mm(), &teacher.actor).await.unwrap(), 0);
}

#[tokio::test]
async fn route_course_details_and_dashboard_test() {
    let db = setup_test_db().await;
    let mut app = setup_server(&db).await;

    let teacher = seed_user(&db, "teacher@example.com", true).await;
    let student = seed_user(&db, "student@example.com", false).await;
    let (course, chapters) = seed_course(&db, &teacher, 0, 3).await;
    let details = format!("/api/v1/courses/{}", course.id());
    let first = chapters[0].id();

    Flow::new()
        .step(
            Action::new("anonymous_details", "GET", &details).assert_body(|body| {
                assert_eq!(body["chapters"].as_array().unwrap().len(), 3);
                assert_eq!(body["chapters"][0]["position"], 1);
                assert_eq!(body["is_enrolled"], false);
                assert_eq!(body["progress"], 0);
            }),
        )
        .step(Action::new("enroll", "POST", &format!("{details}/purchase")).as_user(&student))
        .step(
            Action::new("complete", "POST", &format!("{details}/progress"))
                .as_user(&student)
                .with_body(json!({ "chapter_id": first })),
        )
        .step(
            Action::new("student_details", "GET", &details)
                .as_user(&student)
                .assert_body(move |body| {
                    assert_eq!(body["is_enrolled"], true);
                    assert_eq!(body["progress"], 33);
                    assert_eq!(body["completed_chapter_ids"], json!([first]));
                }),
        )
        .step(
            Action::new("student_dashboard", "GET", "/api/v1/courses/dashboard")
                .as_user(&student)
                .assert_body(|body| {
                    assert_eq!(body["created"], json!([]));
                    assert_eq!(body["enrolled"].as_array().unwrap().len(), 1);
                }),
        )
        .step(
            Action::new("teacher_dashboard", "GET", "/api/v1/courses/dashboard")
                .as_user(&teacher)
                .assert_body(|body| {
                    assert_eq!(body["created"].as_array().unwrap().len(), 1);
                    assert_eq!(body["enrolled"], json!([]));
                }),
        )
        .step(
            Action::new("anonymous_dashboard", "GET", "/api/v1/courses/dashboard")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(Action::new("categories", "GET", "/api/v1/categories").assert_body(|body| {
            assert_eq!(body, &json!([]));
        }))
        .step(
            Action::new("me", "GET", "/api/v1/account/me")
                .as_user(&student)
                .assert_body(|body| assert_eq!(body["email"], "student@example.com")),
        )
        .step(Action::new("verify_anonymous", "GET", "/api/v1/account/verify").with_expect(StatusCode::UNAUTHORIZED))
        .run(&mut app.server)
        .await;
}
