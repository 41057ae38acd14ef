mod common;
use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use coursemart::model::entity::{Enrollment, Purchase, PurchaseCreate, PurchaseOutcome};

use crate::common::{Action, Flow, seed_course, seed_user, setup_server, setup_test_db};

#[tokio::test]
async fn route_purchase_checkout_test() {
    let db = setup_test_db().await;
    let mut app = setup_server(&db).await;

    let teacher = seed_user(&db, "teacher@example.com", true).await;
    let student = seed_user(&db, "student@example.com", false).await;
    let (course, _) = seed_course(&db, &teacher, 4900, 2).await;
    let purchase = format!("/api/v1/courses/{}/purchase", course.id());
    let success = format!("/api/v1/courses/{}/checkout/success", course.id());

    Flow::new()
        .step(
            Action::new("start", "POST", &purchase)
                .as_user(&student)
                .assert_body(|body| {
                    assert_eq!(body["status"], "pending");
                    assert_eq!(body["session_id"], "cs_test_0");
                    assert_eq!(body["checkout_url"], "https://checkout.example/pay/cs_test_0");
                }),
        )
        .step(
            Action::new("confirm", "GET", &success)
                .as_user(&student)
                .with_param("session_id", "cs_test_0")
                .assert_body(|body| assert_eq!(body["status"], "purchased")),
        )
        // provider redirects twice, or the user reloads the page
        .step(
            Action::new("confirm_again", "GET", &success)
                .as_user(&student)
                .with_param("session_id", "cs_test_0")
                .assert_body(|body| assert_eq!(body["status"], "already_owned")),
        )
        .step(
            Action::new("purchase_again", "POST", &purchase)
                .as_user(&student)
                .assert_body(|body| {
                    assert_eq!(body["status"], "already_owned");
                    assert!(body["checkout_url"].is_null());
                }),
        )
        .run(&mut app.server)
        .await;

    // the second purchase never reached the provider
    assert_eq!(app.payment.created(), 1);

    assert_eq!(db.count_enrollments(student.id, course.id()).await, 1);
    assert_eq!(db.count_purchases(student.id, course.id()).await, 1);

    Flow::new()
        .step(
            Action::new("history", "GET", "/api/v1/account/purchases")
                .as_user(&student)
                .assert_body(|body| {
                    assert_eq!(body.as_array().unwrap().len(), 1);
                    assert_eq!(body[0]["amount"], 4900);
                    assert_eq!(body[0]["session_id"], "cs_test_0");
                }),
        )
        .step(Action::new("history_anonymous", "GET", "/api/v1/account/purchases").with_expect(StatusCode::UNAUTHORIZED))
        .run(&mut app.server)
        .await;
}

#[tokio::test]
async fn route_purchase_free_course_test() {
    let db = setup_test_db().await;
    let mut app = setup_server(&db).await;

    let teacher = seed_user(&db, "teacher@example.com", true).await;
    let student = seed_user(&db, "student@example.com", false).await;
    let (course, _) = seed_course(&db, &teacher, 0, 1).await;
    let purchase = format!("/api/v1/courses/{}/purchase", course.id());

    Flow::new()
        .step(
            Action::new("free", "POST", &purchase)
                .as_user(&student)
                .assert_body(|body| assert_eq!(body["status"], "purchased")),
        )
        .step(
            Action::new("free_again", "POST", &purchase)
                .as_user(&student)
                .assert_body(|body| assert_eq!(body["status"], "already_owned")),
        )
        .run(&mut app.server)
        .await;

    assert_eq!(app.payment.created(), 0);
    assert_eq!(db.count_enrollments(student.id, course.id()).await, 1);
    assert_eq!(db.count_purchases(student.id, course.id()).await, 1);
}

#[tokio::test]
async fn route_purchase_rejected_test() {
    let db = setup_test_db().await;
    let mut app = setup_server(&db).await;

    let teacher = seed_user(&db, "teacher@example.com", true).await;
    let student = seed_user(&db, "student@example.com", false).await;
    let other = seed_user(&db, "other@example.com", false).await;
    let (course, _) = seed_course(&db, &teacher, 4900, 1).await;
    let (other_course, _) = seed_course(&db, &teacher, 2500, 1).await;
    let purchase = format!("/api/v1/courses/{}/purchase", course.id());
    let success = format!("/api/v1/courses/{}/checkout/success", course.id());

    app.payment.unpaid.store(true, Ordering::SeqCst);

    Flow::new()
        .step(
            Action::new("unknown_course", "POST", &format!("/api/v1/courses/{}/purchase", uuid::Uuid::new_v4()))
                .as_user(&student)
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(Action::new("anonymous", "POST", &purchase).with_expect(StatusCode::UNAUTHORIZED))
        .step(Action::new("start", "POST", &purchase).as_user(&student))
        .step(
            Action::new("unpaid", "GET", &success)
                .as_user(&student)
                .with_param("session_id", "cs_test_0")
                .with_expect(StatusCode::PAYMENT_REQUIRED),
        )
        .step(
            Action::new("someone_elses_session", "GET", &success)
                .as_user(&other)
                .with_param("session_id", "cs_test_0")
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new(
                "session_for_other_course",
                "GET",
                &format!("/api/v1/courses/{}/checkout/success", other_course.id()),
            )
            .as_user(&student)
            .with_param("session_id", "cs_test_0")
            .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("unknown_session", "GET", &success)
                .as_user(&student)
                .with_param("session_id", "cs_missing")
                .with_expect(StatusCode::BAD_GATEWAY),
        )
        .step(
            Action::new("cancel", "GET", &format!("/api/v1/courses/{}/checkout/cancel", course.id()))
                .as_user(&student)
                .assert_body(|body| assert_eq!(body["status"], "cancelled")),
        )
        .run(&mut app.server)
        .await;

    let mm = db.mm();
    assert!(!Enrollment::exists(&mm, student.id, course.id()).await.unwrap());
    assert_eq!(db.count_purchases(student.id, course.id()).await, 0);
    assert_eq!(db.count_purchases(other.id, course.id()).await, 0);
}

#[tokio::test]
async fn purchase_concurrent_confirmations_test() {
    let db = setup_test_db().await;

    let teacher = seed_user(&db, "teacher@example.com", true).await;
    let student = seed_user(&db, "student@example.com", false).await;
    let (course, _) = seed_course(&db, &teacher, 4900, 1).await;
    let mm = db.mm();

    // two checkout sessions for the same course confirmed at the same moment
    let confirmed = |session: &str| PurchaseCreate {
        user_id: student.id,
        course_id: course.id(),
        session_id: Some(session.to_string()),
        amount: 4900,
        currency: String::from("usd"),
    };
    let (first, second) = tokio::join!(
        Purchase::record(&mm, &student.actor, confirmed("cs_race_a")),
        Purchase::record(&mm, &student.actor, confirmed("cs_race_b")),
    );

    let mut outcomes = vec![first.unwrap(), second.unwrap()];
    outcomes.sort_by_key(|o| *o == PurchaseOutcome::Purchased);
    assert_eq!(outcomes, vec![PurchaseOutcome::AlreadyOwned, PurchaseOutcome::Purchased]);

    assert_eq!(db.count_purchases(student.id, course.id()).await, 1);
    assert_eq!(db.count_enrollments(student.id, course.id()).await, 1);
}
