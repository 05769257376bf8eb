use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::router::booking_routes;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

fn test_app(config: &TestConfig) -> Router {
    booking_routes(config.to_arc())
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn test_get_availability_is_public() {
    let mock_server = MockServer::start().await;
    let barber_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/working_slots"))
        .and(query_param("barber_id", format!("eq.{}", barber_id)))
        .and(query_param("weekday", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::working_slot_response(&barber_id.to_string(), 2, "09:00"),
            MockStoreResponses::working_slot_response(&barber_id.to_string(), 2, "10:00")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let app = test_app(&config);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/availability/{}?date=2026-03-10&now=2026-03-10T08:00:00Z",
                    barber_id
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["works_this_day"], json!(true));
    assert_eq!(body["available"], json!(["09:00", "10:00"]));
}

#[tokio::test]
async fn test_get_availability_reports_no_schedule_day() {
    let mock_server = MockServer::start().await;
    let barber_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/working_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let app = test_app(&config);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/availability/{}?date=2026-03-10", barber_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["works_this_day"], json!(false));
    assert_eq!(body["available"], json!([]));
}

#[tokio::test]
async fn test_book_appointment_requires_authentication() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri());
    let app = test_app(&config);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/appointments")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "barber_id": Uuid::new_v4(),
                        "shop_id": Uuid::new_v4(),
                        "service_id": Uuid::new_v4(),
                        "customer_id": Uuid::new_v4(),
                        "date": "2026-03-10",
                        "time_of_day": "10:00"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_guest_booking_needs_no_authentication() {
    let mock_server = MockServer::start().await;
    let barber_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment_response(
                &barber_id.to_string(),
                &Uuid::nil().to_string(),
                "2026-03-10",
                "10:00",
                "confirmed"
            )
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let app = test_app(&config);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/appointments/guest")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "barber_id": barber_id,
                        "shop_id": Uuid::new_v4(),
                        "service_id": Uuid::new_v4(),
                        "date": "2026-03-10",
                        "time_of_day": "10:00"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(
        body["appointment"]["customer_id"],
        json!(Uuid::nil().to_string())
    );
}

#[tokio::test]
async fn test_customers_cannot_transition_appointments() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri());
    let app = test_app(&config);

    let customer = TestUser::customer("walkin@example.com");
    let token = JwtTestUtils::create_test_token(&customer, &config.jwt_secret, Some(1));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/appointments/{}/transition", Uuid::new_v4()))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "status": "cancelled" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_barber_manages_only_their_own_schedule() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri());

    let barber = TestUser::barber("fader@example.com");
    let token = JwtTestUtils::create_test_token(&barber, &config.jwt_secret, Some(1));

    // Another barber's schedule: refused before any store round-trip.
    let response = test_app(&config)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/barbers/{}/working-slots", Uuid::new_v4()))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "slots": [{ "weekday": 2, "time_of_day": "14:00" }] }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Their own schedule: goes through.
    Mock::given(method("GET"))
        .and(path("/rest/v1/working_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/working_slots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::working_slot_response(&barber.id, 2, "14:00")
        ])))
        .mount(&mock_server)
        .await;

    let response = test_app(&config)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/barbers/{}/working-slots", barber.id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "slots": [{ "weekday": 2, "time_of_day": "14:00" }] }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_removes_working_slots_and_gets_cancelled_count() {
    let mock_server = MockServer::start().await;
    let barber_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/working_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::working_slot_response(&barber_id.to_string(), 2, "14:00")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.confirmed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": appointment_id,
            "barber_id": barber_id,
            "shop_id": Uuid::new_v4(),
            "service_id": Uuid::new_v4(),
            "customer_id": Uuid::new_v4(),
            "date": "2026-03-10",
            "time_of_day": "14:00",
            "status": "confirmed",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": appointment_id,
            "barber_id": barber_id,
            "shop_id": Uuid::new_v4(),
            "service_id": Uuid::new_v4(),
            "customer_id": Uuid::new_v4(),
            "date": "2026-03-10",
            "time_of_day": "14:00",
            "status": "cancelled",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_store_url(&mock_server.uri());
    let admin = TestUser::admin("owner@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &config.jwt_secret, Some(1));

    let response = test_app(&config)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/barbers/{}/working-slots", barber_id))
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "entries": [{ "weekday": 2, "time_of_day": "14:00" }] }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["cancelled_appointments"], json!(1));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri());
    let app = test_app(&config);

    let user = TestUser::barber("fader@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/barbers/{}/working-slots", user.id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
