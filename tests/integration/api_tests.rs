//! API integration tests through the full router

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use salon_booking::{api, models::user::Role};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::fixtures::{Salon, MONDAY, SUNDAY};

async fn send(salon: &Salon, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    api::router(salon.state.clone()).oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn booking_body(salon: &Salon, date: &str, start: &str) -> Value {
    json!({
        "salon_id": salon.salon_id,
        "staff_id": salon.staff_id,
        "service_id": salon.service_id,
        "date": date,
        "start_time": start,
    })
}

#[tokio::test]
async fn test_health_and_ready() {
    let salon = Salon::new().await;

    let response = send(&salon, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");

    let response = send(&salon, Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ready");
}

#[tokio::test]
async fn test_available_slots_is_public() {
    let salon = Salon::new().await;
    let uri = format!(
        "/api/v1/appointments/available-slots?staff_id={}&service_id={}&date={}",
        salon.staff_id, salon.service_id, MONDAY
    );

    let response = send(&salon, Method::GET, &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let slots = json_body(response).await;
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), 15);
    assert_eq!(slots[0], json!({"start_time": "09:00", "end_time": "10:00", "available": true}));
    assert_eq!(slots[14]["start_time"], "16:00");
}

#[tokio::test]
async fn test_booking_requires_token() {
    let salon = Salon::new().await;

    let response = send(
        &salon,
        Method::POST,
        "/api/v1/appointments",
        None,
        Some(booking_body(&salon, MONDAY, "14:00")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["kind"], "unauthenticated");

    let response = send(
        &salon,
        Method::POST,
        "/api/v1/appointments",
        Some("not-a-jwt"),
        Some(booking_body(&salon, MONDAY, "14:00")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_book_then_conflict() {
    let salon = Salon::new().await;
    let token = salon.token(salon.customer_id, Role::Customer);

    let mut body = booking_body(&salon, MONDAY, "14:00");
    body["end_time"] = json!("23:00");
    body["notes"] = json!("Short on the sides");

    let response = send(&salon, Method::POST, "/api/v1/appointments", Some(&token), Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let confirmation = json_body(response).await;
    assert_eq!(confirmation["appointment"]["start_time"], "14:00");
    assert_eq!(confirmation["appointment"]["end_time"], "15:00");
    assert_eq!(confirmation["appointment"]["status"], "confirmed");
    assert_eq!(confirmation["payment"]["status"], "pending");
    assert_eq!(confirmation["payment"]["total"], "54.00");
    assert!(confirmation["payment"]["receipt_number"]
        .as_str()
        .unwrap()
        .starts_with("RCP-"));

    let other = salon.add_customer().await;
    let response = send(
        &salon,
        Method::POST,
        "/api/v1/appointments",
        Some(&salon.token(other, Role::Customer)),
        Some(booking_body(&salon, MONDAY, "14:30")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let error = json_body(response).await;
    assert_eq!(error["kind"], "availability_conflict");
    assert_eq!(error["retryable"], false);
    assert_eq!(error["message"], "time slot is already booked");
}

#[tokio::test]
async fn test_error_kinds_for_bad_requests() {
    let salon = Salon::new().await;
    let token = salon.token(salon.customer_id, Role::Customer);

    let response = send(
        &salon,
        Method::POST,
        "/api/v1/appointments",
        Some(&token),
        Some(booking_body(&salon, "2025-06-31", "10:00")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "validation_error");

    let response = send(
        &salon,
        Method::POST,
        "/api/v1/appointments",
        Some(&token),
        Some(booking_body(&salon, SUNDAY, "10:00")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let mut body = booking_body(&salon, MONDAY, "10:00");
    body["promo_code"] = json!("NOSUCHCODE");
    let response = send(&salon, Method::POST, "/api/v1/appointments", Some(&token), Some(body)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["kind"], "promo_ineligible");
}

#[tokio::test]
async fn test_appointment_lifecycle_endpoints() {
    let salon = Salon::new().await;
    let customer = salon.token(salon.customer_id, Role::Customer);
    let owner = salon.token(Uuid::new_v4(), Role::SalonOwner);

    let response = send(
        &salon,
        Method::POST,
        "/api/v1/appointments",
        Some(&customer),
        Some(booking_body(&salon, MONDAY, "10:00")),
    )
    .await;
    let id = json_body(response).await["appointment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(&salon, Method::GET, "/api/v1/appointments/mine", Some(&customer), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let stranger = salon.token(Uuid::new_v4(), Role::Customer);
    let uri = format!("/api/v1/appointments/{}", id);
    let response = send(&salon, Method::GET, &uri, Some(&stranger), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let uri = format!("/api/v1/appointments/{}/reschedule", id);
    let response = send(
        &salon,
        Method::PUT,
        &uri,
        Some(&customer),
        Some(json!({"date": MONDAY, "start_time": "15:00"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["end_time"], "16:00");

    let uri = format!("/api/v1/appointments/{}/complete", id);
    let response = send(&salon, Method::POST, &uri, Some(&customer), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&salon, Method::POST, &uri, Some(&owner), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "completed");

    let uri = format!("/api/v1/appointments/{}/cancel", id);
    let response = send(&salon, Method::POST, &uri, Some(&customer), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "invalid_state");
}

#[tokio::test]
async fn test_payment_processing_and_receipt() {
    let salon = Salon::new().await;
    let customer = salon.token(salon.customer_id, Role::Customer);

    let response = send(
        &salon,
        Method::POST,
        "/api/v1/appointments",
        Some(&customer),
        Some(booking_body(&salon, MONDAY, "11:00")),
    )
    .await;
    let id = json_body(response).await["appointment"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        &salon,
        Method::POST,
        "/api/v1/payments",
        Some(&customer),
        Some(json!({"appointment_id": id, "method": "cash"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payment = json_body(response).await;
    assert_eq!(payment["status"], "completed");
    assert_eq!(payment["method"], "cash");

    let uri = format!("/api/v1/appointments/{}/payment", id);
    let response = send(&salon, Method::GET, &uri, Some(&customer), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["receipt_number"], payment["receipt_number"]);

    // Cancelling refunds, after which the payment cannot be processed again
    let cancel = format!("/api/v1/appointments/{}/cancel", id);
    send(&salon, Method::POST, &cancel, Some(&customer), None).await;
    let response = send(
        &salon,
        Method::POST,
        "/api/v1/payments",
        Some(&customer),
        Some(json!({"appointment_id": id, "method": "card"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_promo_validation_endpoint() {
    let salon = Salon::new().await;
    salon.add_promo("WELCOME10", 10, None).await;

    let uri = format!("/api/v1/promos/validate?code=WELCOME10&salon_id={}", salon.salon_id);
    let response = send(&salon, Method::GET, &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = json_body(response).await;
    assert_eq!(result["valid"], true);
    assert_eq!(result["discount_percent"], "10");

    let uri = format!("/api/v1/promos/validate?code=WELCOME10&salon_id={}", Uuid::new_v4());
    let result = json_body(send(&salon, Method::GET, &uri, None, None).await).await;
    assert_eq!(result["valid"], false);
}

#[tokio::test]
async fn test_working_hours_management() {
    let salon = Salon::new().await;
    let owner = salon.token(Uuid::new_v4(), Role::SalonOwner);
    let customer = salon.token(salon.customer_id, Role::Customer);
    let uri = format!("/api/v1/staff/{}/working-hours", salon.staff_id);

    let response = send(&salon, Method::GET, &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let week = json_body(response).await;
    assert_eq!(week.as_array().unwrap().len(), 7);
    assert_eq!(week[0]["is_off"], true);

    let sunday_shift = json!({"hours": [
        {"day_of_week": 0, "start_time": "10:00", "end_time": "14:00"},
        {"day_of_week": 1, "start_time": "09:00", "end_time": "17:00"}
    ]});

    let response = send(&salon, Method::PUT, &uri, Some(&customer), Some(sunday_shift.clone())).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&salon, Method::PUT, &uri, Some(&owner), Some(sunday_shift)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);

    let slots_uri = format!(
        "/api/v1/appointments/available-slots?staff_id={}&service_id={}&date={}",
        salon.staff_id, salon.service_id, SUNDAY
    );
    let slots = json_body(send(&salon, Method::GET, &slots_uri, None, None).await).await;
    assert_eq!(slots.as_array().unwrap().len(), 7);

    let invalid = json!({"hours": [{"day_of_week": 9, "start_time": "10:00", "end_time": "14:00"}]});
    let response = send(&salon, Method::PUT, &uri, Some(&owner), Some(invalid)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let defaults = format!("/api/v1/staff/{}/working-hours/defaults", salon.staff_id);
    let response = send(&salon, Method::POST, &defaults, Some(&owner), None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 7);
}
