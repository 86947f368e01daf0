//! HTTP API 통합 테스트
//!
//! 서버를 띄우지 않고 `Router`를 `tower::ServiceExt::oneshot`으로 직접 호출합니다.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use rollcall::routes::{self, AppState};

use common::{setup, TestEnv, JWT_SECRET};

fn app(env: &TestEnv) -> Router {
    let state = AppState::with_capabilities(
        env.pool.clone(),
        &env.config(),
        env.clock.clone(),
        env.tokens.clone(),
    );
    routes::router(state)
}

fn bearer(user_id: &str, role: &str) -> String {
    let now = Utc::now();
    let claims = json!({
        "sub": user_id,
        "role": role,
        "iat": now.timestamp(),
        "exp": (now + Duration::minutes(15)).timestamp(),
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// 교사가 세션을 열고 학생 0이 등록된 상태를 만듭니다. 세션 토큰을 반환합니다.
async fn open_class(env: &TestEnv, app: &Router) -> (String, String) {
    let teacher = bearer(&env.teacher.id, "teacher");
    let student = bearer(env.student(0), "student");

    let (status, _) = call(
        app,
        Method::POST,
        &format!("/api/v1/classes/{}/enrollments", env.class.id),
        Some(&student),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, session) = call(
        app,
        Method::POST,
        &format!("/api/v1/classes/{}/sessions", env.class.id),
        Some(&teacher),
        Some(json!({ "duration_minutes": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (
        session["id"].as_str().unwrap().to_string(),
        session["session_token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_check_reports_database() {
    let env = setup().await;
    let app = app(&env);

    let (status, body) = call(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let env = setup().await;
    let app = app(&env);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/attendance",
        None,
        Some(json!({ "session_token": "x", "location": { "latitude": 0.0, "longitude": 0.0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "missing_token");
}

#[tokio::test]
async fn full_check_in_flow() {
    let env = setup().await;
    let app = app(&env);
    let (session_id, token) = open_class(&env, &app).await;
    let student = bearer(env.student(0), "student");
    let teacher = bearer(&env.teacher.id, "teacher");

    let (status, share) = call(
        &app,
        Method::GET,
        &format!("/api/v1/sessions/{}/share", session_id),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(share["session_token"], token.as_str());
    assert_eq!(share["class_name"], "Distributed Systems");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/attendance",
        Some(&student),
        Some(json!({
            "session_token": token,
            "location": { "lat": 40.7129, "lng": -74.0061 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["distance"].as_f64().unwrap() < 50.0);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/attendance",
        Some(&student),
        Some(json!({
            "session_token": token,
            "location": { "latitude": 40.7129, "longitude": -74.0061 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "duplicate_attendance");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/sessions/{}/attendance", session_id),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/classes/{}/attendance-rate", env.class.id),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], 1);
    assert_eq!(body["enrolled"], 1);
}

#[tokio::test]
async fn out_of_range_reports_distance() {
    let env = setup().await;
    let app = app(&env);
    let (_, token) = open_class(&env, &app).await;
    let student = bearer(env.student(0), "student");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/attendance",
        Some(&student),
        Some(json!({
            "session_token": token,
            "location": { "latitude": 34.0522, "longitude": -118.2437 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "out_of_range");
    assert!(body["distance"].as_f64().unwrap() > 3_900_000.0);
}

#[tokio::test]
async fn client_radius_cannot_widen_the_geofence() {
    let env = setup().await;
    let app = app(&env);
    let (_, token) = open_class(&env, &app).await;
    let student = bearer(env.student(0), "student");

    // 교실에서 약 110m
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/attendance",
        Some(&student),
        Some(json!({
            "session_token": token,
            "location": { "latitude": 40.7138, "longitude": -74.0060 },
            "max_distance_meters": 10000.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_kind"], "out_of_range");
}

#[tokio::test]
async fn expired_session_is_gone() {
    let env = setup().await;
    let app = app(&env);
    let (_, token) = open_class(&env, &app).await;
    let student = bearer(env.student(0), "student");

    env.clock.advance(Duration::minutes(11));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/attendance",
        Some(&student),
        Some(json!({
            "session_token": token,
            "location": { "latitude": 40.7128, "longitude": -74.0060 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error_kind"], "session_expired");
}

#[tokio::test]
async fn students_cannot_manage_sessions() {
    let env = setup().await;
    let app = app(&env);
    let student = bearer(env.student(0), "student");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/classes/{}/sessions", env.class.id),
        Some(&student),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");
}

#[tokio::test]
async fn teachers_only_manage_their_own_classes() {
    let env = setup().await;
    let app = app(&env);
    let stranger = env.user("Han", rollcall::models::Role::Teacher).await;
    let stranger = bearer(&stranger.id, "teacher");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/classes/{}/sessions", env.class.id),
        Some(&stranger),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = bearer("admin-1", "admin");
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/classes/{}/sessions", env.class.id),
        Some(&admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn extend_and_deactivate_session() {
    let env = setup().await;
    let app = app(&env);
    let (session_id, _) = open_class(&env, &app).await;
    let teacher = bearer(&env.teacher.id, "teacher");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/extend", session_id),
        Some(&teacher),
        Some(json!({ "minutes": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/deactivate", session_id),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/extend", session_id),
        Some(&teacher),
        Some(json!({ "minutes": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "expired_session");

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/v1/classes/{}/sessions/active", env.class.id),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_session_lengths_are_bad_requests() {
    let env = setup().await;
    let app = app(&env);
    let teacher = bearer(&env.teacher.id, "teacher");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/classes/{}/sessions", env.class.id),
        Some(&teacher),
        Some(json!({ "duration_minutes": i64::MAX / 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(body["error"]["retryable"], false);

    let (session_id, _) = open_class(&env, &app).await;
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/extend", session_id),
        Some(&teacher),
        Some(json!({ "minutes": 10_000_000_000i64 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/classes/{}/sessions/active", env.class.id),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], session_id.as_str());
}

#[tokio::test]
async fn enrollment_endpoints() {
    let env = setup().await;
    let app = app(&env);
    let teacher = bearer(&env.teacher.id, "teacher");
    let student = bearer(env.student(1), "student");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/classes/{}/enrollments", env.class.id),
        Some(&teacher),
        Some(json!({ "student_id": env.student(1) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/classes/{}/enrollments", env.class.id),
        Some(&student),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "already_enrolled");

    // 학생은 다른 학생을 등록할 수 없습니다.
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/classes/{}/enrollments", env.class.id),
        Some(&student),
        Some(json!({ "student_id": env.student(2) })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!(
            "/api/v1/enrollments/check?student_id={}&class_id={}",
            env.student(1),
            env.class.id
        ),
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrolled"], true);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/v1/classes/{}/enrollments/{}", env.class.id, env.student(1)),
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/classes/{}/enrollments/count", env.class.id),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!(
            "/api/v1/classes/{}/enrollments/count?include_inactive=true",
            env.class.id
        ),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!(
            "/api/v1/classes/{}/enrollments/{}/reactivate",
            env.class.id,
            env.student(1)
        ),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn students_only_see_their_own_history() {
    let env = setup().await;
    let app = app(&env);
    let own = bearer(env.student(0), "student");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/students/{}/attendance", env.student(0)),
        Some(&own),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["records"].as_array().unwrap().is_empty());

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/v1/students/{}/attendance", env.student(1)),
        Some(&own),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/v1/classes/{}/stats", env.class.id),
        Some(&own),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn inverted_date_range_is_a_bad_request() {
    let env = setup().await;
    let app = app(&env);
    let teacher = bearer(&env.teacher.id, "teacher");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!(
            "/api/v1/classes/{}/attendance?start=2026-10-02T00:00:00Z&end=2026-10-01T00:00:00Z",
            env.class.id
        ),
        Some(&teacher),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}
