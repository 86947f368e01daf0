//! # 출석 기록/통계 API 라우트 핸들러
//!
//! 기간 필터는 쿼리 파라미터 `start`, `end` (RFC 3339, 예: `2026-10-01T00:00:00Z`)로
//! 전달하며 `[start, end)` 반열린 구간으로 적용됩니다.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::{ensure_can_manage_class, ensure_can_manage_session, AppState},
};

/// `GET /api/v1/students/{id}/attendance?start=&end=` → `{ "records": [...] }` (최신순)
pub async fn student_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<Value>, AppError> {
    if !auth.is_self_or_staff(&student_id) {
        return Err(AppError::Forbidden(
            "cannot view another student's attendance".to_string(),
        ));
    }

    let records = state.stats.by_student(&student_id, &range).await?;
    Ok(Json(json!({ "records": records })))
}

/// `GET /api/v1/sessions/{id}/attendance` → `{ "records": [...] }`
pub async fn session_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage_session(&state, &auth, &session_id).await?;

    let records = state.stats.by_session(&session_id).await?;
    Ok(Json(json!({ "records": records })))
}

/// `GET /api/v1/classes/{id}/attendance?start=&end=` → `{ "records": [...] }`
pub async fn class_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<String>,
    Query(range): Query<DateRange>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage_class(&state, &auth, &class_id).await?;

    let records = state.stats.by_class(&class_id, &range).await?;
    Ok(Json(json!({ "records": records })))
}

/// `GET /api/v1/classes/{id}/stats` → `{ "stats": [{ student_id, student_name, attendance_count }] }`
pub async fn class_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage_class(&state, &auth, &class_id).await?;

    let stats = state.stats.class_stats(&class_id).await?;
    Ok(Json(json!({ "stats": stats })))
}

/// `GET /api/v1/classes/{id}/attendance-rate`
pub async fn class_attendance_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<String>,
) -> Result<Json<AttendanceRate>, AppError> {
    ensure_can_manage_class(&state, &auth, &class_id).await?;

    let rate = state.stats.class_attendance_rate(&class_id).await?;
    Ok(Json(rate))
}
