//! # 출석 세션 API 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/v1/classes/{id}/sessions | `create_session` | 새 세션 시작 (기존 세션 대체) |
//! | GET | /api/v1/classes/{id}/sessions | `list_class_sessions` | 수업의 세션 이력 |
//! | GET | /api/v1/classes/{id}/sessions/active | `active_class_session` | 현재 유효한 세션 |
//! | GET | /api/v1/sessions/{id}/share | `share_session` | 체크인 코드 데이터 |
//! | POST | /api/v1/sessions/{id}/extend | `extend_session` | 만료 시각 연장 |
//! | POST | /api/v1/sessions/{id}/deactivate | `deactivate_session` | 세션 종료 |
//!
//! 세션 관리는 담당 교사와 관리자만 할 수 있습니다.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::{ensure_can_manage_class, ensure_can_manage_session, AppState},
};

/// 새 출석 세션을 시작합니다.
///
/// `POST /api/v1/classes/{id}/sessions` + `{ "duration_minutes": 15 }`
///
/// `duration_minutes`가 없으면 설정의 기본값(`DEFAULT_SESSION_MINUTES`)을 사용합니다.
pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<String>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<AttendanceSession>), AppError> {
    ensure_can_manage_class(&state, &auth, &class_id).await?;

    let minutes = req
        .duration_minutes
        .unwrap_or(state.default_session_minutes);
    let session = state.sessions.create_for_class(&class_id, minutes).await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// `GET /api/v1/classes/{id}/sessions` → `{ "sessions": [...] }` (최신순)
pub async fn list_class_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage_class(&state, &auth, &class_id).await?;

    let sessions = state.sessions.list_for_class(&class_id).await?;
    Ok(Json(json!({ "sessions": sessions })))
}

/// `GET /api/v1/classes/{id}/sessions/active`
///
/// 유효한 세션이 없으면 404를 반환합니다.
pub async fn active_class_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<String>,
) -> Result<Json<AttendanceSession>, AppError> {
    ensure_can_manage_class(&state, &auth, &class_id).await?;

    let session = state
        .sessions
        .find_active_for_class(&class_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(session))
}

/// `GET /api/v1/sessions/{id}/share`: 체크인 코드에 인코딩할 데이터
pub async fn share_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ShareableData>, AppError> {
    ensure_can_manage_session(&state, &auth, &id).await?;

    let data = state.sessions.get_shareable_data(&SessionRef::Id(id)).await?;
    Ok(Json(data))
}

/// `POST /api/v1/sessions/{id}/extend` + `{ "minutes": 10 }`
pub async fn extend_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ExtendSessionRequest>,
) -> Result<Json<AttendanceSession>, AppError> {
    ensure_can_manage_session(&state, &auth, &id).await?;

    let session = state.sessions.extend(&id, req.minutes).await?;
    Ok(Json(session))
}

/// `POST /api/v1/sessions/{id}/deactivate`: 여러 번 호출해도 결과가 같습니다.
pub async fn deactivate_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AttendanceSession>, AppError> {
    ensure_can_manage_session(&state, &auth, &id).await?;

    let session = state.sessions.deactivate(&id).await?;
    Ok(Json(session))
}
