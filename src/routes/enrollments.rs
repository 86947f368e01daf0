//! # 수강 등록 API 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 |
//! |--------|------|--------|
//! | POST | /api/v1/classes/{id}/enrollments | `enroll` |
//! | GET | /api/v1/classes/{id}/enrollments | `list_enrollments` |
//! | GET | /api/v1/classes/{id}/enrollments/count | `count_class_enrollments` |
//! | DELETE | /api/v1/classes/{id}/enrollments/{student_id} | `deactivate_enrollment` |
//! | POST | /api/v1/classes/{id}/enrollments/{student_id}/reactivate | `reactivate_enrollment` |
//! | GET | /api/v1/enrollments/check | `check_enrollment` |
//! | GET | /api/v1/students/{id}/enrollments/count | `count_student_enrollments` |

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::{ensure_can_manage_class, AppState},
};

/// 학생 본인이 아니면 수업 관리 권한이 있어야 합니다.
async fn ensure_self_or_manager(
    state: &AppState,
    auth: &AuthUser,
    class_id: &str,
    student_id: &str,
) -> Result<(), AppError> {
    if auth.user_id == student_id && auth.role.can_mark_attendance() {
        return Ok(());
    }
    ensure_can_manage_class(state, auth, class_id).await?;
    Ok(())
}

/// `POST /api/v1/classes/{id}/enrollments` + `{ "student_id": "..." }`
///
/// 학생은 `student_id` 없이 자기 자신을 등록하고,
/// 교사/관리자는 `student_id`로 다른 학생을 등록합니다.
pub async fn enroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<String>,
    Json(req): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let student_id = req.student_id.unwrap_or_else(|| auth.user_id.clone());
    ensure_self_or_manager(&state, &auth, &class_id, &student_id).await?;

    let enrollment = state.enrollments.enroll(&student_id, &class_id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// `GET /api/v1/classes/{id}/enrollments` → `{ "enrollments": [...] }`
pub async fn list_enrollments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage_class(&state, &auth, &class_id).await?;

    let enrollments = state.enrollments.list_for_class(&class_id).await?;
    Ok(Json(json!({ "enrollments": enrollments })))
}

/// `GET /api/v1/classes/{id}/enrollments/count?include_inactive=true`
pub async fn count_class_enrollments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(class_id): Path<String>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_can_manage_class(&state, &auth, &class_id).await?;

    let count = state
        .enrollments
        .count_for_class(&class_id, query.include_inactive)
        .await?;
    Ok(Json(json!({ "class_id": class_id, "count": count })))
}

/// `DELETE /api/v1/classes/{id}/enrollments/{student_id}`: 등록 비활성화
pub async fn deactivate_enrollment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((class_id, student_id)): Path<(String, String)>,
) -> Result<Json<Enrollment>, AppError> {
    ensure_self_or_manager(&state, &auth, &class_id, &student_id).await?;

    let enrollment = state.enrollments.deactivate(&student_id, &class_id).await?;
    Ok(Json(enrollment))
}

/// `POST /api/v1/classes/{id}/enrollments/{student_id}/reactivate`
pub async fn reactivate_enrollment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((class_id, student_id)): Path<(String, String)>,
) -> Result<Json<Enrollment>, AppError> {
    ensure_can_manage_class(&state, &auth, &class_id).await?;

    let enrollment = state.enrollments.reactivate(&student_id, &class_id).await?;
    Ok(Json(enrollment))
}

/// `GET /api/v1/enrollments/check?student_id=...&class_id=...` → `{ "enrolled": true }`
pub async fn check_enrollment(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<EnrollmentCheckQuery>,
) -> Result<Json<Value>, AppError> {
    if !auth.is_self_or_staff(&query.student_id) {
        return Err(AppError::Forbidden(
            "cannot inspect another student's enrollment".to_string(),
        ));
    }

    let enrolled = state
        .enrollments
        .is_enrolled(&query.student_id, &query.class_id)
        .await?;
    Ok(Json(json!({ "enrolled": enrolled })))
}

/// `GET /api/v1/students/{id}/enrollments/count?include_inactive=true`
pub async fn count_student_enrollments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<String>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Value>, AppError> {
    if !auth.is_self_or_staff(&student_id) {
        return Err(AppError::Forbidden(
            "cannot inspect another student's enrollments".to_string(),
        ));
    }

    let count = state
        .enrollments
        .count_for_student(&student_id, query.include_inactive)
        .await?;
    Ok(Json(json!({ "student_id": student_id, "count": count })))
}
