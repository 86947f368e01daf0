//! # 출석 제출 핸들러
//!
//! `POST /api/v1/attendance`
//! + `{ "session_token": "...", "location": { "latitude": 40.7, "longitude": -74.0 } }`
//!
//! ## 응답
//! - 201 + `{ "success": true, "record": {...}, "distance": 12.3 }`
//! - 검증 실패: 종류별 상태 코드 + `{ "success": false, "error_kind": "...", "message": "..." }`
//! - 이미 출석한 경우: 200 + `error_kind = "duplicate_attendance"` (사용자가 할 일 없음)
//! - 저장소 장애/시간 초과: 503 에러 응답 (`retryable: true`)

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::AppState,
};

pub async fn submit_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SubmitAttendanceRequest>,
) -> Result<(StatusCode, Json<SubmissionResult>), AppError> {
    if !auth.role.can_mark_attendance() {
        return Err(AppError::Forbidden(
            "only students can mark attendance".to_string(),
        ));
    }

    // 요청의 반경은 서버 설정보다 좁힐 수만 있습니다.
    let max_distance_meters = req
        .max_distance_meters
        .map(|requested| requested.min(state.max_distance_meters))
        .unwrap_or(state.max_distance_meters);

    let submission = AttendanceSubmission {
        session: req.session_ref()?,
        student_id: auth.user_id,
        location: req.location,
        max_distance_meters: Some(max_distance_meters),
    };

    match state.attendance.submit(submission).await {
        Ok(marked) => Ok((StatusCode::CREATED, Json(marked.into()))),
        Err(AppError::DuplicateAttendance) => Ok((
            StatusCode::OK,
            Json(SubmissionResult::from(&AppError::DuplicateAttendance)),
        )),
        Err(e) if e.is_validation() => Ok((e.status_code(), Json(SubmissionResult::from(&e)))),
        Err(e) => Err(e),
    }
}
