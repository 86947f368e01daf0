//! # 에러 처리 모듈
//!
//! 출석 서버에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 에러는 크게 세 부류로 나뉩니다:
//! - **검증 에러**: 출석 파이프라인이 제출을 거절한 이유 (만료, 미등록, 범위 밖 등).
//!   재시도해도 결과가 같으므로 호출자가 자동 재시도하면 안 됩니다.
//! - **요청 에러**: 잘못된 입력, 인증/권한 실패, 존재하지 않는 리소스.
//! - **인프라 에러**: 저장소 연결 실패나 시간 초과. 재시도 가능합니다.
//!   단, 제약 조건 위반(UNIQUE, 외래 키, NOT NULL, CHECK)은 같은 쓰기를 다시 해도
//!   똑같이 실패하므로 재시도 불가로 분류합니다.
//!
//! `kind()`는 호출자가 메시지 문자열을 파싱하지 않고도
//! 결과를 구분할 수 있도록 안정적인 코드 문자열을 돌려줍니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 위도/경도 범위를 벗어난 좌표 (HTTP 400)
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// 인증 실패 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 역할(role)에 필요한 권한이 없음 (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Class not found")]
    ClassNotFound,

    // ── 출석 제출 파이프라인 에러 (검사 순서대로) ──
    /// 토큰/ID로 세션을 찾을 수 없음. 다시 스캔해야 합니다.
    #[error("Attendance session not found")]
    SessionNotFound,

    /// 세션이 비활성화됨 (명시적 종료 또는 새 세션으로 대체)
    #[error("Attendance session is not active")]
    SessionInactive,

    /// 세션 만료 시각이 지남
    #[error("Attendance session has expired")]
    SessionExpired,

    #[error("Student not found, please sign in again")]
    StudentNotFound,

    #[error("Student account is inactive, please sign in again")]
    InactiveStudent,

    #[error("Student is not enrolled in this class, enroll or contact the instructor")]
    NotEnrolled,

    /// 이미 출석한 학생. 사용자 입장에서는 성공과 같은 의미입니다.
    #[error("Student has already marked attendance for this session")]
    DuplicateAttendance,

    /// 지오펜스 위반. 계산된 거리를 함께 전달합니다.
    #[error("Student is {distance:.1}m from the classroom (limit {max_distance:.1}m)")]
    OutOfRange { distance: f64, max_distance: f64 },

    // ── 세션 관리 에러 ──
    /// 이미 유효하지 않은 세션을 연장하려 함
    #[error("Cannot extend a session that is no longer valid")]
    ExpiredSession,

    /// 유효하지 않은 세션의 체크인 코드를 요청함
    #[error("Session is not in a shareable state")]
    InvalidSessionState,

    #[error("Student is already enrolled in this class")]
    AlreadyEnrolled,

    // ── 인프라 에러 ──
    /// 저장소 작업이 제한 시간 내에 끝나지 않음 (재시도 가능)
    #[error("Storage operation timed out")]
    Timeout,

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류
    /// #[from]: sqlx::Error → AppError::Database 자동 변환
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// 에러 종류를 나타내는 안정적인 코드 문자열
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::InvalidLocation(_) => "invalid_location",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::ClassNotFound => "class_not_found",
            AppError::SessionNotFound => "session_not_found",
            AppError::SessionInactive => "session_inactive",
            AppError::SessionExpired => "session_expired",
            AppError::StudentNotFound => "student_not_found",
            AppError::InactiveStudent => "inactive_student",
            AppError::NotEnrolled => "not_enrolled",
            AppError::DuplicateAttendance => "duplicate_attendance",
            AppError::OutOfRange { .. } => "out_of_range",
            AppError::ExpiredSession => "expired_session",
            AppError::InvalidSessionState => "invalid_session_state",
            AppError::AlreadyEnrolled => "already_enrolled",
            AppError::Timeout => "timeout",
            AppError::Internal(_) => "internal_error",
            AppError::Database(_) if self.is_constraint_violation() => "constraint_violation",
            AppError::Database(_) => "database_error",
        }
    }

    /// 인프라 에러(저장소 장애, 시간 초과)인지 여부.
    /// 이 경우에만 호출자가 재시도할 수 있습니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Timeout => true,
            AppError::Database(_) => !self.is_constraint_violation(),
            _ => false,
        }
    }

    /// 저장소가 제약 조건 위반으로 쓰기를 거절했는지 여부
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => matches!(
                db_err.kind(),
                ErrorKind::UniqueViolation
                    | ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
            ),
            _ => false,
        }
    }

    /// 출석 제출 파이프라인이 만드는 검증 에러인지 여부
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::SessionNotFound
                | AppError::SessionInactive
                | AppError::SessionExpired
                | AppError::StudentNotFound
                | AppError::InactiveStudent
                | AppError::NotEnrolled
                | AppError::DuplicateAttendance
                | AppError::OutOfRange { .. }
        )
    }

    /// 지오펜스 위반일 때 계산된 거리
    pub fn distance(&self) -> Option<f64> {
        match self {
            AppError::OutOfRange { distance, .. } => Some(*distance),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound
            | AppError::ClassNotFound
            | AppError::SessionNotFound
            | AppError::StudentNotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::InvalidLocation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::InactiveStudent | AppError::NotEnrolled => {
                StatusCode::FORBIDDEN
            }
            AppError::SessionInactive | AppError::SessionExpired => StatusCode::GONE,
            AppError::DuplicateAttendance
            | AppError::ExpiredSession
            | AppError::InvalidSessionState
            | AppError::AlreadyEnrolled => StatusCode::CONFLICT,
            AppError::OutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) if self.is_constraint_violation() => StatusCode::CONFLICT,
            AppError::Timeout | AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 클라이언트에게 보여줄 메시지.
    /// 내부 에러는 실제 내용을 로그에만 남기고 일반적인 메시지로 바꿉니다.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) if self.is_constraint_violation() => {
                tracing::warn!("Constraint violation: {}", e);
                "The request conflicts with existing attendance data".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "The attendance store is temporarily unavailable".to_string()
            }
            AppError::Timeout => {
                tracing::warn!("Storage operation timed out");
                self.to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.public_message();

        // 결과: { "error": { "code": "...", "message": "...", "retryable": false } }
        let mut error = json!({
            "code": self.kind(),
            "message": message,
            "retryable": self.is_retryable(),
        });
        if let Some(distance) = self.distance() {
            error["distance"] = json!(distance);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
