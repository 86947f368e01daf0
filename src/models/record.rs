//! # 출석 기록 모델 정의
//!
//! 출석 기록은 검증 파이프라인을 통과한 제출 한 건입니다.
//! 생성된 후에는 수정되지 않으며, `(session_id, student_id)` 쌍은 유일합니다.
//!
//! ## 구조체 역할
//! - `AttendanceRecord`: `attendance_records` 테이블 한 행
//! - `GeoPoint`: 학생이 제출한 좌표
//! - `SubmitAttendanceRequest`: `POST /api/v1/attendance` 요청 본문
//! - `SubmissionResult`: 제출 결과 (성공/실패 종류/거리)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 위도/경도 좌표
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GeoPoint {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng")]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// 좌표가 유효 범위 안에 있는지 검사합니다.
    /// 거리 계산 함수는 입력을 다시 검사하지 않으므로 호출하는 쪽에서 확인해야 합니다.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AppError::InvalidLocation(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::InvalidLocation(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// 출석 기록 엔티티: DB의 `attendance_records` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: String,
    pub session_id: String,
    pub student_id: String,
    /// 제출 당시 학생 위치
    #[sqlx(flatten)]
    pub student_location: GeoPoint,
    pub marked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// 제출 대상 세션을 가리키는 방법
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRef {
    /// 체크인 코드에서 읽은 토큰
    Token(String),
    /// 세션 ID
    Id(String),
}

/// 출석 제출 입력
#[derive(Debug, Clone)]
pub struct AttendanceSubmission {
    pub session: SessionRef,
    pub student_id: String,
    pub location: GeoPoint,
    /// 없으면 `DEFAULT_MAX_DISTANCE_METERS`
    pub max_distance_meters: Option<f64>,
}

/// `POST /api/v1/attendance` 요청 본문.
/// 학생 ID는 인증 토큰에서 가져옵니다.
#[derive(Debug, Deserialize)]
pub struct SubmitAttendanceRequest {
    pub session_token: Option<String>,
    pub session_id: Option<String>,
    pub location: GeoPoint,
    pub max_distance_meters: Option<f64>,
}

impl SubmitAttendanceRequest {
    /// 토큰이 있으면 토큰을, 없으면 세션 ID를 사용합니다.
    pub fn session_ref(&self) -> Result<SessionRef, AppError> {
        match (&self.session_token, &self.session_id) {
            (Some(token), _) if !token.is_empty() => Ok(SessionRef::Token(token.clone())),
            (_, Some(id)) if !id.is_empty() => Ok(SessionRef::Id(id.clone())),
            _ => Err(AppError::BadRequest(
                "session_token or session_id is required".to_string(),
            )),
        }
    }
}

/// 파이프라인을 통과해 저장된 출석과 계산된 거리
#[derive(Debug, Clone, Serialize)]
pub struct MarkedAttendance {
    pub record: AttendanceRecord,
    pub distance: f64,
}

/// 제출 결과. 실패한 경우 안정적인 에러 종류 코드를 담습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AttendanceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<MarkedAttendance> for SubmissionResult {
    fn from(marked: MarkedAttendance) -> Self {
        Self {
            success: true,
            record: Some(marked.record),
            distance: Some(marked.distance),
            error_kind: None,
            message: None,
        }
    }
}

impl From<&AppError> for SubmissionResult {
    fn from(err: &AppError) -> Self {
        Self {
            success: false,
            record: None,
            distance: err.distance(),
            error_kind: Some(err.kind().to_string()),
            message: Some(err.to_string()),
        }
    }
}
