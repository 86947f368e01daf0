//! # 출석 세션 모델 정의
//!
//! 출석 세션은 한 수업의 한 번의 출석 창(window)입니다.
//! 교사가 세션을 시작하면 무작위 토큰이 발급되고, 학생은 이 토큰이 담긴
//! 체크인 코드를 스캔해 출석합니다.
//!
//! ## 세션 상태
//! ```text
//! is_expired = now > expires_at
//! is_valid   = is_active && !is_expired
//! ```
//!
//! ## 세션 흐름
//! 1. `create_for_class()`: 같은 수업의 기존 활성 세션을 모두 비활성화하고 새로 생성
//! 2. `extend()`: 유효한 동안에만 만료 시각 연장
//! 3. `deactivate()`: 명시적 종료 (멱등)
//! 4. `cleanup_expired()`: 만료됐지만 아직 활성 표시가 남은 세션 정리

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ClassLocation;

/// 출석 세션 엔티티: DB의 `attendance_sessions` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceSession {
    /// 세션 고유 식별자 (UUIDv7)
    pub id: String,
    /// 이 세션이 속한 수업의 ID
    pub class_id: String,
    /// 체크인 코드에 담기는 불투명 토큰 (32자리 hex)
    pub session_token: String,
    /// 만료 시각. 생성 시점에는 항상 미래입니다.
    pub expires_at: DateTime<Utc>,
    /// 비활성화(명시적 종료, 대체, 정리)되면 false
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AttendanceSession {
    /// `now`가 만료 시각을 지났는지 확인합니다.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// 활성 상태이면서 만료되지 않았는지 확인합니다.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }
}

/// 세션 생성 요청: `POST /api/v1/classes/{id}/sessions`
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// 유효 시간 (분). 없으면 설정의 기본값을 사용합니다.
    pub duration_minutes: Option<i64>,
}

/// 세션 연장 요청: `POST /api/v1/sessions/{id}/extend`
#[derive(Debug, Deserialize)]
pub struct ExtendSessionRequest {
    pub minutes: i64,
}

/// 체크인 코드에 인코딩되는 공유 데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareableData {
    pub session_token: String,
    pub class_id: String,
    pub class_name: String,
    pub location: ClassLocation,
    pub expires_at: DateTime<Utc>,
}
