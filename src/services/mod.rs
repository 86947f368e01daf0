//! # 서비스 계층
//!
//! 출석 코어의 비즈니스 로직입니다. 라우트 핸들러(routes/)가 이 계층을 호출하고,
//! 이 계층은 데이터베이스 접근 계층(db/)을 호출합니다.
//!
//! - `geo`: 하버사인 거리 계산
//! - `sessions`: 출석 세션 저장소 (SessionStore)
//! - `enrollment`: 수강 등록 게이트 (EnrollmentGate)
//! - `attendance`: 출석 제출 검증 파이프라인 (AttendanceValidator)
//! - `stats`: 읽기 전용 집계 (StatsAggregator)
//! - `clock`, `token`: 서비스에 주입하는 시계와 토큰 생성기

pub mod attendance;
pub mod clock;
pub mod enrollment;
pub mod geo;
pub mod sessions;
pub mod stats;
pub mod token;

pub use attendance::AttendanceValidator;
pub use clock::{Clock, SystemClock};
pub use enrollment::EnrollmentGate;
pub use sessions::SessionStore;
pub use stats::StatsAggregator;
pub use token::{OsTokenSource, TokenSource};

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// 저장소 작업 기본 제한 시간
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// 제한 시간 안에 끝나지 않은 작업을 재시도 가능한 `Timeout` 에러로 바꿉니다.
pub async fn bounded<T, F>(limit: Duration, work: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(limit, work)
        .await
        .map_err(|_| AppError::Timeout)?
}
