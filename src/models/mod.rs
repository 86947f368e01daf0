//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `class`: 수업과 교실 위치
//! - `enrollment`: 수강 등록
//! - `record`: 출석 기록과 제출 요청/결과
//! - `session`: 출석 세션
//! - `stats`: 통계 조회 결과
//! - `user`: 신원 정보와 역할

pub mod class;
pub mod enrollment;
pub mod record;
pub mod session;
pub mod stats;
pub mod user;

pub use class::*;
pub use enrollment::*;
pub use record::*;
pub use session::*;
pub use stats::*;
pub use user::*;
