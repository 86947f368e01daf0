//! # rollcall
//!
//! 위치 기반 출석 체크 백엔드입니다.
//!
//! 교사가 수업의 출석 세션을 열면 짧은 토큰이 발급되고, 학생은 그 토큰과
//! 현재 위치를 제출합니다. 서버는 세션 상태, 신원, 수강 등록, 중복 여부,
//! 교실과의 거리를 차례로 검사한 뒤 출석 기록을 남깁니다.
//!
//! 계층 구조:
//! - `routes`: HTTP 핸들러 (axum)
//! - `services`: 세션 저장소, 등록 게이트, 출석 검증, 통계
//! - `db`: SQLite 쿼리 (sqlx)
//! - `models`: 데이터 구조체

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
