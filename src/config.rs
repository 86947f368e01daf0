//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: 외부 인증 서버와 공유하는 JWT 검증 키 (필수)
//! - `HOST`, `PORT`: 서버 바인딩 주소
//! - `DEFAULT_SESSION_MINUTES`: 출석 세션 기본 유효 시간 (분)
//! - `MAX_DISTANCE_METERS`: 교실과 학생 위치 사이 허용 거리 상한
//! - `CLEANUP_INTERVAL_SECS`: 만료 세션 정리 주기
//! - `STORE_TIMEOUT_MS`: 저장소 작업 제한 시간
//! - `DB_MAX_CONNECTIONS`: 연결 풀 크기

use std::env;
use std::time::Duration;

use crate::services::attendance::DEFAULT_MAX_DISTANCE_METERS;
use crate::services::sessions::DEFAULT_SESSION_MINUTES;
use crate::services::DEFAULT_STORE_TIMEOUT;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 경로 (예: "sqlite:data/rollcall.db")
    pub database_url: String,
    /// 외부 인증 서버가 서명한 JWT를 검증하는 비밀키
    pub jwt_secret: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 세션 생성 시 기간을 지정하지 않으면 사용할 값 (기본값: 30분)
    pub default_session_minutes: i64,
    /// 지오펜스 반경 상한 (기본값: 50m)
    pub max_distance_meters: f64,
    /// 만료 세션 정리 주기 (기본값: 60초)
    pub cleanup_interval_secs: u64,
    /// 저장소 작업 제한 시간 (기본값: 5000ms)
    pub store_timeout_ms: u64,
    /// 연결 풀 최대 연결 수 (기본값: 5)
    pub db_max_connections: u32,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없거나 파싱에 실패해도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000),
            default_session_minutes: parse_or("DEFAULT_SESSION_MINUTES", DEFAULT_SESSION_MINUTES),
            max_distance_meters: parse_or("MAX_DISTANCE_METERS", DEFAULT_MAX_DISTANCE_METERS),
            cleanup_interval_secs: parse_or("CLEANUP_INTERVAL_SECS", 60),
            store_timeout_ms: parse_or("STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT.as_millis() as u64),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5),
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

/// 환경변수를 읽어 원하는 타입으로 파싱합니다.
/// 값이 없거나 파싱에 실패하면 기본값을 사용합니다.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
