//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스 계층(services/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `classes`: 수업 조회 (교실 위치)
//! - `enrollments`: 수강 등록 쿼리
//! - `records`: 출석 기록 쿼리와 집계
//! - `sessions`: 출석 세션 쿼리
//! - `users`: 신원 조회
//!
//! ## 시각 저장 형식
//! 모든 시각은 `YYYY-MM-DDTHH:MM:SS.sssZ` 고정 길이 UTC 문자열로 저장합니다.
//! SQLite의 `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`와 같은 형식이라
//! SQL에서 문자열 비교만으로 시간 순서를 비교할 수 있습니다.
//! 네 자리 연도만 표현하므로 0000년부터 9999년까지의 시각만 저장할 수 있습니다.
//! 세션 만료 시각은 `MAX_SESSION_MINUTES`로 제한되어 이 범위를 벗어나지 않습니다.

pub mod classes;
pub mod enrollments;
pub mod records;
pub mod sessions;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::AppError;

/// `./migrations` 폴더의 SQL 파일들을 컴파일 타임에 포함합니다.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite 연결 풀을 만듭니다.
///
/// - WAL 모드: 읽기와 쓰기가 서로를 막지 않습니다.
/// - busy_timeout: 다른 연결이 쓰기 잠금을 잡고 있으면 최대 5초 기다립니다.
/// - foreign_keys: 외래키 제약을 켭니다 (SQLite 기본값은 꺼짐).
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
}

/// chrono 시각을 DB 저장 형식으로 변환합니다.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// 에러가 특정 컬럼의 UNIQUE 제약 위반인지 확인합니다.
///
/// SQLite는 `UNIQUE constraint failed: table.column` 형태의 메시지를 돌려주므로
/// 어느 제약이 깨졌는지는 메시지의 컬럼 이름으로 구분합니다.
pub fn is_unique_violation(err: &AppError, column: &str) -> bool {
    match err {
        AppError::Database(sqlx::Error::Database(db_err)) => {
            db_err.is_unique_violation() && db_err.message().contains(column)
        }
        _ => false,
    }
}
