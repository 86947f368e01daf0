//! # 출석 세션 저장소 (SessionStore)
//!
//! 출석 세션의 생성, 토큰 발급, 만료 계산, 연장/비활성화, 정리를 담당합니다.
//!
//! ## 수업당 활성 세션 하나
//! `create_for_class()`는 하나의 트랜잭션 안에서
//! "기존 활성 세션 비활성화 → 새 세션 삽입"을 수행합니다.
//! 같은 수업에 동시에 세션을 만들어도 SQLite 쓰기 잠금 때문에 트랜잭션이
//! 하나씩 실행되고, 부분 UNIQUE 인덱스가 두 번째 활성 세션을 거부합니다.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;

use super::clock::Clock;
use super::token::TokenSource;
use super::{bounded, DEFAULT_STORE_TIMEOUT};
use crate::db;
use crate::error::AppError;
use crate::models::{AttendanceSession, SessionRef, ShareableData};

/// 기본 세션 유효 시간 (분)
pub const DEFAULT_SESSION_MINUTES: i64 = 30;

/// 세션 유효 시간 상한 (분). 연장 후 만료 시각도 지금부터 이 시간을 넘을 수 없습니다.
pub const MAX_SESSION_MINUTES: i64 = 24 * 60;

/// 토큰 충돌 시 재시도 횟수
const MAX_TOKEN_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenSource>,
    timeout: StdDuration,
}

impl SessionStore {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            pool,
            clock,
            tokens,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// 저장소 작업 제한 시간을 바꿉니다.
    pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 수업에 새 출석 세션을 시작합니다. 기존 활성 세션은 비활성화됩니다.
    ///
    /// `duration_minutes`는 1 이상 `MAX_SESSION_MINUTES` 이하여야 합니다.
    pub async fn create_for_class(
        &self,
        class_id: &str,
        duration_minutes: i64,
    ) -> Result<AttendanceSession, AppError> {
        if duration_minutes <= 0 || duration_minutes > MAX_SESSION_MINUTES {
            return Err(AppError::BadRequest(format!(
                "duration_minutes must be between 1 and {}",
                MAX_SESSION_MINUTES
            )));
        }
        let ttl = Duration::try_minutes(duration_minutes).ok_or_else(|| {
            AppError::BadRequest("duration_minutes is out of range".to_string())
        })?;
        self.create_with_ttl(class_id, ttl).await
    }

    /// 유효 시간을 직접 지정해 세션을 시작합니다. 1초 이상, `MAX_SESSION_MINUTES`분 이하입니다.
    pub async fn create_with_ttl(
        &self,
        class_id: &str,
        ttl: Duration,
    ) -> Result<AttendanceSession, AppError> {
        if ttl < Duration::seconds(1) {
            return Err(AppError::BadRequest(
                "session duration must be at least one second".to_string(),
            ));
        }
        if ttl > max_session_ttl() {
            return Err(AppError::BadRequest(format!(
                "session duration must not exceed {} minutes",
                MAX_SESSION_MINUTES
            )));
        }
        bounded(self.timeout, self.create_inner(class_id, ttl)).await
    }

    async fn create_inner(
        &self,
        class_id: &str,
        ttl: Duration,
    ) -> Result<AttendanceSession, AppError> {
        db::classes::find_by_id(&self.pool, class_id)
            .await?
            .ok_or(AppError::ClassNotFound)?;

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = self.tokens.generate()?;
            let id = uuid::Uuid::now_v7().to_string();
            let now = self.clock.now();
            let expires_at = now
                .checked_add_signed(ttl)
                .ok_or_else(|| AppError::BadRequest("session expiry is out of range".to_string()))?;

            let mut tx = self.pool.begin().await?;
            let superseded = db::sessions::deactivate_active_for_class(&mut *tx, class_id).await?;

            match db::sessions::insert_session(&mut *tx, &id, class_id, &token, expires_at, now).await
            {
                Ok(()) => {}
                Err(e) if db::is_unique_violation(&e, "session_token") => {
                    tx.rollback().await?;
                    tracing::warn!(class_id, attempt, "Session token collision, regenerating");
                    continue;
                }
                // tx가 drop되면서 자동으로 롤백됩니다.
                Err(e) => return Err(e),
            }
            tx.commit().await?;

            tracing::info!(
                class_id,
                session_id = %id,
                superseded,
                expires_at = %expires_at,
                "Attendance session created"
            );

            return db::sessions::get_session(&self.pool, &id)
                .await?
                .ok_or(AppError::Internal(
                    "Failed to retrieve created session".to_string(),
                ));
        }

        Err(AppError::Internal(
            "Could not generate a unique session token".to_string(),
        ))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<AttendanceSession>, AppError> {
        db::sessions::get_session(&self.pool, id).await
    }

    /// 상태와 관계없이 토큰으로 조회합니다.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<AttendanceSession>, AppError> {
        db::sessions::find_by_token(&self.pool, token).await
    }

    /// 지금 유효한 세션만 토큰으로 조회합니다.
    pub async fn find_valid_by_token(
        &self,
        token: &str,
    ) -> Result<Option<AttendanceSession>, AppError> {
        db::sessions::find_valid_by_token(&self.pool, token, self.clock.now()).await
    }

    /// 토큰 또는 ID로 세션을 찾습니다.
    pub async fn resolve(&self, session: &SessionRef) -> Result<Option<AttendanceSession>, AppError> {
        match session {
            SessionRef::Token(token) => self.find_by_token(token).await,
            SessionRef::Id(id) => self.find_by_id(id).await,
        }
    }

    /// 수업의 현재 유효한 세션
    pub async fn find_active_for_class(
        &self,
        class_id: &str,
    ) -> Result<Option<AttendanceSession>, AppError> {
        db::sessions::find_valid_for_class(&self.pool, class_id, self.clock.now()).await
    }

    pub async fn list_for_class(&self, class_id: &str) -> Result<Vec<AttendanceSession>, AppError> {
        db::sessions::list_for_class(&self.pool, class_id).await
    }

    /// 유효한 세션의 만료 시각을 `minutes`분 늘립니다.
    ///
    /// 연장 후 만료 시각은 지금부터 `MAX_SESSION_MINUTES`분을 넘을 수 없습니다.
    ///
    /// # 에러
    /// - `BadRequest`: `minutes`가 범위를 벗어나거나 상한을 넘김
    /// - `SessionNotFound`: 세션이 없음
    /// - `ExpiredSession`: 이미 만료됐거나 비활성화된 세션
    pub async fn extend(&self, session_id: &str, minutes: i64) -> Result<AttendanceSession, AppError> {
        if minutes <= 0 || minutes > MAX_SESSION_MINUTES {
            return Err(AppError::BadRequest(format!(
                "minutes must be between 1 and {}",
                MAX_SESSION_MINUTES
            )));
        }
        let extension = Duration::try_minutes(minutes)
            .ok_or_else(|| AppError::BadRequest("minutes is out of range".to_string()))?;

        let now = self.clock.now();
        let latest = now
            .checked_add_signed(max_session_ttl())
            .ok_or_else(|| AppError::BadRequest("session expiry is out of range".to_string()))?;

        let session = db::sessions::get_session(&self.pool, session_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;
        if !session.is_valid_at(now) {
            return Err(AppError::ExpiredSession);
        }

        let requested = session
            .expires_at
            .checked_add_signed(extension)
            .ok_or_else(|| AppError::BadRequest("session expiry is out of range".to_string()))?;
        if requested > latest {
            return Err(extension_limit_error());
        }

        // 상한 검사도 UPDATE 조건에 넣어 동시에 연장해도 넘지 않게 합니다.
        let ceiling = latest
            .checked_sub_signed(extension)
            .ok_or_else(|| AppError::BadRequest("session expiry is out of range".to_string()))?;
        let extended = db::sessions::extend_session(
            &self.pool,
            session_id,
            extension.num_seconds(),
            now,
            ceiling,
        )
        .await?;

        let session = db::sessions::get_session(&self.pool, session_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;
        if !extended {
            if session.is_valid_at(now) {
                return Err(extension_limit_error());
            }
            return Err(AppError::ExpiredSession);
        }

        tracing::info!(session_id, minutes, expires_at = %session.expires_at, "Attendance session extended");
        Ok(session)
    }

    /// 세션을 비활성화합니다. 이미 비활성이어도 성공합니다.
    pub async fn deactivate(&self, session_id: &str) -> Result<AttendanceSession, AppError> {
        if !db::sessions::deactivate_session(&self.pool, session_id).await? {
            return Err(AppError::SessionNotFound);
        }

        tracing::info!(session_id, "Attendance session deactivated");
        db::sessions::get_session(&self.pool, session_id)
            .await?
            .ok_or(AppError::SessionNotFound)
    }

    /// 만료됐지만 아직 활성인 세션을 비활성화하고 그 수를 반환합니다.
    pub async fn cleanup_expired(&self) -> Result<u64, AppError> {
        let closed = db::sessions::deactivate_expired(&self.pool, self.clock.now()).await?;
        if closed > 0 {
            tracing::info!(closed, "Deactivated expired attendance sessions");
        }
        Ok(closed)
    }

    /// 체크인 코드에 담을 데이터를 만듭니다. 유효한 세션만 공유할 수 있습니다.
    pub async fn get_shareable_data(&self, session: &SessionRef) -> Result<ShareableData, AppError> {
        let session = self.resolve(session).await?.ok_or(AppError::SessionNotFound)?;
        if !session.is_valid_at(self.clock.now()) {
            return Err(AppError::InvalidSessionState);
        }

        let class = db::classes::find_by_id(&self.pool, &session.class_id)
            .await?
            .ok_or(AppError::ClassNotFound)?;

        Ok(ShareableData {
            session_token: session.session_token,
            class_id: class.id,
            class_name: class.name,
            location: class.location,
            expires_at: session.expires_at,
        })
    }
}

fn max_session_ttl() -> Duration {
    Duration::minutes(MAX_SESSION_MINUTES)
}

fn extension_limit_error() -> AppError {
    AppError::BadRequest(format!(
        "a session cannot stay open more than {} minutes from now",
        MAX_SESSION_MINUTES
    ))
}

/// `period`마다 만료 세션을 정리하는 백그라운드 작업을 시작합니다.
/// 정리에 실패하면 로그만 남기고 다음 주기에 다시 시도합니다.
pub fn spawn_cleanup_task(store: SessionStore, period: StdDuration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = store.cleanup_expired().await {
                tracing::warn!(error = %e, "Expired session cleanup failed");
            }
        }
    })
}
