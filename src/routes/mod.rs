//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들과 라우터 구성을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `attendance`: 출석 제출
//! - `enrollments`: 수강 등록과 조회
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `sessions`: 출석 세션 생성/공유/연장/종료
//! - `stats`: 출석 기록 조회와 통계

pub mod attendance;
pub mod enrollments;
pub mod health;
pub mod sessions;
pub mod stats;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::Class;
use crate::services::{
    AttendanceValidator, Clock, EnrollmentGate, OsTokenSource, SessionStore, StatsAggregator,
    SystemClock, TokenSource,
};

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 각 서비스는 내부적으로 `SqlitePool`(Arc)을 들고 있으므로 clone 비용이 작습니다.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sessions: SessionStore,
    pub enrollments: EnrollmentGate,
    pub attendance: AttendanceValidator,
    pub stats: StatsAggregator,
    /// JWT 검증 키
    pub jwt_secret: String,
    /// 세션 기간을 지정하지 않았을 때의 기본값 (분)
    pub default_session_minutes: i64,
    /// 지오펜스 반경 상한 (미터)
    pub max_distance_meters: f64,
}

impl AppState {
    /// 시스템 시계와 OS 난수 토큰 생성기로 상태를 만듭니다.
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self::with_capabilities(pool, config, Arc::new(SystemClock), Arc::new(OsTokenSource))
    }

    /// 시계와 토큰 생성기를 직접 주입합니다.
    pub fn with_capabilities(
        pool: SqlitePool,
        config: &Config,
        clock: Arc<dyn Clock>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        let timeout = config.store_timeout();
        let sessions = SessionStore::new(pool.clone(), clock.clone(), tokens).with_timeout(timeout);
        let enrollments = EnrollmentGate::new(pool.clone(), clock.clone());
        let attendance =
            AttendanceValidator::new(pool.clone(), clock, sessions.clone(), enrollments.clone())
                .with_timeout(timeout);

        Self {
            stats: StatsAggregator::new(pool.clone()),
            pool,
            sessions,
            enrollments,
            attendance,
            jwt_secret: config.jwt_secret.clone(),
            default_session_minutes: config.default_session_minutes,
            max_distance_meters: config.max_distance_meters,
        }
    }
}

/// `/api/v1` 아래에 모든 API 라우트를 구성합니다.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        // 출석 세션
        .route(
            "/classes/{id}/sessions",
            get(sessions::list_class_sessions).post(sessions::create_session),
        )
        .route("/classes/{id}/sessions/active", get(sessions::active_class_session))
        .route("/sessions/{id}/share", get(sessions::share_session))
        .route("/sessions/{id}/extend", post(sessions::extend_session))
        .route("/sessions/{id}/deactivate", post(sessions::deactivate_session))
        // 출석 제출
        .route("/attendance", post(attendance::submit_attendance))
        // 수강 등록
        .route(
            "/classes/{id}/enrollments",
            get(enrollments::list_enrollments).post(enrollments::enroll),
        )
        .route("/classes/{id}/enrollments/count", get(enrollments::count_class_enrollments))
        .route(
            "/classes/{id}/enrollments/{student_id}",
            delete(enrollments::deactivate_enrollment),
        )
        .route(
            "/classes/{id}/enrollments/{student_id}/reactivate",
            post(enrollments::reactivate_enrollment),
        )
        .route("/enrollments/check", get(enrollments::check_enrollment))
        .route(
            "/students/{id}/enrollments/count",
            get(enrollments::count_student_enrollments),
        )
        // 출석 기록과 통계
        .route("/students/{id}/attendance", get(stats::student_attendance))
        .route("/sessions/{id}/attendance", get(stats::session_attendance))
        .route("/classes/{id}/attendance", get(stats::class_attendance))
        .route("/classes/{id}/stats", get(stats::class_stats))
        .route("/classes/{id}/attendance-rate", get(stats::class_attendance_rate))
        // 헬스체크
        .route("/health", get(health::health_check))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// 수업을 관리할 수 있는지 확인합니다.
/// 관리자는 모든 수업을, 교사는 담당 수업만 관리할 수 있습니다.
pub(crate) async fn ensure_can_manage_class(
    state: &AppState,
    auth: &AuthUser,
    class_id: &str,
) -> Result<Class, AppError> {
    if !auth.role.can_manage_sessions() {
        return Err(AppError::Forbidden(
            "only teachers and admins can manage classes".to_string(),
        ));
    }

    let class = db::classes::find_by_id(&state.pool, class_id)
        .await?
        .ok_or(AppError::ClassNotFound)?;

    if !auth.role.is_admin() && class.teacher_id.as_deref() != Some(auth.user_id.as_str()) {
        return Err(AppError::Forbidden(
            "you do not teach this class".to_string(),
        ));
    }
    Ok(class)
}

/// 세션이 속한 수업을 관리할 수 있는지 확인합니다.
pub(crate) async fn ensure_can_manage_session(
    state: &AppState,
    auth: &AuthUser,
    session_id: &str,
) -> Result<(), AppError> {
    let session = state
        .sessions
        .find_by_id(session_id)
        .await?
        .ok_or(AppError::SessionNotFound)?;
    ensure_can_manage_class(state, auth, &session.class_id).await?;
    Ok(())
}
