//! 통합 테스트 공용 픽스처
//!
//! 테스트마다 임시 디렉토리에 SQLite 파일을 만들고 마이그레이션을 실행합니다.
//! 인메모리 DB는 풀의 연결끼리 공유되지 않으므로 파일 DB를 사용합니다.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;

use rollcall::config::Config;
use rollcall::db;
use rollcall::error::AppError;
use rollcall::models::{Class, ClassLocation, GeoPoint, Identity, NewClass, NewUser, Role};
use rollcall::services::{
    AttendanceValidator, Clock, EnrollmentGate, OsTokenSource, SessionStore, StatsAggregator,
    TokenSource,
};

/// 교실 위치 (뉴욕 시청 부근)
pub const CLASSROOM: (f64, f64) = (40.7128, -74.0060);

pub const JWT_SECRET: &str = "integration-test-secret";

/// 교실에서 약 14m 떨어진 지점
pub fn nearby() -> GeoPoint {
    GeoPoint::new(40.7129, -74.0061)
}

/// 로스앤젤레스 (교실에서 약 3,940km)
pub fn far_away() -> GeoPoint {
    GeoPoint::new(34.0522, -118.2437)
}

/// 테스트가 직접 움직이는 시계.
/// 밀리초 단위 저장에서 반올림 문제가 없도록 정각에서 시작합니다.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// 미리 정해둔 토큰을 순서대로 내주고, 다 쓰면 OS 난수로 넘어갑니다.
#[derive(Default)]
pub struct ScriptedTokens {
    queue: Mutex<VecDeque<String>>,
}

impl ScriptedTokens {
    pub fn push(&self, token: &str) {
        self.queue.lock().unwrap().push_back(token.to_string());
    }
}

impl TokenSource for ScriptedTokens {
    fn generate(&self) -> Result<String, AppError> {
        match self.queue.lock().unwrap().pop_front() {
            Some(token) => Ok(token),
            None => OsTokenSource.generate(),
        }
    }
}

pub struct TestEnv {
    pub pool: SqlitePool,
    pub clock: Arc<ManualClock>,
    pub tokens: Arc<ScriptedTokens>,
    pub sessions: SessionStore,
    pub enrollments: EnrollmentGate,
    pub attendance: AttendanceValidator,
    pub stats: StatsAggregator,
    pub teacher: Identity,
    pub students: Vec<Identity>,
    pub class: Class,
    _dir: TempDir,
}

impl TestEnv {
    pub fn student(&self, index: usize) -> &str {
        &self.students[index].id
    }

    pub fn config(&self) -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: JWT_SECRET.to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            default_session_minutes: 30,
            max_distance_meters: 50.0,
            cleanup_interval_secs: 60,
            store_timeout_ms: 5000,
            db_max_connections: 5,
        }
    }

    /// 같은 교실 위치로 수업을 하나 더 만듭니다.
    pub async fn another_class(&self, name: &str) -> Class {
        create_class(&self.pool, name, &self.teacher.id).await
    }

    pub async fn user(&self, name: &str, role: Role) -> Identity {
        db::users::create_user(
            &self.pool,
            &NewUser {
                name: name.to_string(),
                email: Some(format!("{}@school.test", name.to_lowercase())),
                role,
            },
        )
        .await
        .unwrap()
    }
}

async fn create_class(pool: &SqlitePool, name: &str, teacher_id: &str) -> Class {
    db::classes::create_class(
        pool,
        &NewClass {
            name: name.to_string(),
            teacher_id: Some(teacher_id.to_string()),
            location: ClassLocation {
                latitude: CLASSROOM.0,
                longitude: CLASSROOM.1,
                label: "Room 301".to_string(),
            },
        },
    )
    .await
    .unwrap()
}

/// 임시 DB, 마이그레이션, 교사 1명, 학생 3명, 수업 1개를 준비합니다.
/// 학생은 아직 수강 등록되지 않은 상태입니다.
pub async fn setup() -> TestEnv {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("rollcall.db").display());
    let pool = db::connect(&url, 8).await.unwrap();
    db::MIGRATOR.run(&pool).await.unwrap();

    let clock = Arc::new(ManualClock::new());
    let tokens = Arc::new(ScriptedTokens::default());

    let sessions = SessionStore::new(pool.clone(), clock.clone(), tokens.clone());
    let enrollments = EnrollmentGate::new(pool.clone(), clock.clone());
    let attendance = AttendanceValidator::new(
        pool.clone(),
        clock.clone(),
        sessions.clone(),
        enrollments.clone(),
    );
    let stats = StatsAggregator::new(pool.clone());

    let teacher = db::users::create_user(
        &pool,
        &NewUser {
            name: "Park".to_string(),
            email: Some("park@school.test".to_string()),
            role: Role::Teacher,
        },
    )
    .await
    .unwrap();

    let mut students = Vec::new();
    for name in ["Kim", "Lee", "Choi"] {
        let student = db::users::create_user(
            &pool,
            &NewUser {
                name: name.to_string(),
                email: None,
                role: Role::Student,
            },
        )
        .await
        .unwrap();
        students.push(student);
    }

    let class = create_class(&pool, "Distributed Systems", &teacher.id).await;

    TestEnv {
        pool,
        clock,
        tokens,
        sessions,
        enrollments,
        attendance,
        stats,
        teacher,
        students,
        class,
        _dir: dir,
    }
}
