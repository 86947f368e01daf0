//! AttendanceValidator 통합 테스트

mod common;

use chrono::Duration;
use rollcall::db;
use rollcall::error::AppError;
use rollcall::models::{
    AttendanceSession, AttendanceSubmission, GeoPoint, MarkedAttendance, SessionRef,
};
use rollcall::services::Clock;

use common::{far_away, nearby, setup, TestEnv};

fn submission(student_id: &str, session: &AttendanceSession, location: GeoPoint) -> AttendanceSubmission {
    AttendanceSubmission {
        session: SessionRef::Token(session.session_token.clone()),
        student_id: student_id.to_string(),
        location,
        max_distance_meters: None,
    }
}

/// 학생 0을 등록하고 30분짜리 세션을 엽니다.
async fn open_session(env: &TestEnv) -> AttendanceSession {
    env.enrollments
        .enroll(env.student(0), &env.class.id)
        .await
        .unwrap();
    env.sessions.create_for_class(&env.class.id, 30).await.unwrap()
}

async fn submit(
    env: &TestEnv,
    student_id: &str,
    session: &AttendanceSession,
    location: GeoPoint,
) -> Result<MarkedAttendance, AppError> {
    env.attendance
        .submit(submission(student_id, session, location))
        .await
}

#[tokio::test]
async fn student_in_range_is_marked_present() {
    let env = setup().await;
    let session = open_session(&env).await;

    let marked = submit(&env, env.student(0), &session, nearby()).await.unwrap();

    assert!(marked.distance < 50.0);
    assert_eq!(marked.record.session_id, session.id);
    assert_eq!(marked.record.student_id, env.student(0));
    assert_eq!(marked.record.student_location, nearby());

    let stored = db::records::find_for_session_and_student(&env.pool, &session.id, env.student(0))
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn submission_by_session_id_is_accepted() {
    let env = setup().await;
    let session = open_session(&env).await;

    let result = env
        .attendance
        .submit(AttendanceSubmission {
            session: SessionRef::Id(session.id.clone()),
            student_id: env.student(0).to_string(),
            location: nearby(),
            max_distance_meters: None,
        })
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn student_far_away_is_out_of_range() {
    let env = setup().await;
    let session = open_session(&env).await;

    let err = submit(&env, env.student(0), &session, far_away()).await.unwrap_err();
    match err {
        AppError::OutOfRange { distance, max_distance } => {
            assert!(distance > 3_900_000.0);
            assert_eq!(max_distance, 50.0);
        }
        other => panic!("expected OutOfRange, got {:?}", other),
    }

    let stored = db::records::find_for_session_and_student(&env.pool, &session.id, env.student(0))
        .await
        .unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn tighter_radius_rejects_a_nearby_student() {
    let env = setup().await;
    let session = open_session(&env).await;

    let mut tight = submission(env.student(0), &session, nearby());
    tight.max_distance_meters = Some(5.0);
    let err = env.attendance.submit(tight).await.unwrap_err();
    assert!(matches!(err, AppError::OutOfRange { .. }));
    assert!(err.distance().unwrap() > 5.0);
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let env = setup().await;
    env.enrollments
        .enroll(env.student(0), &env.class.id)
        .await
        .unwrap();
    let session = env
        .sessions
        .create_with_ttl(&env.class.id, Duration::seconds(1))
        .await
        .unwrap();

    env.clock.advance(Duration::milliseconds(1100));

    let result = submit(&env, env.student(0), &session, nearby()).await;
    assert!(matches!(result, Err(AppError::SessionExpired)));
}

#[tokio::test]
async fn superseded_or_closed_session_is_inactive() {
    let env = setup().await;
    let first = open_session(&env).await;
    let second = env.sessions.create_for_class(&env.class.id, 30).await.unwrap();

    let result = submit(&env, env.student(0), &first, nearby()).await;
    assert!(matches!(result, Err(AppError::SessionInactive)));

    env.sessions.deactivate(&second.id).await.unwrap();
    let result = submit(&env, env.student(0), &second, nearby()).await;
    assert!(matches!(result, Err(AppError::SessionInactive)));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let env = setup().await;
    let result = env
        .attendance
        .submit(AttendanceSubmission {
            session: SessionRef::Token("0".repeat(32)),
            student_id: env.student(0).to_string(),
            location: nearby(),
            max_distance_meters: None,
        })
        .await;
    assert!(matches!(result, Err(AppError::SessionNotFound)));
}

#[tokio::test]
async fn unenrolled_student_can_attend_after_enrolling() {
    let env = setup().await;
    let session = open_session(&env).await;

    let result = submit(&env, env.student(1), &session, nearby()).await;
    assert!(matches!(result, Err(AppError::NotEnrolled)));

    env.enrollments
        .enroll(env.student(1), &env.class.id)
        .await
        .unwrap();
    assert!(submit(&env, env.student(1), &session, nearby()).await.is_ok());
}

#[tokio::test]
async fn deactivated_enrollment_blocks_attendance() {
    let env = setup().await;
    let session = open_session(&env).await;
    env.enrollments
        .deactivate(env.student(0), &env.class.id)
        .await
        .unwrap();

    let result = submit(&env, env.student(0), &session, nearby()).await;
    assert!(matches!(result, Err(AppError::NotEnrolled)));
}

#[tokio::test]
async fn second_submission_is_a_duplicate() {
    let env = setup().await;
    let session = open_session(&env).await;

    submit(&env, env.student(0), &session, nearby()).await.unwrap();
    let again = submit(&env, env.student(0), &session, nearby()).await;
    assert!(matches!(again, Err(AppError::DuplicateAttendance)));

    let records = env.stats.by_session(&session.id).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_record_exactly_once() {
    let env = setup().await;
    let session = open_session(&env).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let attendance = env.attendance.clone();
        let input = submission(env.student(0), &session, nearby());
        handles.push(tokio::spawn(async move { attendance.submit(input).await }));
    }

    let mut accepted = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(AppError::DuplicateAttendance) => duplicates += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(duplicates, 9);
    assert_eq!(env.stats.by_session(&session.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn expiry_is_reported_before_distance() {
    let env = setup().await;
    let session = open_session(&env).await;
    env.clock.advance(Duration::minutes(31));

    let result = submit(&env, env.student(0), &session, far_away()).await;
    assert!(matches!(result, Err(AppError::SessionExpired)));
}

#[tokio::test]
async fn enrollment_is_reported_before_distance() {
    let env = setup().await;
    let session = open_session(&env).await;

    let result = submit(&env, env.student(2), &session, far_away()).await;
    assert!(matches!(result, Err(AppError::NotEnrolled)));
}

#[tokio::test]
async fn duplicate_is_reported_before_distance() {
    let env = setup().await;
    let session = open_session(&env).await;
    submit(&env, env.student(0), &session, nearby()).await.unwrap();

    let result = submit(&env, env.student(0), &session, far_away()).await;
    assert!(matches!(result, Err(AppError::DuplicateAttendance)));
}

#[tokio::test]
async fn inactive_student_is_rejected() {
    let env = setup().await;
    let session = open_session(&env).await;
    db::users::set_user_active(&env.pool, env.student(0), false)
        .await
        .unwrap();

    let result = submit(&env, env.student(0), &session, nearby()).await;
    assert!(matches!(result, Err(AppError::InactiveStudent)));
}

#[tokio::test]
async fn unknown_or_non_student_identity_is_not_found() {
    let env = setup().await;
    let session = open_session(&env).await;

    let ghost = submit(&env, "ghost", &session, nearby()).await;
    assert!(matches!(ghost, Err(AppError::StudentNotFound)));

    let teacher = submit(&env, &env.teacher.id, &session, nearby()).await;
    assert!(matches!(teacher, Err(AppError::StudentNotFound)));
}

#[tokio::test]
async fn malformed_input_is_rejected_before_lookup() {
    let env = setup().await;
    let session = open_session(&env).await;

    let bad_location = submit(&env, env.student(0), &session, GeoPoint::new(91.0, 0.0)).await;
    assert!(matches!(bad_location, Err(AppError::InvalidLocation(_))));

    let mut negative = submission(env.student(0), &session, nearby());
    negative.max_distance_meters = Some(-1.0);
    let result = env.attendance.submit(negative).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn constraint_violations_are_not_retryable() {
    let env = setup().await;
    let session = open_session(&env).await;
    let now = env.clock.now();

    let orphan = db::records::insert_record(
        &env.pool,
        "r-orphan",
        "no-such-session",
        env.student(0),
        nearby(),
        now,
    )
    .await
    .unwrap_err();
    assert!(orphan.is_constraint_violation());
    assert!(!orphan.is_retryable());
    assert_eq!(orphan.kind(), "constraint_violation");

    db::records::insert_record(&env.pool, "r-1", &session.id, env.student(0), nearby(), now)
        .await
        .unwrap();
    let duplicate =
        db::records::insert_record(&env.pool, "r-2", &session.id, env.student(0), nearby(), now)
            .await
            .unwrap_err();
    assert!(!duplicate.is_retryable());
    assert_eq!(duplicate.kind(), "constraint_violation");
    assert_eq!(duplicate.status_code(), axum::http::StatusCode::CONFLICT);
}
