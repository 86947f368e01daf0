use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 수강 등록: `(student_id, class_id)` 쌍은 유일하며, 재등록은 기존 행을 다시 활성화합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub class_id: String,
    pub is_active: bool,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnrollRequest {
    /// 없으면 요청한 학생 본인을 등록합니다.
    pub student_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentCheckQuery {
    pub student_id: String,
    pub class_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CountQuery {
    #[serde(default)]
    pub include_inactive: bool,
}
