use serde::{Deserialize, Serialize};

/// 사용자 역할. 문자열 비교 대신 닫힌 집합으로 다룹니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn can_mark_attendance(self) -> bool {
        matches!(self, Role::Student)
    }

    pub fn can_manage_sessions(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }

    pub fn can_view_class_reports(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// 신원 조회 결과. `users` 테이블은 외부 인증 서버가 관리하며 여기서는 읽기만 합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
}
