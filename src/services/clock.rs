use chrono::{DateTime, Utc};

/// 현재 시각을 제공하는 능력(capability).
/// 서비스에 주입하므로 테스트에서는 시간을 직접 움직일 수 있습니다.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 시스템 시계
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
