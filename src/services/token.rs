//! # 세션 토큰 생성
//!
//! 토큰은 16바이트 난수를 소문자 hex 32자리로 표현한 불투명 문자열입니다.
//! 전역 상태 없이 `TokenSource`를 세션 저장소에 주입합니다.

use rand_core::{OsRng, RngCore};

use crate::error::AppError;

/// 토큰을 이루는 난수 바이트 수
pub const TOKEN_BYTES: usize = 16;

/// 토큰 문자열 길이 (바이트당 hex 2자리)
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// 세션 토큰을 만드는 능력. 여러 요청이 동시에 호출하므로 `Send + Sync`가 필요합니다.
pub trait TokenSource: Send + Sync {
    fn generate(&self) -> Result<String, AppError>;
}

/// 운영체제 난수 생성기(OsRng)를 사용하는 토큰 생성기
#[derive(Debug, Default, Clone, Copy)]
pub struct OsTokenSource;

impl TokenSource for OsTokenSource {
    fn generate(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        let mut rng = OsRng;
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;
        Ok(hex::encode(bytes))
    }
}
