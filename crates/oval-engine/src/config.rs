//! 평가 엔진 설정
//!
//! [`EngineConfig`]는 core의 [`OvalConfig`](ovalguard_core::config::OvalConfig)에서 파생됩니다.
//!
//! # 사용 예시
//!
//! ```
//! use ovalguard_oval_engine::{EngineConfig, EngineConfigBuilder};
//!
//! // 기본값으로 생성
//! let config = EngineConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! let config = EngineConfigBuilder::new()
//!     .cache_results(false)
//!     .max_diagnostics(50)
//!     .build()
//!     .unwrap();
//! assert!(!config.cache_results);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::OvalEngineError;

/// `max_diagnostics` 상한값
const MAX_DIAGNOSTICS_LIMIT: usize = 100_000;

/// 평가 엔진 설정
///
/// # 필드
///
/// - **cache_results**: 확정된 정의 결과를 재사용할지 여부
/// - **max_diagnostics**: 결과 레코드 하나에 보관할 최대 진단 메시지 수
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 확정된 정의 결과 재사용 여부
    pub cache_results: bool,
    /// 결과 레코드 하나에 보관할 최대 진단 메시지 수
    pub max_diagnostics: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_results: true,
            max_diagnostics: 1000,
        }
    }
}

impl EngineConfig {
    /// core의 `OvalConfig`에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &ovalguard_core::config::OvalConfig) -> Self {
        Self {
            cache_results: core.cache_results,
            max_diagnostics: core.max_diagnostics,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `max_diagnostics`: 1-100000
    pub fn validate(&self) -> Result<(), OvalEngineError> {
        if self.max_diagnostics == 0 || self.max_diagnostics > MAX_DIAGNOSTICS_LIMIT {
            return Err(OvalEngineError::Config {
                field: "max_diagnostics".to_owned(),
                reason: format!("must be 1-{MAX_DIAGNOSTICS_LIMIT}"),
            });
        }
        Ok(())
    }
}

/// [`EngineConfig`] 빌더
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 결과 재사용 여부를 설정합니다.
    pub fn cache_results(mut self, enabled: bool) -> Self {
        self.config.cache_results = enabled;
        self
    }

    /// 최대 진단 메시지 수를 설정합니다.
    pub fn max_diagnostics(mut self, max: usize) -> Self {
        self.config.max_diagnostics = max;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `OvalEngineError::Config` 반환
    pub fn build(self) -> Result<EngineConfig, OvalEngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
