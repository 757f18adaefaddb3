//! 설정 관리 — ovalguard.toml 파싱 및 런타임 설정
//!
//! [`OvalguardConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`OVALGUARD_OVAL_MAX_DIAGNOSTICS=200` 형식)
//! 2. 설정 파일 (`ovalguard.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), ovalguard_core::error::OvalguardError> {
//! use ovalguard_core::config::OvalguardConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = OvalguardConfig::load("ovalguard.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = OvalguardConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, OvalguardError};

/// `max_diagnostics` 상한값
const MAX_DIAGNOSTICS_LIMIT: usize = 100_000;

/// ovalguard 통합 설정
///
/// `ovalguard.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OvalguardConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// OVAL 평가 엔진 설정
    #[serde(default)]
    pub oval: OvalConfig,
}

impl OvalguardConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, OvalguardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, OvalguardError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OvalguardError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                OvalguardError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, OvalguardError> {
        toml::from_str(toml_str).map_err(|e| {
            OvalguardError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `OVALGUARD_{SECTION}_{FIELD}`
    /// 예: `OVALGUARD_GENERAL_LOG_LEVEL=debug`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "OVALGUARD_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "OVALGUARD_GENERAL_LOG_FORMAT");

        // OVAL
        override_bool(&mut self.oval.cache_results, "OVALGUARD_OVAL_CACHE_RESULTS");
        override_usize(
            &mut self.oval.max_diagnostics,
            "OVALGUARD_OVAL_MAX_DIAGNOSTICS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), OvalguardError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.oval.max_diagnostics == 0 || self.oval.max_diagnostics > MAX_DIAGNOSTICS_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "oval.max_diagnostics".to_owned(),
                reason: format!("must be 1-{MAX_DIAGNOSTICS_LIMIT}"),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// OVAL 평가 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OvalConfig {
    /// 이미 평가된 정의의 결과를 재사용할지 여부
    pub cache_results: bool,
    /// 평가 결과 하나에 보관할 최대 진단 메시지 수
    pub max_diagnostics: usize,
}

impl Default for OvalConfig {
    fn default() -> Self {
        Self {
            cache_results: true,
            max_diagnostics: 1000,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = OvalguardConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(config.oval.cache_results);
        assert_eq!(config.oval.max_diagnostics, 1000);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = OvalguardConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = OvalguardConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert!(config.oval.cache_results);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[oval]
cache_results = false
"#;
        let config = OvalguardConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert!(!config.oval.cache_results);
        assert_eq!(config.oval.max_diagnostics, 1000);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = OvalguardConfig::parse("invalid = [[[toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            OvalguardError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = OvalguardConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = OvalguardConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_max_diagnostics() {
        let mut config = OvalguardConfig::default();
        config.oval.max_diagnostics = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_diagnostics"));
    }

    #[test]
    fn validate_rejects_oversized_max_diagnostics() {
        let mut config = OvalguardConfig::default();
        config.oval.max_diagnostics = MAX_DIAGNOSTICS_LIMIT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_OVALGUARD_STR", "overridden") };
        override_string(&mut val, "TEST_OVALGUARD_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_OVALGUARD_STR") };
    }

    #[test]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = true;
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_OVALGUARD_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_OVALGUARD_BOOL_BAD");
        assert!(val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_OVALGUARD_BOOL_BAD") };
    }

    #[test]
    fn env_override_usize_valid() {
        let mut val = 10usize;
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_OVALGUARD_USIZE", "42") };
        override_usize(&mut val, "TEST_OVALGUARD_USIZE");
        assert_eq!(val, 42);
        unsafe { std::env::remove_var("TEST_OVALGUARD_USIZE") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_OVALGUARD_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = OvalguardConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = OvalguardConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.oval.max_diagnostics, parsed.oval.max_diagnostics);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = OvalguardConfig::from_file("/nonexistent/path/ovalguard.toml").await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            OvalguardError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
