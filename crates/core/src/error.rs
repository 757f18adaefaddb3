//! 에러 타입 — 도메인별 에러 정의

/// ovalguard 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum OvalguardError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 정의 평가 에러
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// 로깅 초기화 에러
    #[error("logging error: {0}")]
    Logging(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 정의 평가 에러
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// 정의 문서 로딩 실패
    #[error("document load failed: {0}")]
    Document(String),

    /// 존재하지 않는 식별자 참조
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// 버전 비교 실패
    #[error("version comparison failed: {0}")]
    Comparison(String),

    /// 인벤토리 조회 실패
    #[error("inventory lookup failed: {0}")]
    Inventory(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: OvalguardError = ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, OvalguardError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn evaluation_error_display() {
        let err: OvalguardError =
            EvaluationError::UnresolvedReference("oval:tst:1".to_owned()).into();
        let msg = err.to_string();
        assert!(msg.starts_with("evaluation error"));
        assert!(msg.contains("oval:tst:1"));
    }

    #[test]
    fn invalid_value_names_the_field() {
        let err = ConfigError::InvalidValue {
            field: "oval.max_diagnostics".to_owned(),
            reason: "must be greater than 0".to_owned(),
        };
        assert!(err.to_string().contains("oval.max_diagnostics"));
    }
}
