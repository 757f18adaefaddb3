//! OVAL 평가 엔진 에러 타입
//!
//! [`EvrError`]는 EVR 비교 한 번의 실패를, [`OvalEngineError`]는 엔진 내에서
//! 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<OvalEngineError> for OvalguardError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **EVR 비교**: `Evr` (`MissingEpoch`, `InvalidEpoch`, `EmptyVersion`, `UnknownOperation`)
//! - **참조 해석**: `DanglingReference`, `KindMismatch`, `InvalidEntity`
//! - **텍스트 비교**: `UnknownOperation`, `Pattern`
//! - **문서 / 인벤토리**: `DocumentParse`, `Inventory`
//! - **설정**: `Config`

use ovalguard_core::error::{ConfigError, EvaluationError, OvalguardError};

use crate::types::EntityKind;

/// EVR 비교 실패
///
/// 비교 한 번만 중단시키며, 호출한 리프 테스트는 `Error` 상태가 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvrError {
    /// `:` 구분자가 없어 epoch를 분리할 수 없음
    #[error("evr '{input}' has no epoch separator")]
    MissingEpoch {
        /// 입력 문자열
        input: String,
    },

    /// epoch가 부호 없는 정수가 아님
    #[error("evr epoch '{epoch}' is not a valid unsigned integer")]
    InvalidEpoch {
        /// epoch 문자열
        epoch: String,
    },

    /// 버전 부분이 비어 있음
    #[error("evr version is empty")]
    EmptyVersion,

    /// 알 수 없는 비교 연산
    #[error("unknown evr operation '{operation}'")]
    UnknownOperation {
        /// 원본 연산 문자열
        operation: String,
    },
}

/// OVAL 평가 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum OvalEngineError {
    /// EVR 비교 실패
    #[error("evr comparison error: {0}")]
    Evr(#[from] EvrError),

    /// 존재하지 않는 엔티티 참조
    #[error("unresolved {entity} reference: {id}")]
    DanglingReference {
        /// 엔티티 종류 (definition, test, object, state)
        entity: &'static str,
        /// 참조 식별자
        id: String,
    },

    /// 테스트와 오브젝트/스테이트의 종류 불일치
    #[error("kind mismatch: test '{test_id}' is {expected} but {entity} '{id}' is {actual}")]
    KindMismatch {
        /// 테스트 식별자
        test_id: String,
        /// 참조된 엔티티 종류 (object, state)
        entity: &'static str,
        /// 참조된 엔티티 식별자
        id: String,
        /// 테스트의 종류
        expected: EntityKind,
        /// 참조된 엔티티의 종류
        actual: EntityKind,
    },

    /// 엔티티 필드 값이 유효하지 않음
    #[error("invalid {entity} '{id}': {reason}")]
    InvalidEntity {
        /// 엔티티 종류
        entity: &'static str,
        /// 엔티티 식별자
        id: String,
        /// 사유
        reason: String,
    },

    /// extend_definition 순환에 속한 정의
    #[error("definition '{id}' is part of an extend_definition cycle")]
    ExtendCycle {
        /// 정의 식별자
        id: String,
    },

    /// 알 수 없는 텍스트 비교 연산
    #[error("unknown text operation '{operation}'")]
    UnknownOperation {
        /// 원본 연산 문자열
        operation: String,
    },

    /// 정규식 컴파일 실패
    #[error("pattern error: '{pattern}': {reason}")]
    Pattern {
        /// 정규식 문자열
        pattern: String,
        /// 실패 사유
        reason: String,
    },

    /// 인벤토리 조회 실패
    #[error("inventory error: {0}")]
    Inventory(String),

    /// 정의 문서 파싱 실패
    #[error("document parse error: {0}")]
    DocumentParse(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<OvalEngineError> for OvalguardError {
    fn from(err: OvalEngineError) -> Self {
        match err {
            OvalEngineError::Config { field, reason } => {
                OvalguardError::Config(ConfigError::InvalidValue { field, reason })
            }
            OvalEngineError::DocumentParse(msg) => {
                OvalguardError::Evaluation(EvaluationError::Document(msg))
            }
            OvalEngineError::DanglingReference { entity, id } => OvalguardError::Evaluation(
                EvaluationError::UnresolvedReference(format!("{entity} {id}")),
            ),
            OvalEngineError::Evr(e) => {
                OvalguardError::Evaluation(EvaluationError::Comparison(e.to_string()))
            }
            OvalEngineError::Inventory(msg) => {
                OvalguardError::Evaluation(EvaluationError::Inventory(msg))
            }
            other @ (OvalEngineError::KindMismatch { .. }
            | OvalEngineError::InvalidEntity { .. }
            | OvalEngineError::ExtendCycle { .. }
            | OvalEngineError::UnknownOperation { .. }
            | OvalEngineError::Pattern { .. }) => {
                OvalguardError::Evaluation(EvaluationError::Document(other.to_string()))
            }
        }
    }
}
