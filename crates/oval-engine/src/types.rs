//! 도메인 타입 -- OVAL 평가 엔진 전용 열거형
//!
//! 평가 상태, 엔티티 종류, 비교 연산, check / check_existence 모드 등
//! 정의 문서 전반에서 공유하는 작은 값 타입을 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 정의 / 기준 노드의 평가 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalStatus {
    /// 조건 충족
    True,
    /// 조건 불충족
    False,
    /// 평가 중 에러 발생 (진단 메시지 참조)
    Error,
    /// 판단 불가
    Unknown,
    /// 아직 평가되지 않음
    #[default]
    NotEvaluated,
}

impl EvalStatus {
    /// 메트릭 레이블 등에 사용하는 고정 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Error => "error",
            Self::Unknown => "unknown",
            Self::NotEvaluated => "not_evaluated",
        }
    }

    /// negate 플래그를 적용합니다.
    ///
    /// `True`와 `False`만 뒤바뀌고 나머지 상태는 그대로 유지됩니다.
    pub fn negate_if(self, negate: bool) -> Self {
        match (negate, self) {
            (true, Self::True) => Self::False,
            (true, Self::False) => Self::True,
            (_, status) => status,
        }
    }

    /// 불리언 결과를 상태로 변환합니다.
    pub fn from_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl fmt::Display for EvalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 테스트 / 오브젝트 / 스테이트의 종류
///
/// 레지스트리 조회 순서는 선언 순서(RPM-info, DPKG-info, textfilecontent54)를 따릅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// rpminfo
    RpmInfo,
    /// dpkginfo
    DpkgInfo,
    /// textfilecontent54
    TextFileContent54,
}

impl EntityKind {
    /// 레지스트리 조회 순서
    pub const LOOKUP_ORDER: [Self; 3] = [Self::RpmInfo, Self::DpkgInfo, Self::TextFileContent54];

    /// OVAL 문서에서 사용하는 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RpmInfo => "rpminfo",
            Self::DpkgInfo => "dpkginfo",
            Self::TextFileContent54 => "textfilecontent54",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 설치 패키지 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    /// RPM (RHEL, Fedora, SUSE)
    Rpm,
    /// DPKG (Debian, Ubuntu)
    Dpkg,
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpm => write!(f, "rpm"),
            Self::Dpkg => write!(f, "dpkg"),
        }
    }
}

/// 기준 노드 결합 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CriteriaOperator {
    /// 모든 자식이 참
    #[default]
    And,
    /// 하나 이상의 자식이 참
    Or,
}

impl fmt::Display for CriteriaOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// 수집된 항목(item)별 스테이트 결과를 결합하는 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckMode {
    /// 모든 항목이 스테이트를 만족
    #[default]
    #[serde(rename = "all")]
    All,
    /// 하나 이상의 항목이 만족
    #[serde(rename = "at least one")]
    AtLeastOne,
    /// 정확히 하나의 항목이 만족
    #[serde(rename = "only one")]
    OnlyOne,
    /// 어떤 항목도 만족하지 않음
    #[serde(rename = "none satisfy")]
    NoneSatisfy,
}

impl CheckMode {
    /// 항목별 결과를 결합합니다.
    pub fn combine(&self, results: &[bool]) -> bool {
        let satisfied = results.iter().filter(|r| **r).count();
        match self {
            Self::All => satisfied == results.len(),
            Self::AtLeastOne => satisfied >= 1,
            Self::OnlyOne => satisfied == 1,
            Self::NoneSatisfy => satisfied == 0,
        }
    }
}

/// 수집된 항목 개수에 대한 존재 조건
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceCheck {
    /// 하나 이상 존재
    #[default]
    AtLeastOneExists,
    /// 개수와 무관
    AnyExist,
    /// 하나도 존재하지 않음
    NoneExist,
    /// 정확히 하나 존재
    OnlyOneExists,
}

impl ExistenceCheck {
    /// 항목 개수가 존재 조건을 만족하는지 확인합니다.
    pub fn is_satisfied(&self, item_count: usize) -> bool {
        match self {
            Self::AtLeastOneExists => item_count >= 1,
            Self::AnyExist => true,
            Self::NoneExist => item_count == 0,
            Self::OnlyOneExists => item_count == 1,
        }
    }
}

/// EVR 비교 연산
///
/// 인식할 수 없는 문자열은 [`EvrOperation::Unknown`]으로 보존되며,
/// 실제 비교 시점에 `EvrError::UnknownOperation`으로 실패합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EvrOperation {
    /// `less than`
    LessThan,
    /// `less than or equal`
    LessThanOrEqual,
    /// `equals`
    #[default]
    Equals,
    /// `not equal`
    NotEqual,
    /// `greater than`
    GreaterThan,
    /// `greater than or equal`
    GreaterThanOrEqual,
    /// 인식할 수 없는 연산 (원본 문자열 보존)
    Unknown(String),
}

impl EvrOperation {
    /// 문자열에서 연산을 파싱합니다 (대소문자, 앞뒤 공백 무시).
    ///
    /// 인식할 수 없는 값은 `Unknown`으로 보존합니다.
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "less than" => Self::LessThan,
            "less than or equal" => Self::LessThanOrEqual,
            "equals" => Self::Equals,
            "not equal" => Self::NotEqual,
            "greater than" => Self::GreaterThan,
            "greater than or equal" => Self::GreaterThanOrEqual,
            _ => Self::Unknown(s.to_owned()),
        }
    }

    /// OVAL 문서 표기를 반환합니다.
    pub fn as_str(&self) -> &str {
        match self {
            Self::LessThan => "less than",
            Self::LessThanOrEqual => "less than or equal",
            Self::Equals => "equals",
            Self::NotEqual => "not equal",
            Self::GreaterThan => "greater than",
            Self::GreaterThanOrEqual => "greater than or equal",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for EvrOperation {
    fn from(s: String) -> Self {
        Self::from_str_loose(&s)
    }
}

impl From<EvrOperation> for String {
    fn from(op: EvrOperation) -> Self {
        op.as_str().to_owned()
    }
}

impl fmt::Display for EvrOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// textfilecontent54 subexpression 비교 연산
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TextOperation {
    /// `equals`
    #[default]
    Equals,
    /// `not equal`
    NotEqual,
    /// `pattern match`
    PatternMatch,
    /// 인식할 수 없는 연산 (원본 문자열 보존)
    Unknown(String),
}

impl TextOperation {
    /// 문자열에서 연산을 파싱합니다 (대소문자, 앞뒤 공백 무시).
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "equals" => Self::Equals,
            "not equal" => Self::NotEqual,
            "pattern match" => Self::PatternMatch,
            _ => Self::Unknown(s.to_owned()),
        }
    }

    /// OVAL 문서 표기를 반환합니다.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEqual => "not equal",
            Self::PatternMatch => "pattern match",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for TextOperation {
    fn from(s: String) -> Self {
        Self::from_str_loose(&s)
    }
}

impl From<TextOperation> for String {
    fn from(op: TextOperation) -> Self {
        op.as_str().to_owned()
    }
}

impl fmt::Display for TextOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negate_swaps_only_true_and_false() {
        assert_eq!(EvalStatus::True.negate_if(true), EvalStatus::False);
        assert_eq!(EvalStatus::False.negate_if(true), EvalStatus::True);
        assert_eq!(EvalStatus::Error.negate_if(true), EvalStatus::Error);
        assert_eq!(EvalStatus::Unknown.negate_if(true), EvalStatus::Unknown);
        assert_eq!(
            EvalStatus::NotEvaluated.negate_if(true),
            EvalStatus::NotEvaluated
        );
        assert_eq!(EvalStatus::True.negate_if(false), EvalStatus::True);
    }

    #[test]
    fn status_default_is_not_evaluated() {
        assert_eq!(EvalStatus::default(), EvalStatus::NotEvaluated);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&EvalStatus::NotEvaluated).unwrap();
        assert_eq!(json, "\"not_evaluated\"");
    }

    #[test]
    fn entity_kind_lookup_order() {
        assert_eq!(
            EntityKind::LOOKUP_ORDER,
            [
                EntityKind::RpmInfo,
                EntityKind::DpkgInfo,
                EntityKind::TextFileContent54
            ]
        );
    }

    #[test]
    fn check_mode_combine() {
        let mixed = [true, false, true];
        assert!(!CheckMode::All.combine(&mixed));
        assert!(CheckMode::AtLeastOne.combine(&mixed));
        assert!(!CheckMode::OnlyOne.combine(&mixed));
        assert!(!CheckMode::NoneSatisfy.combine(&mixed));

        assert!(CheckMode::OnlyOne.combine(&[false, true]));
        assert!(CheckMode::NoneSatisfy.combine(&[false, false]));
        assert!(CheckMode::All.combine(&[true, true]));
    }

    #[test]
    fn existence_check_counts() {
        assert!(!ExistenceCheck::AtLeastOneExists.is_satisfied(0));
        assert!(ExistenceCheck::AtLeastOneExists.is_satisfied(3));
        assert!(ExistenceCheck::AnyExist.is_satisfied(0));
        assert!(ExistenceCheck::NoneExist.is_satisfied(0));
        assert!(!ExistenceCheck::NoneExist.is_satisfied(1));
        assert!(ExistenceCheck::OnlyOneExists.is_satisfied(1));
        assert!(!ExistenceCheck::OnlyOneExists.is_satisfied(2));
    }

    #[test]
    fn check_mode_deserializes_oval_names() {
        let mode: CheckMode = serde_json::from_str("\"at least one\"").unwrap();
        assert_eq!(mode, CheckMode::AtLeastOne);
        let existence: ExistenceCheck = serde_json::from_str("\"none_exist\"").unwrap();
        assert_eq!(existence, ExistenceCheck::NoneExist);
    }

    #[test]
    fn evr_operation_parses_known_names() {
        assert_eq!(EvrOperation::from_str_loose("less than"), EvrOperation::LessThan);
        assert_eq!(EvrOperation::from_str_loose(" Equals "), EvrOperation::Equals);
        assert_eq!(
            EvrOperation::from_str_loose("greater than or equal"),
            EvrOperation::GreaterThanOrEqual
        );
    }

    #[test]
    fn evr_operation_preserves_unknown_text() {
        let op = EvrOperation::from_str_loose("bitwise and");
        assert_eq!(op, EvrOperation::Unknown("bitwise and".to_owned()));
        assert_eq!(op.to_string(), "bitwise and");
    }

    #[test]
    fn evr_operation_serde_uses_oval_text() {
        let op: EvrOperation = serde_json::from_str("\"less than\"").unwrap();
        assert_eq!(op, EvrOperation::LessThan);
        assert_eq!(serde_json::to_string(&op).unwrap(), "\"less than\"");
    }

    #[test]
    fn text_operation_parses() {
        assert_eq!(
            TextOperation::from_str_loose("pattern match"),
            TextOperation::PatternMatch
        );
        assert!(matches!(
            TextOperation::from_str_loose("case insensitive equals"),
            TextOperation::Unknown(_)
        ));
    }
}
