//! 테스트 / 오브젝트 / 스테이트 엔티티
//!
//! 문서에는 종류별 컬렉션으로 저장되며, 레지스트리 조회 결과는
//! 종류를 태그로 갖는 핸들([`TestRef`], [`ObjectRef`], [`StateRef`])로 반환됩니다.
//! 모든 핸들은 [`OvalEntity`]를 구현합니다.

use serde::{Deserialize, Serialize};

use crate::types::{CheckMode, EntityKind, EvrOperation, ExistenceCheck, TextOperation};

/// 레지스트리 핸들이 공유하는 능력
pub trait OvalEntity {
    /// 엔티티 식별자
    fn id(&self) -> &str;

    /// 엔티티 종류
    fn kind(&self) -> EntityKind;
}

/// OVAL 테스트
///
/// 세 종류 모두 같은 형태를 가지며, 어느 컬렉션에 속하는지로 종류가 정해집니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvalTest {
    /// 테스트 식별자
    pub id: String,
    /// 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// 항목별 스테이트 결과 결합 방식
    #[serde(default)]
    pub check: CheckMode,
    /// 항목 개수 조건
    #[serde(default)]
    pub check_existence: ExistenceCheck,
    /// 오브젝트 참조
    pub object_ref: String,
    /// 스테이트 참조 목록 (비어 있을 수 있음)
    #[serde(default)]
    pub state_refs: Vec<String>,
}

impl OvalTest {
    /// 오브젝트 참조만 가진 테스트를 생성합니다.
    pub fn new(id: impl Into<String>, object_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            comment: None,
            check: CheckMode::default(),
            check_existence: ExistenceCheck::default(),
            object_ref: object_ref.into(),
            state_refs: Vec::new(),
        }
    }

    /// 스테이트 참조를 추가합니다.
    pub fn with_state(mut self, state_ref: impl Into<String>) -> Self {
        self.state_refs.push(state_ref.into());
        self
    }

    /// check 모드를 설정합니다.
    pub fn with_check(mut self, check: CheckMode) -> Self {
        self.check = check;
        self
    }

    /// check_existence 모드를 설정합니다.
    pub fn with_existence(mut self, check_existence: ExistenceCheck) -> Self {
        self.check_existence = check_existence;
        self
    }
}

/// rpminfo / dpkginfo 오브젝트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageObject {
    /// 오브젝트 식별자
    pub id: String,
    /// 패키지 이름
    pub name: String,
}

impl PackageObject {
    /// 새 패키지 오브젝트를 생성합니다.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// textfilecontent54 오브젝트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFileContentObject {
    /// 오브젝트 식별자
    pub id: String,
    /// 대상 파일 경로
    pub filepath: String,
    /// 정규식 패턴 (첫 캡처 그룹, 없으면 전체 매치가 항목 값)
    pub pattern: String,
    /// 1부터 시작하는 매치 선택자 (없으면 모든 매치)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<usize>,
}

/// EVR 요구 조건
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvrRequirement {
    /// 비교 연산 (기본값 `equals`)
    #[serde(default)]
    pub operation: EvrOperation,
    /// 기대 EVR 문자열
    pub value: String,
}

/// rpminfo / dpkginfo 스테이트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageState {
    /// 스테이트 식별자
    pub id: String,
    /// EVR 조건
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evr: Option<EvrRequirement>,
    /// 아키텍처 조건 (정확히 일치)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl PackageState {
    /// EVR 조건을 가진 스테이트를 생성합니다.
    pub fn with_evr(
        id: impl Into<String>,
        operation: EvrOperation,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            evr: Some(EvrRequirement {
                operation,
                value: value.into(),
            }),
            arch: None,
        }
    }
}

/// subexpression 조건
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRequirement {
    /// 비교 연산 (기본값 `equals`)
    #[serde(default)]
    pub operation: TextOperation,
    /// 기대값 (`pattern match`이면 정규식)
    pub value: String,
}

/// textfilecontent54 스테이트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFileContentState {
    /// 스테이트 식별자
    pub id: String,
    /// subexpression 조건
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subexpression: Option<TextRequirement>,
}

/// 종류 태그가 붙은 테스트 핸들
#[derive(Debug, Clone, Copy)]
pub enum TestRef<'a> {
    /// rpminfo_test
    RpmInfo(&'a OvalTest),
    /// dpkginfo_test
    DpkgInfo(&'a OvalTest),
    /// textfilecontent54_test
    TextFileContent54(&'a OvalTest),
}

impl<'a> TestRef<'a> {
    /// 종류와 테스트로 핸들을 만듭니다.
    pub fn new(kind: EntityKind, test: &'a OvalTest) -> Self {
        match kind {
            EntityKind::RpmInfo => Self::RpmInfo(test),
            EntityKind::DpkgInfo => Self::DpkgInfo(test),
            EntityKind::TextFileContent54 => Self::TextFileContent54(test),
        }
    }

    /// 테스트 본문을 반환합니다.
    pub fn test(&self) -> &'a OvalTest {
        match self {
            Self::RpmInfo(t) | Self::DpkgInfo(t) | Self::TextFileContent54(t) => t,
        }
    }
}

impl OvalEntity for TestRef<'_> {
    fn id(&self) -> &str {
        &self.test().id
    }

    fn kind(&self) -> EntityKind {
        match self {
            Self::RpmInfo(_) => EntityKind::RpmInfo,
            Self::DpkgInfo(_) => EntityKind::DpkgInfo,
            Self::TextFileContent54(_) => EntityKind::TextFileContent54,
        }
    }
}

/// 종류 태그가 붙은 오브젝트 핸들
#[derive(Debug, Clone, Copy)]
pub enum ObjectRef<'a> {
    /// rpminfo_object
    RpmInfo(&'a PackageObject),
    /// dpkginfo_object
    DpkgInfo(&'a PackageObject),
    /// textfilecontent54_object
    TextFileContent54(&'a TextFileContentObject),
}

impl OvalEntity for ObjectRef<'_> {
    fn id(&self) -> &str {
        match self {
            Self::RpmInfo(o) | Self::DpkgInfo(o) => &o.id,
            Self::TextFileContent54(o) => &o.id,
        }
    }

    fn kind(&self) -> EntityKind {
        match self {
            Self::RpmInfo(_) => EntityKind::RpmInfo,
            Self::DpkgInfo(_) => EntityKind::DpkgInfo,
            Self::TextFileContent54(_) => EntityKind::TextFileContent54,
        }
    }
}

/// 종류 태그가 붙은 스테이트 핸들
#[derive(Debug, Clone, Copy)]
pub enum StateRef<'a> {
    /// rpminfo_state
    RpmInfo(&'a PackageState),
    /// dpkginfo_state
    DpkgInfo(&'a PackageState),
    /// textfilecontent54_state
    TextFileContent54(&'a TextFileContentState),
}

impl OvalEntity for StateRef<'_> {
    fn id(&self) -> &str {
        match self {
            Self::RpmInfo(s) | Self::DpkgInfo(s) => &s.id,
            Self::TextFileContent54(s) => &s.id,
        }
    }

    fn kind(&self) -> EntityKind {
        match self {
            Self::RpmInfo(_) => EntityKind::RpmInfo,
            Self::DpkgInfo(_) => EntityKind::DpkgInfo,
            Self::TextFileContent54(_) => EntityKind::TextFileContent54,
        }
    }
}
