//! 정의 문서 컨테이너
//!
//! XML 파싱은 외부 협력자의 몫이며, 이 모듈은 파싱이 끝난 문서의
//! 메모리 표현만 정의합니다. 픽스처와 도구용으로 JSON 역직렬화를 지원합니다.
//!
//! # JSON 형식
//!
//! ```json
//! {
//!   "definitions": [ { "id": "oval:def:1", "criteria": { "children": [] } } ],
//!   "tests":   { "rpminfo_tests": [], "dpkginfo_tests": [], "textfilecontent54_tests": [] },
//!   "objects": { "rpminfo_objects": [], "dpkginfo_objects": [], "textfilecontent54_objects": [] },
//!   "states":  { "rpminfo_states": [], "dpkginfo_states": [], "textfilecontent54_states": [] }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::OvalEngineError;
use crate::types::EntityKind;
use crate::model::definition::Definition;
use crate::model::entity::{
    OvalTest, PackageObject, PackageState, TextFileContentObject, TextFileContentState,
};

/// 종류별 테스트 컬렉션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestCollection {
    /// rpminfo_test 목록
    #[serde(default)]
    pub rpminfo_tests: Vec<OvalTest>,
    /// dpkginfo_test 목록
    #[serde(default)]
    pub dpkginfo_tests: Vec<OvalTest>,
    /// textfilecontent54_test 목록
    #[serde(default)]
    pub textfilecontent54_tests: Vec<OvalTest>,
}

/// 종류별 오브젝트 컬렉션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectCollection {
    /// rpminfo_object 목록
    #[serde(default)]
    pub rpminfo_objects: Vec<PackageObject>,
    /// dpkginfo_object 목록
    #[serde(default)]
    pub dpkginfo_objects: Vec<PackageObject>,
    /// textfilecontent54_object 목록
    #[serde(default)]
    pub textfilecontent54_objects: Vec<TextFileContentObject>,
}

/// 종류별 스테이트 컬렉션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateCollection {
    /// rpminfo_state 목록
    #[serde(default)]
    pub rpminfo_states: Vec<PackageState>,
    /// dpkginfo_state 목록
    #[serde(default)]
    pub dpkginfo_states: Vec<PackageState>,
    /// textfilecontent54_state 목록
    #[serde(default)]
    pub textfilecontent54_states: Vec<TextFileContentState>,
}

impl TestCollection {
    /// 한 종류의 테스트 식별자를 문서 순서대로 반환합니다.
    pub fn ids(&self, kind: EntityKind) -> Vec<&str> {
        let tests = match kind {
            EntityKind::RpmInfo => &self.rpminfo_tests,
            EntityKind::DpkgInfo => &self.dpkginfo_tests,
            EntityKind::TextFileContent54 => &self.textfilecontent54_tests,
        };
        tests.iter().map(|t| t.id.as_str()).collect()
    }
}

impl ObjectCollection {
    /// 한 종류의 오브젝트 식별자를 문서 순서대로 반환합니다.
    pub fn ids(&self, kind: EntityKind) -> Vec<&str> {
        match kind {
            EntityKind::RpmInfo => self.rpminfo_objects.iter().map(|o| o.id.as_str()).collect(),
            EntityKind::DpkgInfo => self.dpkginfo_objects.iter().map(|o| o.id.as_str()).collect(),
            EntityKind::TextFileContent54 => self
                .textfilecontent54_objects
                .iter()
                .map(|o| o.id.as_str())
                .collect(),
        }
    }
}

impl StateCollection {
    /// 한 종류의 스테이트 식별자를 문서 순서대로 반환합니다.
    pub fn ids(&self, kind: EntityKind) -> Vec<&str> {
        match kind {
            EntityKind::RpmInfo => self.rpminfo_states.iter().map(|s| s.id.as_str()).collect(),
            EntityKind::DpkgInfo => self.dpkginfo_states.iter().map(|s| s.id.as_str()).collect(),
            EntityKind::TextFileContent54 => self
                .textfilecontent54_states
                .iter()
                .map(|s| s.id.as_str())
                .collect(),
        }
    }
}

/// 정의 문서
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OvalDocument {
    /// 정의 목록
    #[serde(default)]
    pub definitions: Vec<Definition>,
    /// 테스트
    #[serde(default)]
    pub tests: TestCollection,
    /// 오브젝트
    #[serde(default)]
    pub objects: ObjectCollection,
    /// 스테이트
    #[serde(default)]
    pub states: StateCollection,
}

impl OvalDocument {
    /// JSON 문자열에서 문서를 파싱합니다.
    pub fn from_json(json: &str) -> Result<Self, OvalEngineError> {
        serde_json::from_str(json).map_err(|e| {
            OvalEngineError::DocumentParse(format!("failed to parse definition document JSON: {e}"))
        })
    }
}
