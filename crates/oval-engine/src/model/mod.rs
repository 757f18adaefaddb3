//! 정의 문서 데이터 모델
//!
//! - [`definition`]: 정의와 기준 트리 (`Definition`, `Criteria`, `CriteriaNode`)
//! - [`entity`]: 테스트 / 오브젝트 / 스테이트와 종류 태그 핸들
//! - [`document`]: 파싱 협력자가 넘겨주는 문서 컨테이너 (`OvalDocument`)

pub mod definition;
pub mod document;
pub mod entity;

pub use definition::{
    Criteria, CriteriaNode, Criterion, Definition, DefinitionMetadata, ExtendDefinition,
};
pub use document::{ObjectCollection, OvalDocument, StateCollection, TestCollection};
pub use entity::{
    EvrRequirement, ObjectRef, OvalEntity, OvalTest, PackageObject, PackageState, StateRef,
    TestRef, TextFileContentObject, TextFileContentState, TextRequirement,
};
