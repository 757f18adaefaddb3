//! 엔티티 레지스트리 -- 식별자로 정의 / 테스트 / 오브젝트 / 스테이트 조회
//!
//! [`Registry`]는 문서를 소유하고, 생성 시 종류별 컬렉션을 가로지르는
//! 해시 인덱스를 구축합니다. 생성 이후에는 읽기 전용이므로 잠금 없이 공유됩니다.
//!
//! # 조회 규칙
//!
//! - 모든 조회는 RPM-info, DPKG-info, textfilecontent54 순서로 첫 번째 일치를 반환합니다.
//! - 같은 식별자가 여러 변형에 있으면 앞선 변형이 이기고 경고를 남깁니다.
//! - 존재하지 않는 식별자는 `None`이며, 이 계층에서는 에러가 아닙니다.
//!
//! # 순환 탐지
//!
//! extend_definition 참조로 자기 자신에게 돌아오는 정의는 생성 시 계산되어
//! [`Registry::is_cyclic`]로 조회됩니다.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::error::OvalEngineError;
use crate::model::{
    Definition, ObjectCollection, ObjectRef, OvalDocument, StateCollection, StateRef,
    TestCollection, TestRef,
};
use crate::types::EntityKind;

/// 종류와 컬렉션 내 위치
type Slot = (EntityKind, usize);

/// 읽기 전용 엔티티 레지스트리
#[derive(Debug)]
pub struct Registry {
    definitions: Vec<Definition>,
    tests: TestCollection,
    objects: ObjectCollection,
    states: StateCollection,
    definition_index: HashMap<String, usize>,
    test_index: HashMap<String, Slot>,
    object_index: HashMap<String, Slot>,
    state_index: HashMap<String, Slot>,
    cyclic: HashSet<String>,
}

impl Registry {
    /// 문서로 레지스트리를 생성하고 인덱스를 구축합니다.
    pub fn new(document: OvalDocument) -> Self {
        let OvalDocument {
            definitions,
            tests,
            objects,
            states,
        } = document;

        let mut definition_index = HashMap::with_capacity(definitions.len());
        for (idx, def) in definitions.iter().enumerate() {
            match definition_index.entry(def.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                }
                Entry::Occupied(_) => {
                    warn!(id = %def.id, "duplicate definition identifier, keeping first");
                }
            }
        }

        let mut test_index = HashMap::new();
        let mut object_index = HashMap::new();
        let mut state_index = HashMap::new();
        for kind in EntityKind::LOOKUP_ORDER {
            index_kind(&mut test_index, "test", kind, tests.ids(kind));
            index_kind(&mut object_index, "object", kind, objects.ids(kind));
            index_kind(&mut state_index, "state", kind, states.ids(kind));
        }

        let cyclic = find_cyclic_definitions(&definitions, &definition_index);
        for id in &cyclic {
            warn!(id = %id, "definition is part of an extend_definition cycle");
        }

        info!(
            definitions = definitions.len(),
            tests = test_index.len(),
            objects = object_index.len(),
            states = state_index.len(),
            cyclic = cyclic.len(),
            "entity registry built"
        );

        Self {
            definitions,
            tests,
            objects,
            states,
            definition_index,
            test_index,
            object_index,
            state_index,
            cyclic,
        }
    }

    /// JSON 문서에서 레지스트리를 생성합니다.
    pub fn from_json(json: &str) -> Result<Self, OvalEngineError> {
        Ok(Self::new(OvalDocument::from_json(json)?))
    }

    /// 정의를 조회합니다.
    pub fn lookup_definition(&self, id: &str) -> Option<&Definition> {
        self.definition_index
            .get(id)
            .and_then(|idx| self.definitions.get(*idx))
    }

    /// 테스트를 조회합니다.
    pub fn lookup_test(&self, id: &str) -> Option<TestRef<'_>> {
        let (kind, idx) = *self.test_index.get(id)?;
        let tests = match kind {
            EntityKind::RpmInfo => &self.tests.rpminfo_tests,
            EntityKind::DpkgInfo => &self.tests.dpkginfo_tests,
            EntityKind::TextFileContent54 => &self.tests.textfilecontent54_tests,
        };
        tests.get(idx).map(|test| TestRef::new(kind, test))
    }

    /// 오브젝트를 조회합니다.
    pub fn lookup_object(&self, id: &str) -> Option<ObjectRef<'_>> {
        let (kind, idx) = *self.object_index.get(id)?;
        match kind {
            EntityKind::RpmInfo => self.objects.rpminfo_objects.get(idx).map(ObjectRef::RpmInfo),
            EntityKind::DpkgInfo => self.objects.dpkginfo_objects.get(idx).map(ObjectRef::DpkgInfo),
            EntityKind::TextFileContent54 => self
                .objects
                .textfilecontent54_objects
                .get(idx)
                .map(ObjectRef::TextFileContent54),
        }
    }

    /// 스테이트를 조회합니다.
    pub fn lookup_state(&self, id: &str) -> Option<StateRef<'_>> {
        let (kind, idx) = *self.state_index.get(id)?;
        match kind {
            EntityKind::RpmInfo => self.states.rpminfo_states.get(idx).map(StateRef::RpmInfo),
            EntityKind::DpkgInfo => self.states.dpkginfo_states.get(idx).map(StateRef::DpkgInfo),
            EntityKind::TextFileContent54 => self
                .states
                .textfilecontent54_states
                .get(idx)
                .map(StateRef::TextFileContent54),
        }
    }

    /// 문서 순서대로 모든 정의를 순회합니다.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter()
    }

    /// 정의 수
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// 인덱싱된 테스트 수 (중복 식별자 제외)
    pub fn test_count(&self) -> usize {
        self.test_index.len()
    }

    /// 정의가 extend_definition 순환에 속하는지 확인합니다.
    pub fn is_cyclic(&self, definition_id: &str) -> bool {
        self.cyclic.contains(definition_id)
    }

    /// 순환에 속한 정의 식별자 목록
    pub fn cyclic_definitions(&self) -> impl Iterator<Item = &str> {
        self.cyclic.iter().map(String::as_str)
    }
}

/// 한 종류의 컬렉션을 인덱스에 추가합니다. 이미 있는 식별자는 건너뜁니다.
fn index_kind(
    index: &mut HashMap<String, Slot>,
    entity: &'static str,
    kind: EntityKind,
    ids: Vec<&str>,
) {
    for (idx, id) in ids.into_iter().enumerate() {
        match index.entry(id.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert((kind, idx));
            }
            Entry::Occupied(existing) => {
                warn!(
                    entity,
                    id = %id,
                    kept = %existing.get().0,
                    ignored = %kind,
                    "duplicate identifier across kinds, keeping first"
                );
            }
        }
    }
}

/// 자기 자신으로 돌아오는 extend 경로가 있는 정의를 찾습니다.
fn find_cyclic_definitions(
    definitions: &[Definition],
    index: &HashMap<String, usize>,
) -> HashSet<String> {
    let edges: Vec<Vec<usize>> = definitions
        .iter()
        .map(|def| {
            def.criteria
                .extend_refs()
                .into_iter()
                .filter_map(|r| index.get(r).copied())
                .collect()
        })
        .collect();

    let mut cyclic = HashSet::new();
    for (start, def) in definitions.iter().enumerate() {
        let mut visited = vec![false; definitions.len()];
        let mut stack: Vec<usize> = edges[start].clone();
        while let Some(node) = stack.pop() {
            if node == start {
                cyclic.insert(def.id.clone());
                break;
            }
            if !visited[node] {
                visited[node] = true;
                stack.extend(edges[node].iter().copied());
            }
        }
    }
    cyclic
}
