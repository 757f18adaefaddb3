//! 시스템 인벤토리 -- 평가에 필요한 호스트 사실(fact) 제공
//!
//! 실제 패키지 DB 수집은 외부 협력자의 몫입니다. 엔진은 [`SystemInventory`]
//! trait을 통해서만 설치 패키지와 파일 내용을 조회합니다.
//! [`StaticInventory`]는 미리 수집된 사실을 메모리에 보관하는 구현입니다.
//!
//! # JSON 형식
//!
//! ```json
//! {
//!   "rpm_packages": [ { "name": "openssl", "evr": "1:3.0.7-24.el9", "arch": "x86_64" } ],
//!   "dpkg_packages": [],
//!   "files": { "/etc/redhat-release": "Red Hat Enterprise Linux release 9.3 (Plow)\n" }
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OvalEngineError;
use crate::types::PackageFormat;

/// 설치된 패키지 한 건
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// 패키지 이름
    pub name: String,
    /// 설치된 EVR
    pub evr: String,
    /// 아키텍처
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl InstalledPackage {
    /// 아키텍처 없이 패키지를 생성합니다.
    pub fn new(name: impl Into<String>, evr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            evr: evr.into(),
            arch: None,
        }
    }

    /// 아키텍처를 설정합니다.
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }
}

/// 호스트 인벤토리 조회 인터페이스
///
/// 여러 평가 스레드에서 동시에 호출되므로 `Send + Sync`여야 합니다.
pub trait SystemInventory: Send + Sync {
    /// 이름이 일치하는 설치 패키지를 모두 반환합니다 (다중 아키텍처 포함).
    fn installed_packages(
        &self,
        format: PackageFormat,
        name: &str,
    ) -> Result<Vec<InstalledPackage>, OvalEngineError>;

    /// 파일 내용을 반환합니다. 파일이 없으면 `None`입니다.
    fn file_content(&self, path: &str) -> Result<Option<String>, OvalEngineError>;
}

/// 메모리 내 인벤토리
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticInventory {
    /// RPM 패키지
    #[serde(default)]
    pub rpm_packages: Vec<InstalledPackage>,
    /// DPKG 패키지
    #[serde(default)]
    pub dpkg_packages: Vec<InstalledPackage>,
    /// 경로별 파일 내용
    #[serde(default)]
    pub files: HashMap<String, String>,
}

impl StaticInventory {
    /// 빈 인벤토리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 패키지를 추가합니다.
    pub fn with_package(mut self, format: PackageFormat, package: InstalledPackage) -> Self {
        match format {
            PackageFormat::Rpm => self.rpm_packages.push(package),
            PackageFormat::Dpkg => self.dpkg_packages.push(package),
        }
        self
    }

    /// 파일 내용을 추가합니다.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// JSON 문자열에서 인벤토리를 파싱합니다.
    pub fn from_json(json: &str) -> Result<Self, OvalEngineError> {
        let inventory: Self = serde_json::from_str(json).map_err(|e| {
            OvalEngineError::Inventory(format!("failed to parse inventory JSON: {e}"))
        })?;
        debug!(
            packages = inventory.package_count(),
            files = inventory.files.len(),
            "static inventory loaded"
        );
        Ok(inventory)
    }

    /// 전체 패키지 수
    pub fn package_count(&self) -> usize {
        self.rpm_packages.len() + self.dpkg_packages.len()
    }
}

impl SystemInventory for StaticInventory {
    fn installed_packages(
        &self,
        format: PackageFormat,
        name: &str,
    ) -> Result<Vec<InstalledPackage>, OvalEngineError> {
        let packages = match format {
            PackageFormat::Rpm => &self.rpm_packages,
            PackageFormat::Dpkg => &self.dpkg_packages,
        };
        Ok(packages.iter().filter(|p| p.name == name).cloned().collect())
    }

    fn file_content(&self, path: &str) -> Result<Option<String>, OvalEngineError> {
        Ok(self.files.get(path).cloned())
    }
}
