//! 시나리오 카탈로그.
//!
//! 시작 시 한 번 로드되고 이후 읽기 전용으로 공유됩니다.
//! 로드 시점에 다음을 검증합니다:
//! - 빈 ID, 중복 ID
//! - 슬롯 값 범위 (`FeatureVector::validate`)
//!
//! 슬롯 누락은 역직렬화 단계에서 실패합니다.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use atlas_core::{AtlasError, AtlasResult, Category, Scenario};
use serde::Deserialize;
use tracing::{debug, info};

/// TOML 카탈로그 형식 (`[[scenarios]]` 배열).
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    scenarios: Vec<Scenario>,
}

/// 검증된 시나리오 카탈로그.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    scenarios: Vec<Arc<Scenario>>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// 시나리오 목록으로 카탈로그를 생성합니다.
    ///
    /// 입력 순서가 카탈로그 순서가 되며, 동점 정렬에 사용됩니다.
    pub fn new(scenarios: Vec<Scenario>) -> AtlasResult<Self> {
        let mut index = HashMap::with_capacity(scenarios.len());

        for (position, scenario) in scenarios.iter().enumerate() {
            if scenario.id.trim().is_empty() {
                return Err(AtlasError::Config(format!(
                    "scenario at position {} has an empty id",
                    position
                )));
            }
            scenario
                .features
                .validate()
                .map_err(|e| AtlasError::Config(format!("{}: {}", scenario.id, e)))?;
            if index.insert(scenario.id.clone(), position).is_some() {
                return Err(AtlasError::Config(format!(
                    "duplicate scenario id: {}",
                    scenario.id
                )));
            }
        }

        debug!(count = scenarios.len(), "Catalog validated");

        Ok(Self {
            scenarios: scenarios.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    /// JSON 배열에서 카탈로그를 로드합니다.
    pub fn from_json_str(raw: &str) -> AtlasResult<Self> {
        let scenarios: Vec<Scenario> =
            serde_json::from_str(raw).map_err(|e| AtlasError::Config(e.to_string()))?;
        Self::new(scenarios)
    }

    /// `[[scenarios]]` 테이블 배열 형식의 TOML에서 카탈로그를 로드합니다.
    pub fn from_toml_str(raw: &str) -> AtlasResult<Self> {
        let catalog: TomlCatalog =
            toml::from_str(raw).map_err(|e| AtlasError::Config(e.to_string()))?;
        Self::new(catalog.scenarios)
    }

    /// 파일에서 카탈로그를 로드합니다. 확장자가 `.toml`이면 TOML, 그 외는 JSON.
    pub fn from_path<P: AsRef<Path>>(path: P) -> AtlasResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AtlasError::Config(format!("{}: {}", path.display(), e)))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let catalog = if is_toml {
            Self::from_toml_str(&raw)
        } else {
            Self::from_json_str(&raw)
        }?;

        info!(path = %path.display(), scenarios = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// 카탈로그 순서로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scenario>> {
        self.scenarios.iter()
    }

    /// ID로 시나리오를 조회합니다.
    pub fn get(&self, id: &str) -> Option<&Arc<Scenario>> {
        self.index.get(id).map(|&position| &self.scenarios[position])
    }

    /// 카탈로그 순서의 시나리오 ID 목록.
    pub fn ids(&self) -> Vec<String> {
        self.scenarios.iter().map(|s| s.id.clone()).collect()
    }

    /// 분류별 시나리오 (카탈로그 순서).
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Arc<Scenario>> {
        self.scenarios
            .iter()
            .filter(move |scenario| scenario.category == category)
    }
}
