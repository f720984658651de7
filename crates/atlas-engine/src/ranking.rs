//! 순위 매칭 서비스.
//!
//! 입력 벡터를 카탈로그 전체와 비교해 거리 오름차순으로 정렬하고,
//! 각 결과에 신뢰도 가중치를 붙여 반환합니다.
//!
//! 가중치는 한 번의 스냅샷 조회로 읽어 한 번의 순위 계산이 같은 시점을
//! 보도록 합니다. 스냅샷 조회가 실패하면 시나리오별 조회로 대체하고,
//! 그마저 실패한 시나리오는 `Unknown` 상태의 중립 가중치로 표시합니다.
//! 가중치는 순서에 영향을 주지 않습니다 (`TieBreak::ConfidenceDesc` 동점 처리 제외).

use std::collections::HashMap;
use std::sync::Arc;

use atlas_core::{
    AtlasError, AtlasResult, FeatureVector, MatchType, Observation, Scenario, TieBreak,
};
use atlas_store::{ConfidenceStore, NEUTRAL_WEIGHT};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::catalog::Catalog;
use crate::scorer::{Score, SimilarityScorer, SlotContribution};

/// 신뢰도 가중치의 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceStatus {
    /// 학습 기록 있음
    Learned,
    /// 기록 없음 (1.0)
    Neutral,
    /// 조회 실패 (1.0으로 표시)
    Unknown,
}

impl ConfidenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceStatus::Learned => "learned",
            ConfidenceStatus::Neutral => "neutral",
            ConfidenceStatus::Unknown => "unknown",
        }
    }
}

/// 순위가 매겨진 매칭 결과. 조회마다 새로 생성되며 저장되지 않습니다.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    pub scenario: Arc<Scenario>,
    pub distance: f64,
    pub similarity: f64,
    pub match_type: MatchType,
    pub confidence_weight: f64,
    pub confidence_status: ConfidenceStatus,
}

impl RankedMatch {
    /// 표시용 점수 (`similarity × confidence_weight`). 정렬에는 쓰이지 않습니다.
    pub fn adjusted_score(&self) -> f64 {
        self.similarity * self.confidence_weight
    }
}

/// 카탈로그 매칭 서비스.
#[derive(Clone)]
pub struct MatchService {
    catalog: Arc<Catalog>,
    scorer: SimilarityScorer,
    store: ConfidenceStore,
    tie_break: TieBreak,
}

impl MatchService {
    /// 기본 중요도와 카탈로그 순서 동점 처리로 생성합니다.
    pub fn new(catalog: Catalog, store: ConfidenceStore) -> Self {
        Self {
            catalog: Arc::new(catalog),
            scorer: SimilarityScorer::default(),
            store,
            tie_break: TieBreak::default(),
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_scorer(mut self, scorer: SimilarityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &ConfidenceStore {
        &self.store
    }

    /// ID로 시나리오를 조회합니다.
    pub fn scenario(&self, id: &str) -> AtlasResult<Arc<Scenario>> {
        self.catalog
            .get(id)
            .cloned()
            .ok_or_else(|| AtlasError::NotFound(format!("scenario {}", id)))
    }

    /// 카탈로그 전체 (카탈로그 순서).
    pub fn scenarios(&self) -> impl Iterator<Item = &Arc<Scenario>> {
        self.catalog.iter()
    }

    /// 입력과 가장 가까운 `top_k`개 시나리오를 거리 오름차순으로 반환합니다.
    ///
    /// 거리가 같으면 카탈로그 순서를 유지합니다.
    /// `top_k`가 카탈로그 크기보다 크면 전체를 반환합니다.
    #[instrument(skip(self, input))]
    pub async fn find_matches(
        &self,
        input: &FeatureVector,
        top_k: usize,
    ) -> AtlasResult<Vec<RankedMatch>> {
        if top_k == 0 {
            return Err(AtlasError::InvalidInput("top_k must be positive".to_string()));
        }
        if self.catalog.is_empty() {
            return Err(AtlasError::EmptyCatalog);
        }
        input
            .validate()
            .map_err(|e| AtlasError::InvalidInput(e.to_string()))?;

        let mut scored: Vec<(Arc<Scenario>, Score)> = self
            .catalog
            .iter()
            .map(|scenario| (scenario.clone(), self.scorer.score(input, &scenario.features)))
            .collect();

        // 안정 정렬: 동점은 카탈로그 순서
        scored.sort_by(|a, b| a.1.distance.total_cmp(&b.1.distance));

        let ranked = match self.tie_break {
            TieBreak::CatalogOrder => {
                scored.truncate(top_k);
                let weights = self.load_weights(&scored).await;
                attach(scored, &weights)
            }
            TieBreak::ConfidenceDesc => {
                let weights = self.load_weights(&scored).await;
                let mut ranked = attach(scored, &weights);
                ranked.sort_by(|a, b| {
                    a.distance
                        .total_cmp(&b.distance)
                        .then_with(|| b.confidence_weight.total_cmp(&a.confidence_weight))
                });
                ranked.truncate(top_k);
                ranked
            }
        };

        debug!(
            returned = ranked.len(),
            best = ranked.first().map(|m| m.scenario.id.as_str()),
            "Matches ranked"
        );

        Ok(ranked)
    }

    /// 가장 가까운 시나리오 하나. 카탈로그가 비어 있으면 `None`.
    pub async fn find_best_match(&self, input: &FeatureVector) -> AtlasResult<Option<RankedMatch>> {
        match self.find_matches(input, 1).await {
            Ok(mut matches) => Ok(matches.pop()),
            Err(AtlasError::EmptyCatalog) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 관측값을 인코딩한 뒤 매칭합니다.
    pub async fn match_observation(
        &self,
        observation: &Observation,
        top_k: usize,
    ) -> AtlasResult<Vec<RankedMatch>> {
        self.find_matches(&observation.encode(), top_k).await
    }

    /// 입력과 시나리오 사이의 슬롯별 거리 기여도.
    pub fn explain(&self, input: &FeatureVector, scenario_id: &str) -> AtlasResult<Vec<SlotContribution>> {
        let scenario = self.scenario(scenario_id)?;
        Ok(self.scorer.explain(input, &scenario.features))
    }

    /// 후보 시나리오의 가중치와 상태를 조회합니다. 실패하지 않습니다.
    async fn load_weights(
        &self,
        scored: &[(Arc<Scenario>, Score)],
    ) -> HashMap<String, (f64, ConfidenceStatus)> {
        let ids: Vec<String> = scored.iter().map(|(s, _)| s.id.clone()).collect();

        match self.store.weights_snapshot(&ids).await {
            Ok(snapshot) => ids
                .into_iter()
                .map(|id| {
                    let entry = match snapshot.get(&id) {
                        Some(&weight) => (weight, ConfidenceStatus::Learned),
                        None => (NEUTRAL_WEIGHT, ConfidenceStatus::Neutral),
                    };
                    (id, entry)
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Weight snapshot failed, falling back to per-scenario lookups");

                let lookups = ids.iter().map(|id| self.store.get_record(id));
                let results = join_all(lookups).await;

                ids.into_iter()
                    .zip(results)
                    .map(|(id, result)| {
                        let entry = match result {
                            Ok(Some(record)) => (record.current_weight, ConfidenceStatus::Learned),
                            Ok(None) => (NEUTRAL_WEIGHT, ConfidenceStatus::Neutral),
                            Err(e) => {
                                warn!(scenario_id = %id, error = %e, "Weight lookup failed");
                                (NEUTRAL_WEIGHT, ConfidenceStatus::Unknown)
                            }
                        };
                        (id, entry)
                    })
                    .collect()
            }
        }
    }
}

fn attach(
    scored: Vec<(Arc<Scenario>, Score)>,
    weights: &HashMap<String, (f64, ConfidenceStatus)>,
) -> Vec<RankedMatch> {
    scored
        .into_iter()
        .map(|(scenario, score)| {
            let (confidence_weight, confidence_status) = weights
                .get(&scenario.id)
                .copied()
                .unwrap_or((NEUTRAL_WEIGHT, ConfidenceStatus::Unknown));
            RankedMatch {
                scenario,
                distance: score.distance,
                similarity: score.similarity,
                match_type: score.match_type,
                confidence_weight,
                confidence_status,
            }
        })
        .collect()
}
