//! MatchService 통합 테스트
//!
//! 배포용 카탈로그(`data/scenarios.json`)로 순위 매칭, 동점 처리,
//! 신뢰도 가중치 결합, 저장소 장애 시 성능 저하 동작을 검증합니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use atlas_core::{
    AtlasError, ConfidenceRecord, FeatureVector, MatchType, Outcome, OutcomeInput, TieBreak,
    TradeLogEntry,
};
use atlas_engine::{Catalog, ConfidenceStatus, MatchService};
use atlas_store::{
    ConfidenceRepository, ConfidenceStore, MemoryConfidenceRepository, NewTradeLog, RecordUpdate,
    StoreError,
};

const CATALOG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/scenarios.json");

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

fn catalog() -> Catalog {
    Catalog::from_path(CATALOG_PATH).expect("sample catalog should load")
}

fn service() -> MatchService {
    MatchService::new(catalog(), ConfidenceStore::in_memory())
}

fn features_of(id: &str) -> FeatureVector {
    catalog().get(id).expect("scenario exists").features
}

/// 스냅샷 조회는 항상 실패하고, 지정한 시나리오의 단건 조회도 실패하는 저장소.
struct FlakyRepository {
    inner: MemoryConfidenceRepository,
    broken: Vec<String>,
}

#[async_trait]
impl ConfidenceRepository for FlakyRepository {
    async fn find(&self, scenario_id: &str) -> atlas_store::Result<Option<ConfidenceRecord>> {
        if self.broken.iter().any(|id| id == scenario_id) {
            return Err(StoreError::ConnectionError("connection reset".to_string()));
        }
        self.inner.find(scenario_id).await
    }

    async fn find_many(
        &self,
        _scenario_ids: &[String],
    ) -> atlas_store::Result<HashMap<String, ConfidenceRecord>> {
        Err(StoreError::PoolExhausted)
    }

    async fn apply_outcome(
        &self,
        entry: NewTradeLog,
        update: RecordUpdate<'_>,
    ) -> atlas_store::Result<(ConfidenceRecord, TradeLogEntry)> {
        self.inner.apply_outcome(entry, update).await
    }

    async fn list_records(&self) -> atlas_store::Result<Vec<ConfidenceRecord>> {
        self.inner.list_records().await
    }

    async fn recent_trades(&self, limit: usize) -> atlas_store::Result<Vec<TradeLogEntry>> {
        self.inner.recent_trades(limit).await
    }
}

// ============================================================================
// 순위 매칭
// ============================================================================

#[tokio::test]
async fn test_sample_catalog_loads() {
    let catalog = catalog();
    assert_eq!(catalog.len(), 96);
    assert_eq!(catalog.ids()[0], "V-01");
}

#[tokio::test]
async fn test_identical_input_is_exact_best_match() {
    let svc = service();
    let best = svc
        .find_best_match(&features_of("V-01"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(best.scenario.id, "V-01");
    assert_eq!(best.distance, 0.0);
    assert_eq!(best.similarity, 1.0);
    assert_eq!(best.match_type, MatchType::Exact);
    assert_eq!(best.confidence_weight, 1.0);
    assert_eq!(best.confidence_status, ConfidenceStatus::Neutral);
}

#[tokio::test]
async fn test_matches_sorted_and_bounded() {
    let svc = service();
    let input = FeatureVector {
        c1_context: 1,
        c2_action: 1,
        c3_action: 2,
        c4_action: 1,
        c4_close: 1,
        ..FeatureVector::default()
    };

    let matches = svc.find_matches(&input, 10).await.unwrap();
    assert_eq!(matches.len(), 10);
    assert!(matches.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!(matches.iter().all(|m| (0.0..=1.0).contains(&m.distance)));
    assert!(matches
        .iter()
        .all(|m| (m.match_type == MatchType::Exact) == (m.distance == 0.0)));
}

#[tokio::test]
async fn test_top_k_larger_than_catalog_returns_all() {
    let svc = service();
    let matches = svc.find_matches(&features_of("V-01"), 500).await.unwrap();
    assert_eq!(matches.len(), 96);
}

#[tokio::test]
async fn test_repeated_queries_are_identical() {
    let svc = service();
    let input = features_of("PDL-03");

    let first: Vec<(String, f64)> = svc
        .find_matches(&input, 5)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.scenario.id.clone(), m.distance))
        .collect();
    let second: Vec<(String, f64)> = svc
        .find_matches(&input, 5)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.scenario.id.clone(), m.distance))
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_equal_distance_keeps_catalog_order() {
    let svc = service();
    // V-04와 W-14는 같은 참조 벡터
    let matches = svc.find_matches(&features_of("W-14"), 2).await.unwrap();

    let ids: Vec<&str> = matches.iter().map(|m| m.scenario.id.as_str()).collect();
    assert_eq!(ids, vec!["V-04", "W-14"]);
    assert!(matches.iter().all(|m| m.match_type == MatchType::Exact));
}

#[tokio::test]
async fn test_confidence_desc_tie_break() {
    let store = ConfidenceStore::in_memory();
    store
        .log_outcome(OutcomeInput::new("W-14", Outcome::Win, MatchType::Exact, 1.0))
        .await
        .unwrap();

    let svc = MatchService::new(catalog(), store).with_tie_break(TieBreak::ConfidenceDesc);
    let matches = svc.find_matches(&features_of("V-04"), 2).await.unwrap();

    let ids: Vec<&str> = matches.iter().map(|m| m.scenario.id.as_str()).collect();
    assert_eq!(ids, vec!["W-14", "V-04"]);
}

// ============================================================================
// 신뢰도 가중치
// ============================================================================

#[tokio::test]
async fn test_learned_weight_attached_without_reordering() {
    let store = ConfidenceStore::in_memory();
    for _ in 0..10 {
        store
            .log_outcome(OutcomeInput::new("V-02", Outcome::Win, MatchType::Inferred, 0.9))
            .await
            .unwrap();
    }

    let svc = MatchService::new(catalog(), store);
    let matches = svc.find_matches(&features_of("V-01"), 96).await.unwrap();

    assert_eq!(matches[0].scenario.id, "V-01");
    let v02 = matches.iter().find(|m| m.scenario.id == "V-02").unwrap();
    assert_eq!(v02.confidence_status, ConfidenceStatus::Learned);
    assert_eq!(v02.confidence_weight, 1.5);
    assert!((v02.adjusted_score() - v02.similarity * 1.5).abs() < 1e-12);
}

#[tokio::test]
async fn test_store_failure_degrades_to_unknown() {
    let inner = MemoryConfidenceRepository::new();
    let repository = FlakyRepository {
        inner,
        broken: vec!["V-01".to_string()],
    };
    let store = ConfidenceStore::new(Arc::new(repository));
    store
        .log_outcome(OutcomeInput::new("W-14", Outcome::Loss, MatchType::Exact, 1.0))
        .await
        .unwrap();

    let svc = MatchService::new(catalog(), store);

    let best = svc.find_best_match(&features_of("V-01")).await.unwrap().unwrap();
    assert_eq!(best.scenario.id, "V-01");
    assert_eq!(best.confidence_status, ConfidenceStatus::Unknown);
    assert_eq!(best.confidence_weight, 1.0);

    let tied = svc.find_matches(&features_of("V-04"), 3).await.unwrap();
    assert_eq!(tied[0].confidence_status, ConfidenceStatus::Neutral);
    assert_eq!(tied[1].scenario.id, "W-14");
    assert_eq!(tied[1].confidence_status, ConfidenceStatus::Learned);
    assert_eq!(tied[1].confidence_weight, 0.95);
}

// ============================================================================
// 설정 오류
// ============================================================================

#[tokio::test]
async fn test_empty_catalog_is_configuration_condition() {
    let svc = MatchService::new(Catalog::default(), ConfidenceStore::in_memory());
    let input = FeatureVector::default();

    let err = svc.find_matches(&input, 3).await.unwrap_err();
    assert!(matches!(err, AtlasError::EmptyCatalog));
    assert!(err.is_config());
    assert!(svc.find_best_match(&input).await.unwrap().is_none());
}
