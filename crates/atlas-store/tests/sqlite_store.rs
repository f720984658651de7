//! SQLite 백엔드 통합 테스트
//!
//! 임시 디렉터리의 데이터베이스 파일로 영속성, 학습 규칙, 로그 정렬,
//! 프로세스 간 동시 기록을 검증합니다.

use atlas_core::{DatabaseConfig, MatchType, Outcome, OutcomeInput};
use atlas_store::ConfidenceStore;
use tempfile::TempDir;

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

fn config_for(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("state").join("atlas.db").display()),
        ..DatabaseConfig::default()
    }
}

fn win(id: &str) -> OutcomeInput {
    OutcomeInput::new(id, Outcome::Win, MatchType::Exact, 1.0)
}

fn loss(id: &str, reason: &str) -> OutcomeInput {
    OutcomeInput::new(id, Outcome::Loss, MatchType::Inferred, 0.8125).with_loss_reason(reason)
}

// ============================================================================
// 영속성
// ============================================================================

#[tokio::test]
async fn test_outcome_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);

    {
        let store = ConfidenceStore::open(&config).await.unwrap();
        store.log_outcome(win("V-01")).await.unwrap();
        store.log_outcome(loss("W-03", "News spike")).await.unwrap();
    }

    let reopened = ConfidenceStore::open(&config).await.unwrap();

    let record = reopened.get_record("V-01").await.unwrap().unwrap();
    assert_eq!((record.total_wins, record.total_losses), (1, 0));
    assert_eq!(record.current_weight, 1.05);
    assert_eq!(reopened.get_weight("W-03").await.unwrap(), 0.95);

    let trades = reopened.recent_trades(10).await.unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].scenario_id, "W-03");
    assert_eq!(trades[0].loss_reason.as_deref(), Some("News spike"));
    assert_eq!(trades[0].similarity, 0.8125);
    assert_eq!(trades[1].scenario_id, "V-01");
    assert_eq!(trades[1].match_type, MatchType::Exact);
}

#[tokio::test]
async fn test_reopen_runs_migrations_idempotently() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);

    for _ in 0..3 {
        let store = ConfidenceStore::open(&config).await.unwrap();
        store.log_outcome(win("V-02")).await.unwrap();
    }

    let store = ConfidenceStore::open(&config).await.unwrap();
    let record = store.get_record("V-02").await.unwrap().unwrap();
    assert_eq!(record.total_wins, 3);
    assert_eq!(record.current_weight, 1.15);
}

// ============================================================================
// 학습 규칙
// ============================================================================

#[tokio::test]
async fn test_three_wins_two_losses() {
    let dir = TempDir::new().unwrap();
    let store = ConfidenceStore::open(&config_for(&dir)).await.unwrap();

    store.log_outcome(win("PDH-01")).await.unwrap();
    store.log_outcome(win("PDH-01")).await.unwrap();
    store.log_outcome(loss("PDH-01", "Fake breakout")).await.unwrap();
    store.log_outcome(win("PDH-01")).await.unwrap();
    let record = store.log_outcome(loss("PDH-01", "Chop")).await.unwrap();

    assert_eq!((record.total_wins, record.total_losses), (3, 2));
    assert_eq!(record.current_weight, 1.05);

    let outcomes: Vec<Outcome> = store
        .recent_trades(10)
        .await
        .unwrap()
        .into_iter()
        .rev()
        .map(|t| t.outcome)
        .collect();
    assert_eq!(
        outcomes,
        vec![Outcome::Win, Outcome::Win, Outcome::Loss, Outcome::Win, Outcome::Loss]
    );
}

#[tokio::test]
async fn test_snapshot_and_listing() {
    let dir = TempDir::new().unwrap();
    let store = ConfidenceStore::open(&config_for(&dir)).await.unwrap();

    store.log_outcome(win("W-02")).await.unwrap();
    store.log_outcome(loss("IP-01", "Range day")).await.unwrap();

    let ids = vec!["IP-01".to_string(), "W-02".to_string(), "V-09".to_string()];
    let weights = store.weights_snapshot(&ids).await.unwrap();
    assert_eq!(weights.len(), 2);
    assert_eq!(weights.get("IP-01"), Some(&0.95));
    assert!(store.weights_snapshot(&[]).await.unwrap().is_empty());

    let listed: Vec<String> = store
        .list_records()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.scenario_id)
        .collect();
    assert_eq!(listed, vec!["IP-01", "W-02"]);
}

#[tokio::test]
async fn test_recent_trades_limit_newest_first() {
    let dir = TempDir::new().unwrap();
    let store = ConfidenceStore::open(&config_for(&dir)).await.unwrap();

    for id in ["V-01", "V-02", "V-03", "V-04"] {
        store.log_outcome(win(id)).await.unwrap();
    }

    let trades = store.recent_trades(3).await.unwrap();
    let ids: Vec<&str> = trades.iter().map(|t| t.scenario_id.as_str()).collect();
    assert_eq!(ids, vec!["V-04", "V-03", "V-02"]);
    assert!(trades.windows(2).all(|w| w[0].id > w[1].id));
}

// ============================================================================
// 동시 기록
// ============================================================================

/// 서로 다른 프로세스처럼 키별 Lock을 공유하지 않는 두 저장소가
/// 같은 시나리오의 첫 결과를 동시에 기록합니다.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_stores_serialize_first_outcome() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let first = ConfidenceStore::open(&config).await.unwrap();
    let second = ConfidenceStore::open(&config).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let store = if i % 2 == 0 { first.clone() } else { second.clone() };
        tasks.push(tokio::spawn(async move { store.log_outcome(win("V-05")).await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let record = first.get_record("V-05").await.unwrap().unwrap();
    assert_eq!(record.total_wins, 20);
    assert_eq!(record.total_losses, 0);
    assert_eq!(first.recent_trades(100).await.unwrap().len(), 20);
}
