//! 대시보드 요약 통계.

use atlas_core::{ConfidenceRecord, Outcome, TradeLogEntry};
use serde::Serialize;

/// 가중치 구간 (표시용).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTier {
    /// 1.3 이상
    Strong,
    /// 0.7 초과 1.3 미만
    Neutral,
    /// 0.7 이하
    Weak,
}

impl WeightTier {
    pub fn of(weight: f64) -> Self {
        if weight >= 1.3 {
            WeightTier::Strong
        } else if weight <= 0.7 {
            WeightTier::Weak
        } else {
            WeightTier::Neutral
        }
    }
}

/// 학습 현황 요약.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    /// 최근 구간의 매매 수
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// 최근 구간 승률 (%, 반올림). 매매가 없으면 `None`.
    pub win_rate_pct: Option<u32>,
    /// 가중치 내림차순 레코드
    pub records: Vec<ConfidenceRecord>,
    /// 최근 매매 로그 (시각 내림차순)
    pub recent: Vec<TradeLogEntry>,
}

impl DashboardSummary {
    /// 레코드와 최근 로그로 요약을 계산합니다.
    pub fn new(mut records: Vec<ConfidenceRecord>, recent: Vec<TradeLogEntry>) -> Self {
        records.sort_by(|a, b| b.current_weight.total_cmp(&a.current_weight));

        let total_trades = recent.len();
        let wins = recent.iter().filter(|t| t.outcome == Outcome::Win).count();
        let win_rate_pct = (total_trades > 0)
            .then(|| (wins as f64 / total_trades as f64 * 100.0).round() as u32);

        Self {
            total_trades,
            wins,
            losses: total_trades - wins,
            win_rate_pct,
            records,
            recent,
        }
    }

    /// 가중치 상위 `n`개 시나리오.
    pub fn strongest(&self, n: usize) -> &[ConfidenceRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// 가중치 하위 `n`개 시나리오 (낮은 순).
    ///
    /// 동률은 조회 순서(시나리오 ID 순)를 유지합니다.
    pub fn weakest(&self, n: usize) -> Vec<&ConfidenceRecord> {
        let mut ascending: Vec<&ConfidenceRecord> = self.records.iter().collect();
        ascending.sort_by(|a, b| a.current_weight.total_cmp(&b.current_weight));
        ascending.truncate(n);
        ascending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::MatchType;
    use chrono::Utc;

    fn record(id: &str, weight: f64) -> ConfidenceRecord {
        ConfidenceRecord {
            scenario_id: id.to_string(),
            total_wins: 1,
            total_losses: 0,
            current_weight: weight,
            last_updated: Utc::now(),
        }
    }

    fn trade(id: i64, outcome: Outcome) -> TradeLogEntry {
        TradeLogEntry {
            id,
            scenario_id: "V-01".to_string(),
            outcome,
            loss_reason: None,
            match_type: MatchType::Exact,
            similarity: 1.0,
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn test_weight_tier() {
        assert_eq!(WeightTier::of(1.3), WeightTier::Strong);
        assert_eq!(WeightTier::of(1.0), WeightTier::Neutral);
        assert_eq!(WeightTier::of(0.7), WeightTier::Weak);
    }

    #[test]
    fn test_summary_win_rate() {
        let trades = vec![
            trade(3, Outcome::Win),
            trade(2, Outcome::Loss),
            trade(1, Outcome::Win),
        ];
        let summary = DashboardSummary::new(vec![], trades);
        assert_eq!(summary.total_trades, 3);
        assert_eq!(summary.wins, 2);
        assert_eq!(summary.losses, 1);
        assert_eq!(summary.win_rate_pct, Some(67));
    }

    #[test]
    fn test_summary_empty() {
        let summary = DashboardSummary::new(vec![], vec![]);
        assert_eq!(summary.win_rate_pct, None);
        assert!(summary.strongest(5).is_empty());
    }

    #[test]
    fn test_strongest_and_weakest() {
        let records = vec![record("A", 1.1), record("B", 2.0), record("C", 0.4)];
        let summary = DashboardSummary::new(records, vec![]);

        let strongest: Vec<&str> = summary.strongest(2).iter().map(|r| r.scenario_id.as_str()).collect();
        assert_eq!(strongest, vec!["B", "A"]);

        let weakest: Vec<&str> = summary.weakest(1).iter().map(|r| r.scenario_id.as_str()).collect();
        assert_eq!(weakest, vec!["C"]);
    }

    #[test]
    fn test_weakest_keeps_scan_order_on_ties() {
        // list_records 순서 (시나리오 ID 순)
        let records = vec![
            record("IP-01", 0.8),
            record("PDH-02", 1.2),
            record("V-03", 0.8),
            record("W-01", 0.8),
        ];
        let summary = DashboardSummary::new(records, vec![]);

        let weakest: Vec<&str> = summary.weakest(3).iter().map(|r| r.scenario_id.as_str()).collect();
        assert_eq!(weakest, vec!["IP-01", "V-03", "W-01"]);

        let strongest: Vec<&str> = summary.strongest(2).iter().map(|r| r.scenario_id.as_str()).collect();
        assert_eq!(strongest, vec!["PDH-02", "IP-01"]);
    }
}
