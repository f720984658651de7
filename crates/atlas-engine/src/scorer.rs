//! 유사도 계산기.
//!
//! 입력 피처 벡터와 참조 벡터 사이의 가중 정규화 거리(0~1)를 계산합니다.
//!
//! # 계산
//!
//! 1. 슬롯별 불일치: `|a - b| / domain_max(slot)` (0~1)
//! 2. 슬롯별 중요도를 곱해 합산
//! 3. 중요도 합으로 나눔 (가중 평균이므로 항상 0~1)
//!
//! # 중요도
//!
//! | 슬롯 | C1 | C2 | C3 | C4 |
//! |------|----|----|----|----|
//! | context / action | 2.5 | 2.0 | 2.0 | 1.5 |
//! | behavior / close | 1.5 | 1.5 | 1.5 | 1.0 |
//! | qualifier | - | 1.2 | 1.2 | 1.0 |
//!
//! 한정자는 구조 슬롯이 이미 다를 때 순위를 뒤집지 못하도록 낮게 둡니다.
//! C4는 셋업을 정의하기보다 다듬는 캔들이므로 앞 단계보다 낮습니다.

use atlas_core::{FeatureSlot, FeatureVector, MatchType};
use serde::Serialize;

/// 소수점 4자리 반올림.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// 슬롯별 중요도.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotWeights {
    pub c1_context: f64,
    pub c1_behavior: f64,
    pub c2_action: f64,
    pub c2_close: f64,
    pub c2_qualifier: f64,
    pub c3_action: f64,
    pub c3_close: f64,
    pub c3_qualifier: f64,
    pub c4_action: f64,
    pub c4_close: f64,
    pub c4_qualifier: f64,
}

impl Default for SlotWeights {
    fn default() -> Self {
        Self {
            c1_context: 2.5,
            c1_behavior: 1.5,
            c2_action: 2.0,
            c2_close: 1.5,
            c2_qualifier: 1.2, // 보조 신호
            c3_action: 2.0,
            c3_close: 1.5,
            c3_qualifier: 1.2,
            c4_action: 1.5,
            c4_close: 1.0,
            c4_qualifier: 1.0,
        }
    }
}

impl SlotWeights {
    /// 슬롯의 중요도를 반환합니다.
    pub fn weight(&self, slot: FeatureSlot) -> f64 {
        match slot {
            FeatureSlot::C1Context => self.c1_context,
            FeatureSlot::C1Behavior => self.c1_behavior,
            FeatureSlot::C2Action => self.c2_action,
            FeatureSlot::C2Close => self.c2_close,
            FeatureSlot::C2Qualifier => self.c2_qualifier,
            FeatureSlot::C3Action => self.c3_action,
            FeatureSlot::C3Close => self.c3_close,
            FeatureSlot::C3Qualifier => self.c3_qualifier,
            FeatureSlot::C4Action => self.c4_action,
            FeatureSlot::C4Close => self.c4_close,
            FeatureSlot::C4Qualifier => self.c4_qualifier,
        }
    }

    /// 중요도 합계.
    pub fn total(&self) -> f64 {
        FeatureSlot::ALL.iter().map(|&slot| self.weight(slot)).sum()
    }
}

/// 단일 참조 벡터에 대한 점수.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    /// 가중 정규화 거리 (0~1)
    pub distance: f64,
    /// `1 - distance`, 소수점 4자리 반올림
    pub similarity: f64,
    /// 거리가 정확히 0이면 exact
    pub match_type: MatchType,
}

/// 슬롯별 거리 기여도.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotContribution {
    pub slot: FeatureSlot,
    pub input: u8,
    pub reference: u8,
    /// 정규화 불일치 (0~1)
    pub disagreement: f64,
    /// 최종 거리에 더해진 몫 (`disagreement × weight / total_weight`)
    pub share: f64,
}

/// 가중 정규화 거리 계산기.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    weights: SlotWeights,
    total_weight: f64,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(SlotWeights::default())
    }
}

impl SimilarityScorer {
    /// 주어진 중요도로 계산기를 생성합니다.
    pub fn new(weights: SlotWeights) -> Self {
        let total_weight = weights.total();
        Self {
            weights,
            total_weight,
        }
    }

    /// 중요도 설정을 반환합니다.
    pub fn weights(&self) -> &SlotWeights {
        &self.weights
    }

    fn disagreement(slot: FeatureSlot, a: u8, b: u8) -> f64 {
        f64::from(a.abs_diff(b)) / f64::from(slot.domain_max())
    }

    /// 두 벡터의 가중 정규화 거리를 계산합니다.
    pub fn distance(&self, input: &FeatureVector, reference: &FeatureVector) -> f64 {
        let weighted: f64 = FeatureSlot::ALL
            .iter()
            .map(|&slot| {
                Self::disagreement(slot, input.get(slot), reference.get(slot))
                    * self.weights.weight(slot)
            })
            .sum();
        weighted / self.total_weight
    }

    /// 거리, 유사도, 매칭 분류를 계산합니다.
    pub fn score(&self, input: &FeatureVector, reference: &FeatureVector) -> Score {
        let distance = self.distance(input, reference);
        Score {
            distance,
            similarity: round4(1.0 - distance),
            match_type: MatchType::from_distance(distance),
        }
    }

    /// 슬롯별 기여도를 계산합니다 (불일치 슬롯만).
    pub fn explain(&self, input: &FeatureVector, reference: &FeatureVector) -> Vec<SlotContribution> {
        FeatureSlot::ALL
            .iter()
            .filter(|&&slot| input.get(slot) != reference.get(slot))
            .map(|&slot| {
                let disagreement = Self::disagreement(slot, input.get(slot), reference.get(slot));
                SlotContribution {
                    slot,
                    input: input.get(slot),
                    reference: reference.get(slot),
                    disagreement,
                    share: disagreement * self.weights.weight(slot) / self.total_weight,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v01() -> FeatureVector {
        FeatureVector {
            c1_context: 0,
            c1_behavior: 0,
            c2_action: 2,
            c2_close: 0,
            c2_qualifier: 0,
            c3_action: 1,
            c3_close: 0,
            c3_qualifier: 0,
            c4_action: 3,
            c4_close: 1,
            c4_qualifier: 0,
        }
    }

    fn arb_vector() -> impl Strategy<Value = FeatureVector> {
        (
            (0u8..=2, 0u8..=2),
            (0u8..=3, 0u8..=2, 0u8..=6),
            (0u8..=3, 0u8..=2, 0u8..=6),
            (0u8..=3, 0u8..=2, 0u8..=6),
        )
            .prop_map(|((c1c, c1b), (c2a, c2c, c2q), (c3a, c3c, c3q), (c4a, c4c, c4q))| {
                FeatureVector {
                    c1_context: c1c,
                    c1_behavior: c1b,
                    c2_action: c2a,
                    c2_close: c2c,
                    c2_qualifier: c2q,
                    c3_action: c3a,
                    c3_close: c3c,
                    c3_qualifier: c3q,
                    c4_action: c4a,
                    c4_close: c4c,
                    c4_qualifier: c4q,
                }
            })
    }

    #[test]
    fn test_total_weight() {
        assert!((SlotWeights::default().total() - 16.9).abs() < 1e-9);
    }

    #[test]
    fn test_self_distance_is_exact() {
        let scorer = SimilarityScorer::default();
        let score = scorer.score(&v01(), &v01());
        assert_eq!(score.distance, 0.0);
        assert_eq!(score.similarity, 1.0);
        assert_eq!(score.match_type, MatchType::Exact);
    }

    #[test]
    fn test_single_slot_distance() {
        let scorer = SimilarityScorer::default();
        let mut other = v01();
        other.c1_context = 2; // 최대 불일치, 가중치 2.5

        let distance = scorer.distance(&v01(), &other);
        assert!((distance - 2.5 / 16.9).abs() < 1e-12);

        let score = scorer.score(&v01(), &other);
        assert_eq!(score.match_type, MatchType::Inferred);
        assert_eq!(score.similarity, 0.8521);
    }

    #[test]
    fn test_qualifier_refines_but_does_not_dominate() {
        let scorer = SimilarityScorer::default();
        let base = v01();

        let mut qualifier_only = base;
        qualifier_only.c3_qualifier = 6;

        let mut structural = base;
        structural.c3_action = 2;

        // 한정자 최대 불일치(1.2)가 구조 슬롯 1단계 불일치(2.0 × 1/3)보다 크지만
        // 여전히 C1 컨텍스트 최대 불일치보다는 작아야 합니다
        let mut context = base;
        context.c1_context = 2;

        assert!(scorer.distance(&base, &qualifier_only) < scorer.distance(&base, &context));
        assert!(scorer.distance(&base, &structural) < scorer.distance(&base, &qualifier_only));
    }

    #[test]
    fn test_explain_lists_differing_slots() {
        let scorer = SimilarityScorer::default();
        let mut other = v01();
        other.c4_close = 2;
        other.c2_qualifier = 3;

        let contributions = scorer.explain(&v01(), &other);
        let slots: Vec<FeatureSlot> = contributions.iter().map(|c| c.slot).collect();
        assert_eq!(slots, vec![FeatureSlot::C2Qualifier, FeatureSlot::C4Close]);

        let total: f64 = contributions.iter().map(|c| c.share).sum();
        assert!((total - scorer.distance(&v01(), &other)).abs() < 1e-12);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(a in arb_vector(), b in arb_vector()) {
            let scorer = SimilarityScorer::default();
            prop_assert_eq!(scorer.distance(&a, &b), scorer.distance(&b, &a));
        }

        #[test]
        fn prop_distance_in_unit_interval(a in arb_vector(), b in arb_vector()) {
            let scorer = SimilarityScorer::default();
            let d = scorer.distance(&a, &b);
            prop_assert!((0.0..=1.0).contains(&d));
        }

        #[test]
        fn prop_self_distance_zero(a in arb_vector()) {
            let scorer = SimilarityScorer::default();
            let score = scorer.score(&a, &a);
            prop_assert_eq!(score.distance, 0.0);
            prop_assert_eq!(score.similarity, 1.0);
            prop_assert_eq!(score.match_type, MatchType::Exact);
        }
    }
}
