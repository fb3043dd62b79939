use std::cmp::Ordering;

use crate::model::UndefinedAuc;

#[derive(Debug, Clone, PartialEq)]
pub enum RocAuc {
    Defined(f64),
    /// One class is absent, so no positive/negative pair exists to rank.
    Undefined { positives: usize, negatives: usize },
}

impl RocAuc {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(value) => Some(*value),
            Self::Undefined { .. } => None,
        }
    }

    pub fn undefined_detail(&self) -> Option<UndefinedAuc> {
        match self {
            Self::Defined(_) => None,
            Self::Undefined {
                positives,
                negatives,
            } => Some(UndefinedAuc {
                reason: if *positives == 0 && *negatives == 0 {
                    "no labeled records in the held-out set".to_string()
                } else if *positives == 0 {
                    "no wrong answers in the held-out set".to_string()
                } else {
                    "no correct answers in the held-out set".to_string()
                },
                positives: *positives,
                negatives: *negatives,
            }),
        }
    }
}

/// Rank-based ROC AUC (Mann-Whitney U). `scored` pairs a risk score with
/// whether the record is positive (a wrong answer). Tied scores share the
/// average of the ranks they span.
pub fn roc_auc(scored: &[(f64, bool)]) -> RocAuc {
    let positives = scored.iter().filter(|(_, positive)| *positive).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return RocAuc::Undefined {
            positives,
            negatives,
        };
    }

    let mut ordered = scored.to_vec();
    ordered.sort_by(|left, right| compare_scores(left.0, right.0));

    let mut positive_rank_sum = 0.0_f64;
    let mut start = 0_usize;
    while start < ordered.len() {
        let mut end = start + 1;
        while end < ordered.len()
            && compare_scores(ordered[end].0, ordered[start].0) == Ordering::Equal
        {
            end += 1;
        }

        // 1-based ranks start+1..=end share their mean.
        let average_rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = ordered[start..end]
            .iter()
            .filter(|(_, positive)| *positive)
            .count();
        positive_rank_sum += average_rank * tied_positives as f64;
        start = end;
    }

    let positives_f = positives as f64;
    let u = positive_rank_sum - positives_f * (positives_f + 1.0) / 2.0;
    RocAuc::Defined((u / (positives_f * negatives as f64)).clamp(0.0, 1.0))
}

/// NaN ranks as the highest risk.
fn compare_scores(left: f64, right: f64) -> Ordering {
    match (left.is_nan(), right.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => left.total_cmp(&right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auc(scored: &[(f64, bool)]) -> f64 {
        roc_auc(scored).value().expect("auc should be defined")
    }

    #[test]
    fn perfect_and_inverted_rankings_hit_the_bounds() {
        let perfect = [(0.9, true), (0.8, true), (0.2, false), (0.1, false)];
        assert_eq!(auc(&perfect), 1.0);

        let inverted = [(0.1, true), (0.2, true), (0.8, false), (0.9, false)];
        assert_eq!(auc(&inverted), 0.0);
    }

    #[test]
    fn four_query_scenario() {
        let scored = [(0.9, true), (0.1, false), (0.6, true), (0.4, false)];
        assert_eq!(auc(&scored), 1.0);
    }

    #[test]
    fn ties_contribute_half_credit() {
        let scored = [(0.5, true), (0.5, false)];
        assert_eq!(auc(&scored), 0.5);

        let scored = [(0.7, true), (0.5, true), (0.5, false), (0.1, false)];
        // Pairs: (0.7>0.5) (0.7>0.1) (0.5=0.5 -> 0.5) (0.5>0.1) = 3.5 / 4.
        assert!((auc(&scored) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn uninformative_score_gives_one_half() {
        // Every score level holds one wrong and one right answer.
        let scored = (0..50)
            .flat_map(|step| {
                let score = f64::from(step) / 50.0;
                [(score, true), (score, false)]
            })
            .collect::<Vec<(f64, bool)>>();
        assert!((auc(&scored) - 0.5).abs() < 1e-12);

        let constant = [(0.3, true), (0.3, false), (0.3, true), (0.3, false)];
        assert_eq!(auc(&constant), 0.5);
    }

    #[test]
    fn auc_matches_pairwise_definition() {
        let scored = [
            (0.12, false),
            (0.95, true),
            (0.40, true),
            (0.40, false),
            (0.77, false),
            (0.05, true),
            (0.66, true),
            (0.66, false),
        ];

        let mut credit = 0.0_f64;
        let mut pairs = 0.0_f64;
        for (positive_score, _) in scored.iter().filter(|(_, positive)| *positive) {
            for (negative_score, _) in scored.iter().filter(|(_, positive)| !*positive) {
                pairs += 1.0;
                if positive_score > negative_score {
                    credit += 1.0;
                } else if positive_score == negative_score {
                    credit += 0.5;
                }
            }
        }

        assert!((auc(&scored) - credit / pairs).abs() < 1e-12);
    }

    #[test]
    fn single_class_sets_are_undefined_not_one_half() {
        let all_right = [(0.2, false), (0.4, false)];
        let result = roc_auc(&all_right);
        assert_eq!(
            result,
            RocAuc::Undefined {
                positives: 0,
                negatives: 2
            }
        );
        assert!(result.value().is_none());
        let detail = result.undefined_detail().expect("detail should exist");
        assert!(detail.reason.contains("no wrong answers"));

        let all_wrong = [(0.2, true)];
        assert!(roc_auc(&all_wrong).value().is_none());
        assert!(roc_auc(&[]).value().is_none());
    }
}
