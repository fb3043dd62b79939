use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;

/// External correctness oracle for generated answers.
pub trait CorrectnessJudge: Send + Sync {
    fn is_correct(&self, generated: &str, gold: &str) -> bool;

    fn matches_any(&self, generated: &str, golds: &[String]) -> bool {
        golds.iter().any(|gold| self.is_correct(generated, gold))
    }
}

/// Reading-comprehension style match: answers are lowercased, stripped of
/// punctuation and articles, then compared exactly or by token F1.
#[derive(Debug, Clone)]
pub struct NormalizedMatchJudge {
    articles: Regex,
    punctuation: Regex,
    min_token_f1: f64,
}

impl NormalizedMatchJudge {
    pub fn new(min_token_f1: f64) -> Result<Self> {
        let articles =
            Regex::new(r"\b(a|an|the)\b").context("failed to compile article regex")?;
        let punctuation =
            Regex::new(r"[^\p{L}\p{N}\s]").context("failed to compile punctuation regex")?;
        Ok(Self {
            articles,
            punctuation,
            min_token_f1: min_token_f1.clamp(0.0, 1.0),
        })
    }

    pub fn normalize(&self, value: &str) -> String {
        let lowered = value.to_lowercase();
        let without_punctuation = self.punctuation.replace_all(&lowered, " ");
        let without_articles = self.articles.replace_all(&without_punctuation, " ");
        without_articles.split_whitespace().collect::<Vec<&str>>().join(" ")
    }

    pub fn token_f1(&self, generated: &str, gold: &str) -> f64 {
        let generated = self.normalize(generated);
        let gold = self.normalize(gold);
        let generated_tokens = generated.split_whitespace().collect::<Vec<&str>>();
        let gold_tokens = gold.split_whitespace().collect::<Vec<&str>>();
        if generated_tokens.is_empty() || gold_tokens.is_empty() {
            return if generated_tokens.is_empty() && gold_tokens.is_empty() {
                1.0
            } else {
                0.0
            };
        }

        let mut gold_counts = HashMap::<&str, usize>::new();
        for token in &gold_tokens {
            *gold_counts.entry(*token).or_default() += 1;
        }
        let mut common = 0_usize;
        for token in &generated_tokens {
            match gold_counts.get_mut(*token) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    common += 1;
                }
                _ => {}
            }
        }
        if common == 0 {
            return 0.0;
        }

        let precision = common as f64 / generated_tokens.len() as f64;
        let recall = common as f64 / gold_tokens.len() as f64;
        2.0 * precision * recall / (precision + recall)
    }
}

impl CorrectnessJudge for NormalizedMatchJudge {
    fn is_correct(&self, generated: &str, gold: &str) -> bool {
        let generated_norm = self.normalize(generated);
        let gold_norm = self.normalize(gold);
        if gold_norm.is_empty() {
            return false;
        }
        if generated_norm == gold_norm {
            return true;
        }
        self.token_f1(generated, gold) >= self.min_token_f1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judge() -> NormalizedMatchJudge {
        NormalizedMatchJudge::new(0.5).expect("judge should build")
    }

    #[test]
    fn normalize_strips_case_punctuation_and_articles() {
        assert_eq!(judge().normalize("The  Eiffel Tower!"), "eiffel tower");
        assert_eq!(judge().normalize("An apple, a day."), "apple day");
    }

    #[test]
    fn exact_match_after_normalization_is_correct() {
        assert!(judge().is_correct("the Treaty of Westphalia.", "Treaty of Westphalia"));
    }

    #[test]
    fn partial_overlap_uses_token_f1_threshold() {
        let judge = judge();
        assert!((judge.token_f1("paris france", "paris") - 2.0 / 3.0).abs() < 1e-12);
        assert!(judge.is_correct("Paris, France", "Paris"));
        assert!(!judge.is_correct("Lyon", "Paris"));

        let strict = NormalizedMatchJudge::new(1.0).expect("judge should build");
        assert!(!strict.is_correct("Paris, France", "Paris"));
    }

    #[test]
    fn empty_gold_is_never_matched() {
        assert!(!judge().is_correct("anything", "  the "));
    }

    #[test]
    fn matches_any_checks_every_gold_alias() {
        let golds = vec!["NYC".to_string(), "New York City".to_string()];
        assert!(judge().matches_any("new york city", &golds));
        assert!(!judge().matches_any("Boston", &golds));
    }
}
