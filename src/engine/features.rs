use std::collections::BTreeSet;

use crate::config::FeatureConfig;
use crate::model::{EvidenceBundle, EvidenceQuality};
use crate::similarity::{jaccard, normalize_whitespace, tokenize_words};

/// Raw risk signals for one bundle, before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub overlap: f64,
    pub sc_var: f64,
    pub entropy_proxy: f64,
    pub quality: EvidenceQuality,
    pub sample_count: usize,
    pub cluster_count: usize,
    /// Text attached to an `answer` decision.
    pub top_answer: Option<String>,
}

impl Extraction {
    /// Worst-case signals for evidence that cannot support an answer.
    pub fn fail_closed(sample_count: usize) -> Self {
        Self {
            overlap: 0.0,
            sc_var: 1.0,
            entropy_proxy: 1.0,
            quality: EvidenceQuality {
                single_sample: false,
                single_passage: false,
                fail_closed: true,
            },
            sample_count,
            cluster_count: 0,
            top_answer: None,
        }
    }
}

#[derive(Debug)]
struct AnswerCluster {
    normalized: String,
    tokens: BTreeSet<String>,
    first_member: usize,
    members: usize,
}

pub fn extract(bundle: &EvidenceBundle, config: &FeatureConfig) -> Extraction {
    let passage_texts = bundle
        .passages
        .iter()
        .map(|passage| passage.text.as_str())
        .filter(|text| !text.trim().is_empty())
        .take(config.overlap_top_n)
        .collect::<Vec<&str>>();

    let primary = bundle
        .primary_answer
        .as_deref()
        .map(normalize_whitespace)
        .filter(|value| !value.is_empty());

    let mut samples = bundle
        .samples
        .iter()
        .map(|sample| normalize_whitespace(sample))
        .filter(|sample| !sample.is_empty())
        .collect::<Vec<String>>();
    if samples.is_empty() {
        samples.extend(primary.clone());
    }

    if passage_texts.is_empty() || samples.is_empty() {
        return Extraction::fail_closed(samples.len());
    }

    let single_passage = passage_texts.len() == 1;
    let overlap = if single_passage {
        1.0
    } else {
        mean_pairwise_similarity(&passage_texts, config)
    };

    let clusters = cluster_samples(&samples, config.cluster_similarity);
    let sample_count = samples.len();
    let modal = modal_cluster(&clusters);

    let (sc_var, entropy_proxy) = if sample_count < 2 {
        (0.0, 0.0)
    } else {
        let modal_share = modal.map(|cluster| cluster.members).unwrap_or(0) as f64
            / sample_count as f64;
        (
            (1.0 - modal_share).clamp(0.0, 1.0),
            normalized_entropy(&clusters, sample_count),
        )
    };

    let top_answer = primary.or_else(|| modal.map(|cluster| samples[cluster.first_member].clone()));

    Extraction {
        overlap,
        sc_var,
        entropy_proxy,
        quality: EvidenceQuality {
            single_sample: sample_count == 1,
            single_passage,
            fail_closed: false,
        },
        sample_count,
        cluster_count: clusters.len(),
        top_answer,
    }
}

fn mean_pairwise_similarity(texts: &[&str], config: &FeatureConfig) -> f64 {
    let mut total = 0.0_f64;
    let mut pairs = 0_usize;
    for (index, left) in texts.iter().enumerate() {
        for right in &texts[index + 1..] {
            total += config.overlap_metric.similarity(left, right);
            pairs += 1;
        }
    }

    if pairs == 0 {
        return 1.0;
    }
    (total / pairs as f64).clamp(0.0, 1.0)
}

/// Greedy clustering in input order; each sample joins the first cluster whose
/// representative matches it exactly or by token-Jaccard.
fn cluster_samples(samples: &[String], threshold: f64) -> Vec<AnswerCluster> {
    let mut clusters = Vec::<AnswerCluster>::new();

    for (index, sample) in samples.iter().enumerate() {
        let words = tokenize_words(sample);
        let normalized = words.join(" ");
        let tokens = words.into_iter().collect::<BTreeSet<String>>();

        let existing = clusters.iter_mut().find(|cluster| {
            cluster.normalized == normalized || jaccard(&cluster.tokens, &tokens) >= threshold
        });

        match existing {
            Some(cluster) => cluster.members += 1,
            None => clusters.push(AnswerCluster {
                normalized,
                tokens,
                first_member: index,
                members: 1,
            }),
        }
    }

    clusters
}

fn modal_cluster(clusters: &[AnswerCluster]) -> Option<&AnswerCluster> {
    let mut best: Option<&AnswerCluster> = None;
    for cluster in clusters {
        if best.is_none_or(|current| cluster.members > current.members) {
            best = Some(cluster);
        }
    }
    best
}

fn normalized_entropy(clusters: &[AnswerCluster], sample_count: usize) -> f64 {
    if sample_count < 2 {
        return 0.0;
    }

    let total = sample_count as f64;
    let entropy = clusters
        .iter()
        .map(|cluster| cluster.members as f64 / total)
        .filter(|share| *share > 0.0)
        .map(|share| -share * share.ln())
        .sum::<f64>();

    (entropy / total.ln()).clamp(0.0, 1.0)
}
