use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::model::{EvidenceBundle, Passage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    #[serde(alias = "correct")]
    Right,
    #[serde(alias = "hallucinated", alias = "incorrect")]
    Wrong,
}

/// One held-out query: its evidence plus whatever ground truth is available.
/// A precomputed `label` wins over judging against `gold_answers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldOutRecord {
    pub id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub passages: Vec<Passage>,
    #[serde(default)]
    pub samples: Vec<String>,
    #[serde(default)]
    pub primary_answer: Option<String>,
    #[serde(default)]
    pub gold_answers: Vec<String>,
    #[serde(default)]
    pub label: Option<Label>,
}

impl HeldOutRecord {
    pub fn bundle(&self) -> EvidenceBundle {
        EvidenceBundle {
            passages: self.passages.clone(),
            samples: self.samples.clone(),
            primary_answer: self.primary_answer.clone(),
        }
    }
}

pub fn load_records(path: &Path) -> Result<Vec<Result<HeldOutRecord, RecordError>>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open held-out set: {}", path.display()))?;
    parse_records(BufReader::new(file))
        .with_context(|| format!("failed to read held-out set: {}", path.display()))
}

/// Parses JSON Lines; blank lines are skipped, malformed lines become errors.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<Result<HeldOutRecord, RecordError>>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let line_number = index + 1;
        let record = serde_json::from_str::<HeldOutRecord>(&line).map_err(|err| {
            RecordError::Malformed {
                line: line_number,
                message: err.to_string(),
            }
        });
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_records_keeps_malformed_lines_as_errors() {
        let raw = concat!(
            r#"{"id":"q1","samples":["Paris"],"gold_answers":["Paris"]}"#,
            "\n\n",
            "not json\n",
            r#"{"id":"q2","label":"hallucinated"}"#,
            "\n"
        );

        let records = parse_records(raw.as_bytes()).expect("reader should not fail");
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].as_ref().expect("first record parses").id,
            "q1"
        );
        assert!(matches!(
            records[1],
            Err(RecordError::Malformed { line: 3, .. })
        ));
        assert_eq!(
            records[2].as_ref().expect("third record parses").label,
            Some(Label::Wrong)
        );
    }
}
