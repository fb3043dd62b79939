use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;
    write_replacing(path, |file| {
        file.write_all(&data)?;
        file.write_all(b"\n")
    })
}

/// Writes `path` through a sibling temp file and renames it into place, so
/// readers see either the previous file or the complete new one.
pub fn write_replacing<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let temp_path = temp_sibling(path);
    {
        let mut file = File::create(&temp_path)
            .with_context(|| format!("failed to create file: {}", temp_path.display()))?;
        write(&mut file)
            .with_context(|| format!("failed to write file: {}", temp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to flush file: {}", temp_path.display()))?;
    }

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            temp_path.display(),
            path.display()
        )
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|value| value.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "abstain-util-{label}-{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        fs::create_dir_all(&dir).expect("scratch dir should be created");
        dir
    }

    #[test]
    fn utc_compact_string_uses_basic_iso_format() {
        let ts = DateTime::parse_from_rfc3339("2026-03-04T05:06:07Z")
            .expect("timestamp should parse")
            .with_timezone(&Utc);
        assert_eq!(utc_compact_string(ts), "20260304T050607Z");
    }

    #[test]
    fn write_json_pretty_replaces_existing_file_without_leftovers() {
        let dir = scratch_dir("json");
        let path = dir.join("nested").join("value.json");

        write_json_pretty(&path, &vec![1, 2, 3]).expect("first write should succeed");
        write_json_pretty(&path, &vec![4]).expect("second write should succeed");

        let value: Vec<u32> = read_json(&path).expect("json should read back");
        assert_eq!(value, vec![4]);
        assert!(!temp_sibling(&path).exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn sha256_file_matches_known_digest() {
        let dir = scratch_dir("sha");
        let path = dir.join("abc.txt");
        fs::write(&path, b"abc").expect("fixture should be written");

        assert_eq!(
            sha256_file(&path).expect("hash should compute"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        fs::remove_dir_all(&dir).ok();
    }
}
