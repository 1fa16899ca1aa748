// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session and taxonomy document serialization.
//!
//! This module handles loading and saving the two persisted documents
//! (the session file and the label taxonomy) in YAML and JSON formats,
//! and derives the timestamped auto-save paths.

use crate::models::{AllGroups, Category, VideoBase};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Load and validate a session document.
pub fn load_videobase(path: &Path) -> Result<VideoBase> {
    let vb: VideoBase = read_document(path)?;
    vb.validate()
        .with_context(|| format!("invalid session document {}", path.display()))?;
    log::info!(
        "Loaded {} segments from {}",
        vb.segments.len(),
        path.display()
    );
    Ok(vb)
}

/// Load and validate the taxonomy document, returning its categories.
pub fn load_labels(path: &Path) -> Result<Vec<Category>> {
    let groups: AllGroups = read_document(path)?;
    groups
        .validate()
        .with_context(|| format!("invalid taxonomy document {}", path.display()))?;
    Ok(groups.groups)
}

/// Save a session document.
pub fn save_videobase(vb: &VideoBase, path: &Path) -> Result<()> {
    write_document(vb, path)
}

/// Save the taxonomy document.
pub fn save_labels(categories: &[Category], path: &Path) -> Result<()> {
    let groups = AllGroups {
        groups: categories.to_vec(),
    };
    write_document(&groups, path)
}

/// Sibling path for an auto-save: `<stem>_<stamp>.json`, next to the
/// original and never overwriting it.
pub fn autosave_path(original: &Path, stamp: &str) -> PathBuf {
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("session");
    original.with_file_name(format!("{stem}_{stamp}.json"))
}

/// Timestamp used for annotation dates and auto-save file names.
pub fn session_stamp() -> String {
    chrono::Local::now().format("%Y_%m_%d-%H_%M_%S").to_string()
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let extension = path.extension().and_then(|s| s.to_str());
    let value = match extension {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        _ => bail!("Unsupported file extension: {:?}", extension),
    };
    Ok(value)
}

fn write_document<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let extension = path.extension().and_then(|s| s.to_str());
    let text = match extension {
        Some("yaml") | Some("yml") => serde_yaml::to_string(value)?,
        Some("json") => serde_json::to_string_pretty(value)?,
        _ => bail!("Unsupported file extension: {:?}", extension),
    };
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Annotation, Frames, Segment};

    fn videobase() -> VideoBase {
        VideoBase {
            segments: vec![Segment {
                subject: "RF484".to_string(),
                date: "01/04/2022".to_string(),
                session: "test".to_string(),
                uid: "RF484_220401_test".to_string(),
                folder: ".".to_string(),
                files: vec!["cam1.avi".to_string(), "cam2.avi".to_string()],
                frames: Frames::new(12, 50).unwrap(),
                annotations: vec![Annotation::new("alice", "2024-01-01", "grooming")],
            }],
            notes: Some("first batch".to_string()),
        }
    }

    #[test]
    fn videobase_roundtrip_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let vb = videobase();
        save_videobase(&vb, &path).unwrap();
        assert_eq!(load_videobase(&path).unwrap(), vb);
    }

    #[test]
    fn videobase_roundtrip_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yaml");
        let vb = videobase();
        save_videobase(&vb, &path).unwrap();
        assert_eq!(load_videobase(&path).unwrap(), vb);
    }

    #[test]
    fn labels_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        let categories = vec![Category::new("moving", "running")];
        save_labels(&categories, &path).unwrap();
        assert_eq!(load_labels(&path).unwrap(), categories);
    }

    #[test]
    fn load_rejects_inverted_frame_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let text = r#"{"segments": [{"subject": "s", "date": "d", "session": "x",
            "uid": "u", "folder": ".", "files": ["a.avi"],
            "frames": {"begin": 50, "end": 12}, "annotations": []}], "notes": null}"#;
        std::fs::write(&path, text).unwrap();
        assert!(load_videobase(&path).is_err());
    }

    #[test]
    fn load_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.txt");
        std::fs::write(&path, "{}").unwrap();
        assert!(load_videobase(&path).is_err());
    }

    #[test]
    fn autosave_path_is_timestamped_sibling() {
        let path = autosave_path(Path::new("/data/batch.json"), "2024_05_01-10_00_00");
        assert_eq!(path, PathBuf::from("/data/batch_2024_05_01-10_00_00.json"));
    }
}
