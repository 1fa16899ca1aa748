// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session data structures.
//!
//! This module defines the recording-session entities: the navigable
//! frame window of a segment, per-user annotation sessions, the
//! multi-camera segments themselves, and the root aggregate that owns
//! them.

use super::ModelError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The half-open frame-index window `[begin, end)` of a segment.
///
/// Construction is validated: `begin` must come before `end`. The serde
/// path goes through the same check, so a malformed document is rejected
/// before the entity enters the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FramesUnchecked")]
pub struct Frames {
    begin: i64,
    end: i64,
}

/// Mirror of [`Frames`] used as the unvalidated deserialization target.
#[derive(Deserialize)]
struct FramesUnchecked {
    begin: i64,
    end: i64,
}

impl TryFrom<FramesUnchecked> for Frames {
    type Error = ModelError;

    fn try_from(raw: FramesUnchecked) -> Result<Self, Self::Error> {
        Frames::new(raw.begin, raw.end)
    }
}

impl Frames {
    /// Create a validated frame window.
    pub fn new(begin: i64, end: i64) -> Result<Self, ModelError> {
        if begin >= end {
            return Err(ModelError::InvalidFrames { begin, end });
        }
        Ok(Self { begin, end })
    }

    pub fn begin(&self) -> i64 {
        self.begin
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of navigable frames in the window.
    pub fn len(&self) -> i64 {
        self.end - self.begin
    }
}

/// One labelling session: the labels one user attached at one timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub user: String,
    pub date: String,
    /// Insertion-ordered, duplicate-free within one annotation.
    pub labels: Vec<String>,
}

impl Annotation {
    /// Create an annotation session holding a single label.
    pub fn new(user: impl Into<String>, date: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            date: date.into(),
            labels: vec![label.into()],
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// One multi-camera recording unit.
///
/// `files` holds one video path per camera; all camera streams are
/// frame-index-aligned. Annotation sessions are unordered, identified
/// dynamically by `(user, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub subject: String,
    pub date: String,
    pub session: String,
    pub uid: String,
    pub folder: String,
    pub files: Vec<String>,
    pub frames: Frames,
    pub annotations: Vec<Annotation>,
}

impl Segment {
    /// Resolve the camera video paths by joining `folder` with each file.
    pub fn video_paths(&self) -> Vec<PathBuf> {
        let folder = PathBuf::from(&self.folder);
        self.files.iter().map(|f| folder.join(f)).collect()
    }
}

/// Root aggregate for one recording-session batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoBase {
    pub segments: Vec<Segment>,
    pub notes: Option<String>,
}

impl VideoBase {
    /// Check invariants the serde layer cannot express: no duplicate
    /// labels within a single annotation session.
    pub fn validate(&self) -> Result<(), ModelError> {
        for seg in &self.segments {
            for an in &seg.annotations {
                for (ix, label) in an.labels.iter().enumerate() {
                    if an.labels[..ix].contains(label) {
                        return Err(ModelError::DuplicateAnnotationLabel {
                            user: an.user.clone(),
                            label: label.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> Segment {
        Segment {
            subject: "RF484".to_string(),
            date: "01/04/2022".to_string(),
            session: "test".to_string(),
            uid: "RF484_220401_test".to_string(),
            folder: "videos".to_string(),
            files: vec!["cam1.avi".to_string(), "cam2.avi".to_string()],
            frames: Frames::new(12, 50).unwrap(),
            annotations: vec![Annotation::new("alice", "2024-01-01", "grooming")],
        }
    }

    #[test]
    fn frames_accept_ordered_window() {
        let frames = Frames::new(12, 50).unwrap();
        assert_eq!(frames.begin(), 12);
        assert_eq!(frames.end(), 50);
        assert_eq!(frames.len(), 38);
    }

    #[test]
    fn frames_reject_inverted_window() {
        assert_eq!(
            Frames::new(50, 12),
            Err(ModelError::InvalidFrames { begin: 50, end: 12 })
        );
    }

    #[test]
    fn frames_reject_empty_window() {
        assert!(Frames::new(7, 7).is_err());
    }

    #[test]
    fn frames_deserialization_rejects_inverted_window() {
        let result: Result<Frames, _> = serde_json::from_str(r#"{"begin": 9, "end": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn frames_deserialization_accepts_valid_window() {
        let frames: Frames = serde_json::from_str(r#"{"begin": 3, "end": 9}"#).unwrap();
        assert_eq!(frames, Frames::new(3, 9).unwrap());
    }

    #[test]
    fn video_paths_join_folder_and_files() {
        let seg = segment();
        let paths = seg.video_paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], PathBuf::from("videos").join("cam1.avi"));
        assert_eq!(paths[1], PathBuf::from("videos").join("cam2.avi"));
    }

    #[test]
    fn validate_accepts_clean_videobase() {
        let vb = VideoBase {
            segments: vec![segment()],
            notes: None,
        };
        assert!(vb.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_annotation_label() {
        let mut seg = segment();
        seg.annotations[0].labels.push("grooming".to_string());
        let vb = VideoBase {
            segments: vec![seg],
            notes: None,
        };
        assert_eq!(
            vb.validate(),
            Err(ModelError::DuplicateAnnotationLabel {
                user: "alice".to_string(),
                label: "grooming".to_string(),
            })
        );
    }

    #[test]
    fn videobase_json_roundtrip() {
        let vb = VideoBase {
            segments: vec![segment()],
            notes: Some("first batch".to_string()),
        };
        let json = serde_json::to_string_pretty(&vb).unwrap();
        let back: VideoBase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vb);
    }
}
