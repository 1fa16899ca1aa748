// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Review-session context.
//!
//! This module holds the state a caller works through: the loaded
//! session and taxonomy documents, the viewing order, the current
//! position in it, and the identity of the annotating user. Callers
//! mutate annotations and the taxonomy only through this context (or
//! the [`crate::crud`] functions it wraps), and subscribe to change
//! events over plain channels.

use crate::crud;
use crate::io::serialization;
use crate::models::{Category, Segment, VideoBase};
use crate::order::{self, ViewingOrder};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Change notifications emitted by the session context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The current position in the viewing order moved.
    SegmentChanged { position: usize },
    /// An annotation on the named segment changed.
    AnnotationChanged { uid: String },
    /// A taxonomy edit happened (label created or renamed).
    TaxonomyChanged,
}

/// One user's review session over a session document and the taxonomy.
pub struct Session {
    user: String,
    stamp: String,
    videobase: Option<VideoBase>,
    videobase_path: Option<PathBuf>,
    categories: Vec<Category>,
    labels_path: PathBuf,
    order: Option<ViewingOrder>,
    position: usize,
    subscribers: Vec<mpsc::Sender<SessionEvent>>,
}

impl Session {
    /// Start a session for `user`, loading the taxonomy from
    /// `labels_path`. The session timestamp taken here is reused for
    /// every annotation date and auto-save name until shutdown.
    pub fn new(user: impl Into<String>, labels_path: impl Into<PathBuf>) -> Result<Self> {
        let labels_path = labels_path.into();
        let categories = serialization::load_labels(&labels_path)?;
        Ok(Self {
            user: user.into(),
            stamp: serialization::session_stamp(),
            videobase: None,
            videobase_path: None,
            categories,
            labels_path,
            order: None,
            position: 0,
            subscribers: Vec::new(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = user.into();
    }

    /// The session timestamp used for annotation dates and auto-saves.
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn videobase(&self) -> Option<&VideoBase> {
        self.videobase.as_ref()
    }

    pub fn order(&self) -> Option<&ViewingOrder> {
        self.order.as_ref()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Subscribe to session change events. Disconnected receivers are
    /// dropped on the next emit.
    pub fn subscribe(&mut self) -> mpsc::Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Load a session document and restart traversal on a fresh,
    /// unfiltered viewing order.
    pub fn open_videobase(&mut self, path: &Path) -> Result<()> {
        let vb = serialization::load_videobase(path)?;
        self.order = Some(order::create_order(&vb, None));
        self.videobase = Some(vb);
        self.videobase_path = Some(path.to_path_buf());
        self.position = 0;
        self.emit(SessionEvent::SegmentChanged { position: 0 });
        Ok(())
    }

    /// Rebuild the viewing order with the given label filter and restart
    /// traversal from the front.
    pub fn reorder(&mut self, ticked: Option<&[String]>) -> Option<&ViewingOrder> {
        let vb = self.videobase.as_ref()?;
        let new_order = order::create_order(vb, ticked);
        self.order = Some(new_order);
        self.position = 0;
        self.emit(SessionEvent::SegmentChanged { position: 0 });
        self.order.as_ref()
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        let ix = self.current_index()?;
        self.videobase.as_ref()?.segments.get(ix)
    }

    pub fn current_segment_mut(&mut self) -> Option<&mut Segment> {
        let ix = self.current_index()?;
        self.videobase.as_mut()?.segments.get_mut(ix)
    }

    /// Move to the next segment in the viewing order. Returns whether
    /// the position changed; the move auto-saves the session document.
    pub fn next_segment(&mut self) -> Result<bool> {
        self.go_to(self.position as i64 + 1)
    }

    /// Move to the previous segment in the viewing order.
    pub fn prev_segment(&mut self) -> Result<bool> {
        self.go_to(self.position as i64 - 1)
    }

    /// Apply a checkbox change for the current user on the current
    /// segment: checked adds the label to the user's session annotation,
    /// unchecked removes it. Toggling twice is safe either way.
    pub fn toggle_label(&mut self, label: &str, checked: bool) {
        let user = self.user.clone();
        let stamp = self.stamp.clone();
        let uid = {
            let Some(seg) = self.current_segment_mut() else {
                return;
            };
            if checked {
                crud::create_annotation(seg, &user, &stamp, label);
            } else {
                crud::remove_annotation(seg, &user, label);
            }
            seg.uid.clone()
        };
        self.emit(SessionEvent::AnnotationChanged { uid });
    }

    /// Labels of the current user's annotations on the current segment
    /// that resolve to a known category, for restoring checkbox state.
    pub fn checked_labels(&self) -> Vec<String> {
        let Some(seg) = self.current_segment() else {
            return Vec::new();
        };
        let mut checked = Vec::new();
        for an in &seg.annotations {
            if an.user != self.user {
                continue;
            }
            for label in &an.labels {
                if crud::find_label_category(&self.categories, label).is_some()
                    && !checked.contains(label)
                {
                    checked.push(label.clone());
                }
            }
        }
        checked
    }

    /// Add a label to a category (creating the category when missing)
    /// and persist the taxonomy.
    pub fn add_label(&mut self, category: &str, label: &str) -> Result<()> {
        crud::create_label(&mut self.categories, category, label);
        self.save_labels()?;
        self.emit(SessionEvent::TaxonomyChanged);
        Ok(())
    }

    /// Rename a label everywhere and persist the taxonomy. Fails when
    /// the old label is unknown, before any mutation.
    pub fn rename_label(&mut self, old_label: &str, new_label: &str) -> Result<()> {
        let mut detached = VideoBase {
            segments: Vec::new(),
            notes: None,
        };
        let vb = self.videobase.as_mut().unwrap_or(&mut detached);
        crud::rename_label(&mut self.categories, vb, old_label, new_label)?;
        self.save_labels()?;
        self.emit(SessionEvent::TaxonomyChanged);
        Ok(())
    }

    /// Auto-save the session document to its timestamped sibling path.
    /// The original file is never overwritten. A no-op when no document
    /// is loaded.
    pub fn save_annotations(&self) -> Result<()> {
        let (Some(vb), Some(path)) = (self.videobase.as_ref(), self.videobase_path.as_ref())
        else {
            return Ok(());
        };
        let out = serialization::autosave_path(path, &self.stamp);
        serialization::save_videobase(vb, &out)
    }

    /// Final auto-save of both documents.
    pub fn shutdown(&self) -> Result<()> {
        self.save_annotations()?;
        self.save_labels()?;
        log::info!("Session closed");
        Ok(())
    }

    fn current_index(&self) -> Option<usize> {
        let order = self.order.as_ref()?;
        order.order.get(self.position).copied()
    }

    fn go_to(&mut self, target: i64) -> Result<bool> {
        let Some(vb) = self.videobase.as_ref() else {
            return Ok(false);
        };
        if target < 0 || target as usize >= vb.segments.len() {
            return Ok(false);
        }
        self.position = target as usize;
        self.save_annotations()?;
        self.emit(SessionEvent::SegmentChanged {
            position: self.position,
        });
        Ok(true)
    }

    fn save_labels(&self) -> Result<()> {
        serialization::save_labels(&self.categories, &self.labels_path)
    }

    fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AllGroups, Annotation, Frames};

    fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf) {
        let labels_path = dir.join("labels.json");
        let groups = AllGroups {
            groups: vec![
                Category {
                    name: "cleaning".to_string(),
                    labels: vec!["grooming".to_string(), "scratching".to_string()],
                },
                Category::new("moving", "running"),
            ],
        };
        std::fs::write(&labels_path, serde_json::to_string_pretty(&groups).unwrap()).unwrap();

        let session_path = dir.join("batch.json");
        let segments: Vec<Segment> = (0..3)
            .map(|ix| Segment {
                subject: "RF484".to_string(),
                date: "01/04/2022".to_string(),
                session: "test".to_string(),
                uid: format!("seg{ix}"),
                folder: ".".to_string(),
                files: vec!["cam1.avi".to_string()],
                frames: Frames::new(0, 100).unwrap(),
                annotations: Vec::new(),
            })
            .collect();
        let vb = VideoBase {
            segments,
            notes: None,
        };
        std::fs::write(&session_path, serde_json::to_string_pretty(&vb).unwrap()).unwrap();
        (session_path, labels_path)
    }

    fn session(dir: &Path) -> Session {
        let (session_path, labels_path) = write_fixtures(dir);
        let mut session = Session::new("alice", labels_path).unwrap();
        session.open_videobase(&session_path).unwrap();
        session
    }

    #[test]
    fn open_videobase_builds_full_order() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let order = session.order().unwrap();
        assert_eq!(order.total, 3);
        assert_eq!(order.order.len(), 3);
        assert!(session.current_segment().is_some());
    }

    #[test]
    fn toggle_label_creates_and_removes_annotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session.toggle_label("grooming", true);
        {
            let seg = session.current_segment().unwrap();
            assert_eq!(seg.annotations.len(), 1);
            assert_eq!(seg.annotations[0].user, "alice");
            assert_eq!(seg.annotations[0].date, session.stamp());
            assert_eq!(seg.annotations[0].labels, vec!["grooming"]);
        }
        session.toggle_label("grooming", false);
        let seg = session.current_segment().unwrap();
        assert_eq!(seg.annotations.len(), 1);
        assert!(seg.annotations[0].labels.is_empty());
    }

    #[test]
    fn toggle_label_twice_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session.toggle_label("grooming", true);
        session.toggle_label("grooming", true);
        let seg = session.current_segment().unwrap();
        assert_eq!(seg.annotations[0].labels, vec!["grooming"]);
    }

    #[test]
    fn checked_labels_skip_other_users_and_unknown_labels() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session.toggle_label("grooming", true);
        {
            let seg = session.current_segment_mut().unwrap();
            seg.annotations
                .push(Annotation::new("bob", "2024-01-01", "running"));
            let mut mine = Annotation::new("alice", "old-stamp", "untracked-label");
            mine.labels.push("scratching".to_string());
            seg.annotations.push(mine);
        }
        let mut checked = session.checked_labels();
        checked.sort();
        assert_eq!(checked, vec!["grooming", "scratching"]);
    }

    #[test]
    fn navigation_is_clamped_and_autosaves() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        assert!(!session.prev_segment().unwrap());
        assert!(session.next_segment().unwrap());
        assert!(session.next_segment().unwrap());
        assert!(!session.next_segment().unwrap());
        assert_eq!(session.position(), 2);
        let autosave =
            serialization::autosave_path(&dir.path().join("batch.json"), session.stamp());
        assert!(autosave.exists());
        // The original document is untouched.
        let original = serialization::load_videobase(&dir.path().join("batch.json")).unwrap();
        assert_eq!(original.segments.len(), 3);
    }

    #[test]
    fn events_reach_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let events = session.subscribe();
        session.toggle_label("grooming", true);
        session.next_segment().unwrap();
        let received: Vec<SessionEvent> = events.try_iter().collect();
        assert!(received
            .iter()
            .any(|e| matches!(e, SessionEvent::AnnotationChanged { uid } if uid == "seg0"
                || uid == "seg1" || uid == "seg2")));
        assert!(received
            .iter()
            .any(|e| matches!(e, SessionEvent::SegmentChanged { position: 1 })));
    }

    #[test]
    fn add_label_persists_taxonomy() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session.add_label("sleeping", "curled").unwrap();
        let reloaded = serialization::load_labels(&dir.path().join("labels.json")).unwrap();
        assert!(reloaded.iter().any(|cat| cat.name == "sleeping"));
    }

    #[test]
    fn rename_label_rewrites_annotations_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session.toggle_label("grooming", true);
        session.rename_label("grooming", "self-care").unwrap();
        let seg = session.current_segment().unwrap();
        assert_eq!(seg.annotations[0].labels, vec!["self-care"]);
        let reloaded = serialization::load_labels(&dir.path().join("labels.json")).unwrap();
        assert!(reloaded[0].labels.contains(&"self-care".to_string()));
        assert!(!reloaded[0].labels.contains(&"grooming".to_string()));
    }

    #[test]
    fn rename_unknown_label_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        assert!(session.rename_label("flying", "soaring").is_err());
    }
}
