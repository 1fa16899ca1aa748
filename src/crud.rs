// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label taxonomy and annotation CRUD engine.
//!
//! Free functions operating on the caller's collections in place.
//! Absence is an expected outcome, so every lookup returns an `Option`
//! rather than an error; the single failure case is renaming a label the
//! taxonomy does not know.

use crate::models::{Annotation, Category, Segment, VideoBase};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrudError {
    #[error("\"{0}\" is not a known label and can not be renamed")]
    LabelNotFound(String),
}

/// Find a category, and its index, by its name.
pub fn find_category<'a>(categories: &'a [Category], name: &str) -> Option<(usize, &'a Category)> {
    categories.iter().enumerate().find(|(_, cat)| cat.name == name)
}

/// Add a label to a category, creating the category when it does not
/// exist yet. Idempotent: a label never appears twice in one category.
pub fn create_label(categories: &mut Vec<Category>, category: &str, label: &str) {
    let found = find_category(categories, category).map(|(ix, _)| ix);
    match found {
        None => categories.push(Category::new(category, label)),
        Some(ix) => {
            let cat = &mut categories[ix];
            if !cat.labels.iter().any(|l| l == label) {
                cat.labels.push(label.to_string());
            }
        }
    }
}

/// Find the first category (in list order) containing a label.
pub fn find_label_category<'a>(
    categories: &'a [Category],
    label: &str,
) -> Option<(usize, &'a Category)> {
    categories
        .iter()
        .enumerate()
        .find(|(_, cat)| cat.labels.iter().any(|l| l == label))
}

/// Add a label to a segment, merging into the existing `(user, date)`
/// annotation session when one exists and starting a new session
/// otherwise. Idempotent per label within a session.
pub fn create_annotation(segment: &mut Segment, user: &str, date: &str, label: &str) {
    let existing = segment
        .annotations
        .iter_mut()
        .find(|an| an.user == user && an.date == date);
    match existing {
        Some(an) => {
            if !an.has_label(label) {
                an.labels.push(label.to_string());
            }
        }
        None => segment.annotations.push(Annotation::new(user, date, label)),
    }
}

/// Remove a label from the first annotation belonging to `user`.
///
/// A no-op when the user has no annotation on the segment or the
/// annotation does not carry the label. The annotation object itself is
/// never deleted, even when its label list becomes empty.
pub fn remove_annotation(segment: &mut Segment, user: &str, label: &str) {
    if let Some(an) = segment.annotations.iter_mut().find(|an| an.user == user) {
        an.labels.retain(|l| l != label);
    }
}

/// Every segment, in original order, with at least one annotation
/// containing `label`. An absent video base yields an empty list.
pub fn find_segments_label<'a>(vb: Option<&'a VideoBase>, label: &str) -> Vec<&'a Segment> {
    let Some(vb) = vb else {
        return Vec::new();
    };
    vb.segments
        .iter()
        .filter(|seg| seg.annotations.iter().any(|an| an.has_label(label)))
        .collect()
}

/// Rename a label in its category and in every annotation of every
/// segment that carries it. Global and irreversible: the old label text
/// is not retained anywhere.
///
/// Fails before any mutation when `old_label` is not present in any
/// category.
pub fn rename_label(
    categories: &mut [Category],
    vb: &mut VideoBase,
    old_label: &str,
    new_label: &str,
) -> Result<(), CrudError> {
    let ix = find_label_category(categories, old_label)
        .map(|(ix, _)| ix)
        .ok_or_else(|| CrudError::LabelNotFound(old_label.to_string()))?;
    for label in &mut categories[ix].labels {
        if label == old_label {
            *label = new_label.to_string();
        }
    }
    for seg in &mut vb.segments {
        for an in &mut seg.annotations {
            for label in &mut an.labels {
                if label == old_label {
                    *label = new_label.to_string();
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
