// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Entity definitions for sessions and the label taxonomy.

pub mod segment;
pub mod taxonomy;

pub use segment::{Annotation, Frames, Segment, VideoBase};
pub use taxonomy::{AllGroups, Category};

use thiserror::Error;

/// Validation failures raised while constructing or loading entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("first frame of the window ({begin}) must come before the last ({end})")]
    InvalidFrames { begin: i64, end: i64 },

    #[error("duplicate label \"{label}\" in an annotation by {user}")]
    DuplicateAnnotationLabel { user: String, label: String },

    #[error("duplicate label \"{label}\" in category \"{category}\"")]
    DuplicateCategoryLabel { category: String, label: String },
}
