// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label taxonomy data structures.
//!
//! This module defines the named label groups users pick from. A label
//! referenced by an annotation is a weak reference by value: it is not
//! foreign-key-checked against the taxonomy.

use super::ModelError;
use serde::{Deserialize, Serialize};

/// A named group of labels in the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Insertion-ordered, unique within the category.
    pub labels: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: vec![label.into()],
        }
    }
}

/// Root aggregate for the taxonomy, owned independently of any session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllGroups {
    pub groups: Vec<Category>,
}

impl AllGroups {
    /// Check that no category carries the same label twice.
    pub fn validate(&self) -> Result<(), ModelError> {
        for cat in &self.groups {
            for (ix, label) in cat.labels.iter().enumerate() {
                if cat.labels[..ix].contains(label) {
                    return Err(ModelError::DuplicateCategoryLabel {
                        category: cat.name.clone(),
                        label: label.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
