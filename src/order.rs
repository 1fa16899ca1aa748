// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Viewing-order generation.
//!
//! This module produces the randomized, priority-partitioned sequence in
//! which a session's segments are presented for review. Every branch
//! returns a permutation of the segment indices; what changes is which
//! group is shown first and what the reported priority count means.

use crate::models::VideoBase;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A prioritized traversal order over a session's segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewingOrder {
    /// Permutation of `0..total`, priority group first.
    pub order: Vec<usize>,
    pub total: usize,
    /// Size of the group the caller reports progress against; see
    /// [`create_order_with`] for the per-branch meaning.
    pub priority: usize,
}

/// Generate a viewing order with a non-deterministic seed.
pub fn create_order(vb: &VideoBase, ticked: Option<&[String]>) -> ViewingOrder {
    create_order_with(vb, ticked, &mut StdRng::from_entropy())
}

/// Generate a viewing order from the given randomness source.
///
/// - `ticked` absent: a uniformly random permutation of all segments;
///   `priority` is the whole set.
/// - `ticked` empty: segments without any annotation are shown first,
///   already-annotated segments last, each group shuffled independently;
///   `priority` is the count of annotated segments so the caller can show
///   "already labelled / total" progress.
/// - `ticked` non-empty: segments carrying any ticked label are shown
///   first, the rest after, each group shuffled independently; `priority`
///   is the size of the ticked group.
pub fn create_order_with<R: Rng>(
    vb: &VideoBase,
    ticked: Option<&[String]>,
    rng: &mut R,
) -> ViewingOrder {
    let total = vb.segments.len();
    match ticked {
        None => {
            let mut order: Vec<usize> = (0..total).collect();
            order.shuffle(rng);
            ViewingOrder {
                order,
                total,
                priority: total,
            }
        }
        Some(ticked) if ticked.is_empty() => {
            let (labelled, unlabelled): (Vec<usize>, Vec<usize>) =
                (0..total).partition(|&ix| !vb.segments[ix].annotations.is_empty());
            let priority = labelled.len();
            ViewingOrder {
                order: chain_shuffled(unlabelled, labelled, rng),
                total,
                priority,
            }
        }
        Some(ticked) => {
            let (ticked_group, rest): (Vec<usize>, Vec<usize>) = (0..total).partition(|&ix| {
                vb.segments[ix]
                    .annotations
                    .iter()
                    .any(|an| an.labels.iter().any(|l| ticked.contains(l)))
            });
            let priority = ticked_group.len();
            ViewingOrder {
                order: chain_shuffled(ticked_group, rest, rng),
                total,
                priority,
            }
        }
    }
}

/// Shuffle both groups independently and concatenate, first group first.
fn chain_shuffled<R: Rng>(mut first: Vec<usize>, mut second: Vec<usize>, rng: &mut R) -> Vec<usize> {
    first.shuffle(rng);
    second.shuffle(rng);
    first.extend(second);
    first
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
