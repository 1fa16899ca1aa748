// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! MAVA - Multi-Angle Video Annotator
//!
//! Backend for reviewing multi-camera video sessions: a validated data
//! model for segments and the label taxonomy, CRUD operations for
//! per-user annotations, a prioritized randomized viewing order, and a
//! frame buffering engine that keeps all camera streams index-aligned
//! during playback. Presentation is left to the caller, which drives
//! these components and subscribes to their change notifications.

pub mod crud;
pub mod io;
pub mod models;
pub mod order;
pub mod player;
pub mod session;
