// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! MAVA - Multi-Angle Video Annotator
//!
//! Headless driver: loads a session document and the label taxonomy,
//! builds a viewing order and prints a review summary. A GUI front-end
//! drives the same library API.

use anyhow::{Context, Result};
use mava::session::Session;
use std::path::Path;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let session_path = args
        .next()
        .context("usage: mava <session.json> [labels.json]")?;
    let labels_path = args.next().unwrap_or_else(|| "labels.json".to_string());
    let user = std::env::var("USER").unwrap_or_else(|_| "reviewer".to_string());

    let mut session = Session::new(user, &labels_path)?;
    session.open_videobase(Path::new(&session_path))?;

    println!("Labels ({})", labels_path);
    for cat in session.categories() {
        println!("  {}: {}", cat.name, cat.labels.join(", "));
    }

    let order = session.order().context("no viewing order")?.clone();
    println!(
        "\nViewing order for {} ({} segments)",
        session_path, order.total
    );
    let vb = session.videobase().context("no session loaded")?;
    for (position, &ix) in order.order.iter().enumerate() {
        let seg = &vb.segments[ix];
        println!(
            "  {:>3}. {} [{}..{}) cameras={} annotations={}",
            position + 1,
            seg.uid,
            seg.frames.begin(),
            seg.frames.end(),
            seg.files.len(),
            seg.annotations.len()
        );
    }

    session.shutdown()?;
    Ok(())
}
