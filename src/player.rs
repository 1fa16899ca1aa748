// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Multi-camera frame buffering engine.
//!
//! This module owns the open video handles for the segment under review
//! and keeps the camera streams index-aligned behind a single cursor.
//! Cursor changes synchronously decode one frame per camera and push the
//! resulting frame-set onto a delivery queue the caller drains at its
//! own pace. Playback is cooperative: the caller's event loop invokes
//! [`Player::poll`] and the cursor auto-advances once per elapsed
//! interval while playing.

use crate::io::media::{self, FrameSet, MediaError, SourceOpener};
use crate::models::Frames;
use image::RgbImage;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Default per-advance delay, matching normal playback speed.
const DEFAULT_INTERVAL_MS: u64 = 30;

/// Engine lifecycle: no files loaded, loaded with the timer inactive, or
/// loaded with the cursor auto-advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Stopped,
    Playing,
}

/// The frame buffering engine. Exclusively owns its video handles; no
/// other component reads or closes them.
pub struct Player {
    opener: Box<dyn SourceOpener>,
    files: Vec<PathBuf>,
    sources: Vec<Box<dyn media::FrameSource>>,
    begin: i64,
    end: i64,
    current: i64,
    playing: bool,
    interval: Duration,
    next_tick: Instant,
    queue: VecDeque<FrameSet>,
    frames_ready: Vec<Box<dyn FnMut()>>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    /// Create an engine backed by the compiled-in video backend.
    pub fn new() -> Self {
        Self::with_opener(media::default_opener())
    }

    /// Create an engine with a custom source opener.
    pub fn with_opener(opener: Box<dyn SourceOpener>) -> Self {
        Self {
            opener,
            files: Vec::new(),
            sources: Vec::new(),
            begin: 0,
            end: 0,
            current: 0,
            playing: false,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            next_tick: Instant::now(),
            queue: VecDeque::new(),
            frames_ready: Vec::new(),
        }
    }

    pub fn state(&self) -> PlayerState {
        if self.sources.is_empty() {
            PlayerState::Idle
        } else if self.playing {
            PlayerState::Playing
        } else {
            PlayerState::Stopped
        }
    }

    pub fn current_frame(&self) -> i64 {
        self.current
    }

    /// The navigable frame-index window `[begin, end)`.
    pub fn window(&self) -> (i64, i64) {
        (self.begin, self.end)
    }

    /// Frames in the first camera stream, if any files are open.
    pub fn frame_count(&self) -> Option<usize> {
        self.sources.first().map(|s| s.frame_count())
    }

    /// Swap the open camera files, one handle per path. A `Playing`
    /// engine resumes playing after the swap.
    pub fn set_files(&mut self, paths: &[PathBuf]) -> Result<(), MediaError> {
        let was_playing = self.playing;
        if was_playing {
            self.stop();
        }
        self.close_all();
        self.files = paths.to_vec();
        self.open_all()?;
        if was_playing {
            self.start();
        }
        Ok(())
    }

    /// Activate the advance timer. Does not touch the cursor.
    pub fn start(&mut self) {
        self.playing = true;
        self.next_tick = Instant::now() + self.interval;
    }

    /// Deactivate the advance timer. Does not touch the cursor and does
    /// not discard anything already queued.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Set the navigable window for the current segment.
    pub fn set_window(&mut self, begin: i64, end: i64) {
        self.begin = begin;
        self.end = end;
    }

    /// Move the cursor, wrapping below `begin` to `end - 1` and at or
    /// above `end` to `begin`, then synchronously fetch the frame-set.
    pub fn set_frame(&mut self, index: i64) {
        let mut value = index;
        if value < self.begin {
            value = self.end - 1;
        }
        if value >= self.end {
            value = self.begin;
        }
        self.current = value;
        self.fetch_current();
    }

    /// Step the cursor forward one frame; what the timer invokes.
    pub fn advance(&mut self) {
        self.set_frame(self.current + 1);
    }

    /// Drive playback: advances once when the interval has elapsed since
    /// the last tick. Returns whether an advance happened. The caller's
    /// event loop calls this at its own cadence.
    pub fn poll(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        let now = Instant::now();
        if now < self.next_tick {
            return false;
        }
        self.next_tick = now + self.interval;
        self.advance();
        true
    }

    /// Change the playback speed. Restarts the timer only if it was
    /// running.
    pub fn set_interval(&mut self, ms: u64) {
        let was_playing = self.playing;
        self.stop();
        self.interval = Duration::from_millis(ms);
        if was_playing {
            self.start();
        }
    }

    /// Pop the oldest queued frame-set without blocking.
    pub fn try_next(&mut self) -> Option<FrameSet> {
        self.queue.pop_front()
    }

    /// Subscribe to the "new frame-set available" notification, raised
    /// after every successful queue push.
    pub fn connect_frames_ready<F: FnMut() + 'static>(&mut self, callback: F) {
        self.frames_ready.push(Box::new(callback));
    }

    /// Release every handle and discard anything still queued. Safe to
    /// call from any state, any number of times.
    pub fn close_all(&mut self) {
        self.close_sources();
        self.queue.clear();
    }

    /// Show a segment: swap in its camera files, clamp its frame window
    /// to the stream length, jump to the first frame and start playing.
    pub fn play_segment(&mut self, paths: &[PathBuf], frames: &Frames) -> Result<(), MediaError> {
        self.stop();
        self.set_files(paths)?;
        let mut end = frames.end();
        if let Some(count) = self.frame_count() {
            end = end.min(count as i64);
        }
        self.set_window(frames.begin(), end);
        self.set_frame(frames.begin());
        self.start();
        Ok(())
    }

    fn open_all(&mut self) -> Result<(), MediaError> {
        let mut sources = Vec::with_capacity(self.files.len());
        for path in &self.files {
            sources.push(self.opener.open(path)?);
        }
        self.sources = sources;
        Ok(())
    }

    fn close_sources(&mut self) {
        if !self.sources.is_empty() {
            log::info!("Closing {} video handles", self.sources.len());
        }
        self.sources.clear();
    }

    fn fetch_current(&mut self) {
        let Some(set) = self.fetch(self.current) else {
            return;
        };
        self.queue.push_back(set);
        for callback in &mut self.frames_ready {
            callback();
        }
    }

    /// Read frame `index` from every open handle. A failed read closes
    /// and reopens all handles and retries exactly once; a second
    /// failure delivers nothing.
    fn fetch(&mut self, index: i64) -> Option<FrameSet> {
        if self.sources.is_empty() {
            return None;
        }
        let ix = usize::try_from(index).ok()?;
        match self.read_all(ix) {
            Ok(frames) => Some(FrameSet { index, frames }),
            Err(err) => {
                log::warn!("Frame {index} unavailable ({err}), reopening all handles");
                self.close_sources();
                if let Err(err) = self.open_all() {
                    log::error!("Failed to reopen video handles: {err}");
                    return None;
                }
                match self.read_all(ix) {
                    Ok(frames) => Some(FrameSet { index, frames }),
                    Err(err) => {
                        log::error!("Frame {index} still unavailable after reopen: {err}");
                        None
                    }
                }
            }
        }
    }

    fn read_all(&mut self, index: usize) -> Result<Vec<RgbImage>, MediaError> {
        let mut frames = Vec::with_capacity(self.sources.len());
        for source in &mut self.sources {
            frames.push(source.read_frame(index)?);
        }
        Ok(frames)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
