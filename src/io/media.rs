// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video decoding seam.
//!
//! This module defines the decoder-facing traits the frame buffering
//! engine drives, the frame-set type it delivers, and the OpenCV-backed
//! implementation compiled in with the `video-opencv` feature. The
//! engine only sees the traits, so everything above this seam runs and
//! tests without a video library.

use image::RgbImage;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("failed to open video {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("failed to decode frame {index}: {reason}")]
    Decode { index: usize, reason: String },

    #[error("no video backend compiled in (enable the video-opencv feature)")]
    NoBackend,
}

/// One open, decodable video handle.
///
/// `read_frame` may fail for indices a sequential decoder cannot seek
/// to; the caller is expected to reopen and retry.
pub trait FrameSource {
    /// Total number of frames in the stream.
    fn frame_count(&self) -> usize;

    /// Decode the frame at `index`.
    fn read_frame(&mut self, index: usize) -> Result<RgbImage, MediaError>;
}

/// Factory for [`FrameSource`] handles, used both for the initial open
/// and for the reopen-on-seek-failure path.
pub trait SourceOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, MediaError>;
}

/// One decoded frame per camera, in file order, for a single index.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    pub index: i64,
    pub frames: Vec<RgbImage>,
}

/// Opener used when the crate is built without a video backend; every
/// `open` fails with [`MediaError::NoBackend`].
pub struct NoBackendOpener;

impl SourceOpener for NoBackendOpener {
    fn open(&self, _path: &Path) -> Result<Box<dyn FrameSource>, MediaError> {
        Err(MediaError::NoBackend)
    }
}

/// The opener matching the compiled-in video backend.
pub fn default_opener() -> Box<dyn SourceOpener> {
    #[cfg(feature = "video-opencv")]
    {
        return Box::new(VideoFileOpener);
    }
    #[cfg(not(feature = "video-opencv"))]
    {
        Box::new(NoBackendOpener)
    }
}

#[cfg(feature = "video-opencv")]
pub use backend::{VideoFileOpener, VideoFileSource};

#[cfg(feature = "video-opencv")]
mod backend {
    use super::{FrameSource, MediaError, SourceOpener};
    use image::RgbImage;
    use opencv::prelude::*;
    use opencv::{core, imgproc, videoio};
    use std::path::Path;

    /// OpenCV `VideoCapture` wrapper for one camera file.
    pub struct VideoFileSource {
        capture: videoio::VideoCapture,
        frame_count: usize,
    }

    impl VideoFileSource {
        pub fn open(path: &Path) -> Result<Self, MediaError> {
            let name = path.to_string_lossy().to_string();
            let open_err = |reason: String| MediaError::Open {
                path: name.clone(),
                reason,
            };
            let capture = videoio::VideoCapture::from_file(&name, videoio::CAP_ANY)
                .map_err(|e| open_err(e.to_string()))?;
            if !capture.is_opened().map_err(|e| open_err(e.to_string()))? {
                return Err(open_err("unrecognised container or codec".to_string()));
            }
            let frame_count = capture
                .get(videoio::CAP_PROP_FRAME_COUNT)
                .map_err(|e| open_err(e.to_string()))? as usize;
            log::info!("Opened {name} ({frame_count} frames)");
            Ok(Self {
                capture,
                frame_count,
            })
        }
    }

    impl FrameSource for VideoFileSource {
        fn frame_count(&self) -> usize {
            self.frame_count
        }

        fn read_frame(&mut self, index: usize) -> Result<RgbImage, MediaError> {
            let decode_err = |reason: String| MediaError::Decode { index, reason };
            self.capture
                .set(videoio::CAP_PROP_POS_FRAMES, index as f64)
                .map_err(|e| decode_err(e.to_string()))?;
            let mut bgr = core::Mat::default();
            let got = self
                .capture
                .read(&mut bgr)
                .map_err(|e| decode_err(e.to_string()))?;
            if !got {
                return Err(decode_err("decoder produced no frame".to_string()));
            }
            let mut rgb = core::Mat::default();
            imgproc::cvt_color(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
                .map_err(|e| decode_err(e.to_string()))?;
            let width = rgb.cols() as u32;
            let height = rgb.rows() as u32;
            let data = rgb
                .data_bytes()
                .map_err(|e| decode_err(e.to_string()))?
                .to_vec();
            RgbImage::from_raw(width, height, data)
                .ok_or_else(|| decode_err("frame buffer size mismatch".to_string()))
        }
    }

    /// Opens [`VideoFileSource`] handles.
    pub struct VideoFileOpener;

    impl SourceOpener for VideoFileOpener {
        fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, MediaError> {
            Ok(Box::new(VideoFileSource::open(path)?))
        }
    }
}
