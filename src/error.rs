//! Error types for the `framepipe` crate.
//!
//! This module defines [`FramepipeError`], the unified error type returned by
//! all fallible operations in the crate. Variants carry enough context (file
//! paths, stage names, upstream error messages) to diagnose a failure without
//! additional logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `framepipe` operations.
///
/// Every public method that can fail returns `Result<T, FramepipeError>`.
/// All failures are fatal to the current pipeline run: there is no retry
/// policy and no partial-failure recovery.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramepipeError {
    /// The input media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the opening call.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The output container could not be created.
    #[error("Failed to create output container at {path}: {reason}")]
    OutputOpen {
        /// Destination path.
        path: PathBuf,
        /// Underlying reason the create failed.
        reason: String,
    },

    /// The input file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// FFmpeg filter graph setup or processing failed.
    #[error("Filter graph error: {0}")]
    FilterGraphError(String),

    /// Video encoding failed.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// Writing encoded packets or container metadata failed.
    #[error("Video write error: {0}")]
    VideoWriteError(String),

    /// Pixel-format conversion context could not be created or run.
    #[error("Pixel format conversion error: {0}")]
    PixelConversionError(String),

    /// A stage was driven outside its `Closed → Opened → Streaming →
    /// Draining → Closed` lifecycle.
    #[error("{stage} cannot {operation} in state {state}")]
    InvalidState {
        /// The pipeline stage that rejected the call.
        stage: &'static str,
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the stage was in.
        state: &'static str,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
}

impl From<FfmpegError> for FramepipeError {
    fn from(error: FfmpegError) -> Self {
        FramepipeError::FfmpegError(error.to_string())
    }
}
