//! Opened media source: container + selected stream + decoder.
//!
//! [`MediaSource`] bundles the demuxer context, the best video stream, and
//! an open decoder for it. It is owned exclusively by the stage that opened
//! it, and every FFmpeg context it holds is released exactly once when the
//! value is dropped — `ffmpeg-next`'s owned wrappers replace the manual
//! open/close pairing of raw FFmpeg usage.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Rational, codec::context::Context as CodecContext, decoder::Video as VideoDecoder,
    format::Pixel, format::context::Input, media::Type,
};

use crate::{conversion::rational_to_f64, error::FramepipeError};

/// An opened container with its best video stream and an open video decoder.
///
/// Exactly one decoder is open per source stream at a time. The cached
/// stream geometry (dimensions, pixel format, time base, frame rate) is what
/// the filter graph's `buffer` source and the muxer need to configure
/// themselves.
pub struct MediaSource {
    pub(crate) input: Input,
    pub(crate) decoder: VideoDecoder,
    stream_index: usize,
    time_base: Rational,
    frame_rate: Rational,
    sample_aspect_ratio: Rational,
    width: u32,
    height: u32,
    format: Pixel,
    duration: Duration,
    path: PathBuf,
}

impl MediaSource {
    /// Open a media file and set up a decoder for its best video stream.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, selects the
    /// best video stream, and opens a decoder for it.
    ///
    /// # Errors
    ///
    /// - [`FramepipeError::FileOpen`] if the container cannot be opened.
    /// - [`FramepipeError::NoVideoStream`] if no video stream exists. This
    ///   fails fast, before any decode is attempted.
    /// - [`FramepipeError::VideoDecodeError`] if the decoder cannot be
    ///   created or opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramepipeError> {
        let path = path.as_ref();
        let source_path = path.to_path_buf();

        log::debug!("Opening media source: {}", source_path.display());

        // Initialise ffmpeg (safe to call multiple times).
        ffmpeg_next::init().map_err(|error| FramepipeError::FileOpen {
            path: source_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| FramepipeError::FileOpen {
            path: source_path.clone(),
            reason: error.to_string(),
        })?;

        let (stream_index, time_base, frame_rate, parameters) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or(FramepipeError::NoVideoStream)?;

            // Prefer the average frame rate; fall back to the raw rate field
            // for streams that do not report one.
            let avg = stream.avg_frame_rate();
            let frame_rate = if avg.denominator() != 0 && avg.numerator() != 0 {
                avg
            } else {
                stream.rate()
            };

            (
                stream.index(),
                stream.time_base(),
                frame_rate,
                stream.parameters(),
            )
        };

        let decoder_context = CodecContext::from_parameters(parameters).map_err(|error| {
            FramepipeError::VideoDecodeError(format!(
                "Failed to read codec parameters for stream {stream_index}: {error}"
            ))
        })?;
        let decoder = decoder_context.decoder().video().map_err(|error| {
            FramepipeError::VideoDecodeError(format!(
                "Failed to open video decoder for stream {stream_index}: {error}"
            ))
        })?;

        // Container-level duration, in AV_TIME_BASE (microseconds).
        let duration_microseconds = input.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let width = decoder.width();
        let height = decoder.height();
        let format = decoder.format();
        let sample_aspect_ratio = {
            let sar = decoder.aspect_ratio();
            if sar.numerator() > 0 && sar.denominator() > 0 {
                sar
            } else {
                Rational::new(1, 1)
            }
        };

        log::info!(
            "Opened {}: stream={}, {}x{}, {:?}, {}/{} fps, codec={}",
            source_path.display(),
            stream_index,
            width,
            height,
            format,
            frame_rate.numerator(),
            frame_rate.denominator(),
            decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        );

        Ok(Self {
            input,
            decoder,
            stream_index,
            time_base,
            frame_rate,
            sample_aspect_ratio,
            width,
            height,
            format,
            duration,
            path: source_path,
        })
    }

    /// Index of the selected video stream.
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /// Time base of the selected stream.
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Frame rate of the selected stream.
    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }

    /// Sample aspect ratio of the decoded pictures (1:1 when unspecified).
    pub fn sample_aspect_ratio(&self) -> Rational {
        self.sample_aspect_ratio
    }

    /// Coded picture width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Coded picture height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format the decoder reports for its output.
    pub fn format(&self) -> Pixel {
        self.format
    }

    /// Container-level duration; zero when the container does not report one.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Frame count estimated from duration and frame rate.
    ///
    /// Zero when either is unknown. An estimate only — variable-frame-rate
    /// content and filter multiplication/decimation change the real count.
    pub fn estimated_frame_count(&self) -> u64 {
        let fps = rational_to_f64(self.frame_rate);
        if fps > 0.0 {
            (self.duration.as_secs_f64() * fps) as u64
        } else {
            0
        }
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
