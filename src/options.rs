//! Pipeline and encoder configuration.
//!
//! [`EncoderOptions`] controls the destination stream (codec, frame rate,
//! resolution, bit rate, GOP size); [`PipelineOptions`] adds the windowing
//! and filter settings of the demux → filter → mux loop. Both are consuming
//! builders with sensible defaults: H.264 at 25 fps with a GOP of 12, a
//! `yadif` deinterlace filter, and a window of 10 frames per iteration.

use ffmpeg_next::codec::Id;
use ffmpeg_next::format::Pixel;

use crate::filter::DEFAULT_FILTER_SPEC;

/// Supported output video codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// H.264 / AVC.
    H264,
    /// H.265 / HEVC.
    H265,
    /// MPEG-4 Part 2.
    Mpeg4,
    /// MPEG-2 video.
    Mpeg2,
    /// Uncompressed video, stored as-is. Useful for lossless round trips;
    /// output files are large.
    RawVideo,
}

impl VideoCodec {
    /// Parse a codec name as accepted by the CLI.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "h264" | "avc" | "x264" => Some(VideoCodec::H264),
            "h265" | "hevc" | "x265" => Some(VideoCodec::H265),
            "mpeg4" | "mp4v" => Some(VideoCodec::Mpeg4),
            "mpeg2" | "mpeg2video" => Some(VideoCodec::Mpeg2),
            "rawvideo" | "raw" => Some(VideoCodec::RawVideo),
            _ => None,
        }
    }

    pub(crate) fn to_codec_id(self) -> Id {
        match self {
            VideoCodec::H264 => Id::H264,
            VideoCodec::H265 => Id::HEVC,
            VideoCodec::Mpeg4 => Id::MPEG4,
            VideoCodec::Mpeg2 => Id::MPEG2VIDEO,
            VideoCodec::RawVideo => Id::RAWVIDEO,
        }
    }

    /// The pixel format handed to the encoder.
    ///
    /// Every supported codec takes YUV420P input; anything else is
    /// converted by the muxer before encoding.
    pub(crate) fn input_pixel_format(self) -> Pixel {
        Pixel::YUV420P
    }
}

/// Options for the destination stream and its encoder.
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    /// Codec to use. Default: H.264.
    pub codec: VideoCodec,
    /// Target frames per second (default: 25).
    pub fps: u32,
    /// Output width. If `None`, taken from the first picture.
    pub width: Option<u32>,
    /// Output height. If `None`, taken from the first picture.
    pub height: Option<u32>,
    /// Bit rate in bits per second. If `None`, the encoder default is used.
    pub bitrate: Option<usize>,
    /// Group-of-pictures size: emit one intra frame every `gop` frames at
    /// most (default: 12).
    pub gop: u32,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            codec: VideoCodec::H264,
            fps: 25,
            width: None,
            height: None,
            bitrate: None,
            gop: 12,
        }
    }
}

impl EncoderOptions {
    /// Set the codec.
    pub fn codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the frame rate.
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the output resolution.
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the target bit rate in bits per second.
    pub fn bitrate(mut self, bitrate: usize) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// Set the GOP size.
    pub fn gop(mut self, gop: u32) -> Self {
        self.gop = gop;
        self
    }
}

/// Options for the windowed demux → filter → mux loop.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum pictures fetched and written per iteration (default: 10).
    pub window_size: usize,
    /// Filter spec applied between decode and encode. `None` skips the
    /// filter stage entirely (plain re-encode). Default: `yadif`.
    pub filter: Option<String>,
    /// Destination stream settings.
    pub encoder: EncoderOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            window_size: 10,
            filter: Some(DEFAULT_FILTER_SPEC.to_string()),
            encoder: EncoderOptions::default(),
        }
    }
}

impl PipelineOptions {
    /// Set the window size. Values below 1 are clamped to 1.
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size.max(1);
        self
    }

    /// Set the filter spec.
    pub fn filter<S: Into<String>>(mut self, spec: S) -> Self {
        self.filter = Some(spec.into());
        self
    }

    /// Disable the filter stage; frames go straight from decoder to encoder.
    pub fn no_filter(mut self) -> Self {
        self.filter = None;
        self
    }

    /// Set the encoder options.
    pub fn encoder(mut self, encoder: EncoderOptions) -> Self {
        self.encoder = encoder;
        self
    }
}
