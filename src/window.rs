//! Bounded, ordered batches of decoded pictures.
//!
//! A [`FrameWindow`] is the unit of exchange between the producing stage
//! (demuxer or filter) and the muxer: an ordered, bounded sequence of
//! pictures where insertion order is presentation order. Windows are
//! transient — each one is fully consumed before the next is fetched.
//!
//! Each picture is an [`ffmpeg_next::frame::Video`] owning its own buffer,
//! so a frame handed downstream is never written to again by the producer.

use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame};

/// An ordered, bounded sequence of pictures produced per pipeline iteration.
#[derive(Default)]
pub struct FrameWindow {
    frames: Vec<VideoFrame>,
}

impl FrameWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty window sized for `window_size` pictures.
    pub fn with_capacity(window_size: usize) -> Self {
        Self {
            frames: Vec::with_capacity(window_size),
        }
    }

    /// Append a picture. Insertion order is presentation order.
    pub fn push(&mut self, frame: VideoFrame) {
        self.frames.push(frame);
    }

    /// Number of pictures in the window.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when the window holds no pictures.
    ///
    /// An empty window returned by a producing stage signals end-of-input.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Borrow the pictures in presentation order.
    pub fn frames(&self) -> &[VideoFrame] {
        &self.frames
    }
}

impl IntoIterator for FrameWindow {
    type Item = VideoFrame;
    type IntoIter = std::vec::IntoIter<VideoFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl FromIterator<VideoFrame> for FrameWindow {
    fn from_iter<I: IntoIterator<Item = VideoFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

/// Generate a synthetic YUV420P test-pattern picture.
///
/// The pattern is a deterministic function of `index`, so consecutive
/// frames animate. Used by the `--synthesize` CLI mode and by tests that
/// need pictures without a fixture file. `width` and `height` must be even.
pub fn test_pattern(width: u32, height: u32, index: u64) -> VideoFrame {
    let mut frame = VideoFrame::new(Pixel::YUV420P, width, height);
    let w = width as usize;
    let h = height as usize;
    let i = index as usize;

    // Y
    let stride = frame.stride(0);
    let data = frame.data_mut(0);
    for y in 0..h {
        for x in 0..w {
            data[y * stride + x] = (x + y + i * 3) as u8;
        }
    }

    // Cb
    let stride = frame.stride(1);
    let data = frame.data_mut(1);
    for y in 0..h / 2 {
        for x in 0..w / 2 {
            data[y * stride + x] = (128 + y + i * 2) as u8;
        }
    }

    // Cr
    let stride = frame.stride(2);
    let data = frame.data_mut(2);
    for y in 0..h / 2 {
        for x in 0..w / 2 {
            data[y * stride + x] = (64 + x + i * 5) as u8;
        }
    }

    frame
}
