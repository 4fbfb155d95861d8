//! Filter stage: decode loop plus an FFmpeg filter graph.
//!
//! [`Filter`] wraps a [`Demuxer`] and threads every decoded picture through
//! a filter graph described by a textual filter spec (`yadif`,
//! `scale=640:-1`, `yadif,scale=640:480`, ...). A filter may buffer, drop,
//! or duplicate frames — a deinterlacer in field mode emits two outputs per
//! input — so the number of filtered pictures relates to the graph's
//! output, not to the input packet count.
//!
//! # Example
//!
//! ```no_run
//! use framepipe::{Filter, FramepipeError};
//!
//! let mut filter = Filter::open("interlaced.mkv", "yadif")?;
//! loop {
//!     let window = filter.read_video_frames(10)?;
//!     if window.is_empty() {
//!         break;
//!     }
//!     // hand the window to a muxer
//! }
//! # Ok::<(), FramepipeError>(())
//! ```

use std::path::Path;

use ffmpeg_next::{filter::Graph as FilterGraph, frame::Video as VideoFrame};
use ffmpeg_sys_next::AVPixelFormat;

use crate::{
    demux::Demuxer, error::FramepipeError, source::MediaSource, stage::StageState,
    window::FrameWindow,
};

/// The default filter spec: deinterlace with yadif.
pub const DEFAULT_FILTER_SPEC: &str = "yadif";

/// Decode loop with a filter graph between decoder and caller.
pub struct Filter {
    demuxer: Demuxer,
    graph: FilterGraph,
    spec: String,
    frames_filtered: u64,
    source_exhausted: bool,
    sink_drained: bool,
}

impl Filter {
    /// Open `path` and build a filter graph from `spec`.
    ///
    /// The graph is `buffer` (fed with the source's geometry and time base)
    /// → the parsed `spec` → `buffersink`.
    ///
    /// # Errors
    ///
    /// - Everything [`Demuxer::open`] can return.
    /// - [`FramepipeError::FilterGraphError`] if the graph cannot be
    ///   constructed, parsed, or validated.
    pub fn open<P: AsRef<Path>>(path: P, spec: &str) -> Result<Self, FramepipeError> {
        let demuxer = Demuxer::open(path)?;
        let graph = build_graph(demuxer.source(), spec)?;

        log::info!(
            "Filter graph '{spec}' ready for {}",
            demuxer.source().path().display(),
        );

        Ok(Self {
            demuxer,
            graph,
            spec: spec.to_string(),
            frames_filtered: 0,
            source_exhausted: false,
            sink_drained: false,
        })
    }

    /// The filter spec the graph was built from.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// The underlying opened source.
    pub fn source(&self) -> &MediaSource {
        self.demuxer.source()
    }

    /// Current lifecycle state of the stage.
    ///
    /// Mirrors the wrapped decode loop until the graph itself is draining.
    pub fn state(&self) -> StageState {
        if self.sink_drained {
            StageState::Closed
        } else if self.source_exhausted {
            StageState::Draining
        } else {
            self.demuxer.state()
        }
    }

    /// Number of frames the decoder produced.
    pub fn frames_decoded(&self) -> u64 {
        self.demuxer.frames_decoded()
    }

    /// Number of filtered pictures surfaced to the caller.
    pub fn frames_filtered(&self) -> u64 {
        self.frames_filtered
    }

    /// Read up to `window_size` filtered pictures.
    ///
    /// An empty window signals end-of-input exactly once; subsequent calls
    /// keep returning empty windows.
    pub fn read_video_frames(
        &mut self,
        window_size: usize,
    ) -> Result<FrameWindow, FramepipeError> {
        let mut window = FrameWindow::with_capacity(window_size);
        while window.len() < window_size {
            match self.read_video_frame()? {
                Some(frame) => window.push(frame),
                None => break,
            }
        }
        Ok(window)
    }

    /// Produce the next filtered picture, or `Ok(None)` at exhaustion.
    fn read_video_frame(&mut self) -> Result<Option<VideoFrame>, FramepipeError> {
        loop {
            // Pull buffered output before feeding more input; a single
            // decoded frame may fan out into several filtered ones.
            let mut filtered = VideoFrame::empty();
            if self.sink(&mut filtered)? {
                self.frames_filtered += 1;
                return Ok(Some(filtered));
            }

            if self.source_exhausted {
                self.sink_drained = true;
                log::debug!(
                    "Filter drained: {} decoded, {} filtered",
                    self.demuxer.frames_decoded(),
                    self.frames_filtered,
                );
                return Ok(None);
            }

            match self.demuxer.next_frame()? {
                Some(frame) => {
                    self.graph
                        .get("in")
                        .ok_or_else(|| {
                            FramepipeError::FilterGraphError("Filter 'in' not found".to_string())
                        })?
                        .source()
                        .add(&frame)
                        .map_err(|error| {
                            FramepipeError::FilterGraphError(format!(
                                "Error while feeding the filter graph: {error}"
                            ))
                        })?;
                }
                None => {
                    // Signal EOF to the graph so buffering filters emit
                    // their remaining pictures.
                    self.graph
                        .get("in")
                        .ok_or_else(|| {
                            FramepipeError::FilterGraphError("Filter 'in' not found".to_string())
                        })?
                        .source()
                        .flush()
                        .map_err(|error| {
                            FramepipeError::FilterGraphError(format!(
                                "Error while flushing the filter graph: {error}"
                            ))
                        })?;
                    self.source_exhausted = true;
                }
            }
        }
    }

    /// Try to pull one picture from the graph sink.
    fn sink(&mut self, filtered: &mut VideoFrame) -> Result<bool, FramepipeError> {
        Ok(self
            .graph
            .get("out")
            .ok_or_else(|| FramepipeError::FilterGraphError("Filter 'out' not found".to_string()))?
            .sink()
            .frame(filtered)
            .is_ok())
    }
}

/// Build `buffer` → parsed spec → `buffersink` for the given source.
fn build_graph(source: &MediaSource, spec: &str) -> Result<FilterGraph, FramepipeError> {
    let mut graph = FilterGraph::new();

    let time_base = source.time_base();
    let sar = source.sample_aspect_ratio();
    let buffer_args = format!(
        "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect={}/{}",
        source.width(),
        source.height(),
        AVPixelFormat::from(source.format()) as i32,
        time_base.numerator(),
        time_base.denominator(),
        sar.numerator(),
        sar.denominator(),
    );

    graph
        .add(
            &ffmpeg_next::filter::find("buffer").ok_or_else(|| {
                FramepipeError::FilterGraphError("FFmpeg 'buffer' filter not found".to_string())
            })?,
            "in",
            &buffer_args,
        )
        .map_err(|error| {
            FramepipeError::FilterGraphError(format!("Could not create buffer source: {error}"))
        })?;

    graph
        .add(
            &ffmpeg_next::filter::find("buffersink").ok_or_else(|| {
                FramepipeError::FilterGraphError("FFmpeg 'buffersink' filter not found".to_string())
            })?,
            "out",
            "",
        )
        .map_err(|error| {
            FramepipeError::FilterGraphError(format!("Could not create buffer sink: {error}"))
        })?;

    graph
        .output("in", 0)
        .map_err(|error| {
            FramepipeError::FilterGraphError(format!("Filter graph output error: {error}"))
        })?
        .input("out", 0)
        .map_err(|error| {
            FramepipeError::FilterGraphError(format!("Filter graph input error: {error}"))
        })?
        .parse(spec)
        .map_err(|error| {
            FramepipeError::FilterGraphError(format!("Could not parse filter graph: {error}"))
        })?;

    graph.validate().map_err(|error| {
        FramepipeError::FilterGraphError(format!(
            "Could not validate links and formats in the graph: {error}"
        ))
    })?;

    Ok(graph)
}
