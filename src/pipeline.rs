//! The windowed demux → filter → mux loop.
//!
//! [`Pipeline`] is the orchestration layer tying the three stages together:
//! it reads bounded windows of decoded (and optionally filtered) pictures
//! from the source and writes each one to the destination before fetching
//! the next, repeating until the source reports an empty window, then
//! finishes the container. Everything runs inline on the calling thread;
//! the only suspension points are blocking disk I/O inside FFmpeg.
//!
//! # Example
//!
//! ```no_run
//! use framepipe::{Pipeline, PipelineOptions};
//!
//! let stats = Pipeline::new("input.mkv", "output.mp4", PipelineOptions::default()).run()?;
//! println!("wrote {} frames", stats.frames_written);
//! # Ok::<(), framepipe::FramepipeError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{
    demux::Demuxer,
    error::FramepipeError,
    filter::Filter,
    mux::Muxer,
    options::PipelineOptions,
    source::MediaSource,
    window::FrameWindow,
};

/// Counters for one pipeline run.
///
/// `frames_written` can differ from `frames_decoded` when the filter graph
/// multiplies or decimates frames. `frames_expected` is the estimate from
/// container duration and frame rate, zero when unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    /// Frames the decoder produced.
    pub frames_decoded: u64,
    /// Pictures encoded and written to the destination.
    pub frames_written: u64,
    /// Windows processed.
    pub windows: u64,
    /// Estimated total source frames (0 when unknown).
    pub frames_expected: u64,
}

/// Either a filtered or a plain decode loop feeding the muxer.
enum FrameSource {
    Filtered(Filter),
    Plain(Demuxer),
}

impl FrameSource {
    fn read_video_frames(&mut self, window_size: usize) -> Result<FrameWindow, FramepipeError> {
        match self {
            FrameSource::Filtered(filter) => filter.read_video_frames(window_size),
            FrameSource::Plain(demuxer) => demuxer.read_video_frames(window_size),
        }
    }

    fn frames_decoded(&self) -> u64 {
        match self {
            FrameSource::Filtered(filter) => filter.frames_decoded(),
            FrameSource::Plain(demuxer) => demuxer.frames_decoded(),
        }
    }

    fn source(&self) -> &MediaSource {
        match self {
            FrameSource::Filtered(filter) => filter.source(),
            FrameSource::Plain(demuxer) => demuxer.source(),
        }
    }
}

/// One full demux → filter → mux run from an input file to an output file.
pub struct Pipeline {
    input: PathBuf,
    output: PathBuf,
    options: PipelineOptions,
}

impl Pipeline {
    /// Describe a run. Nothing is opened until [`run`](Pipeline::run).
    pub fn new<P1: AsRef<Path>, P2: AsRef<Path>>(
        input: P1,
        output: P2,
        options: PipelineOptions,
    ) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            options,
        }
    }

    /// Execute the pipeline to completion.
    pub fn run(self) -> Result<PipelineStats, FramepipeError> {
        self.run_with_observer(|_| {})
    }

    /// Execute the pipeline, invoking `on_window` after each window is
    /// written. The observer is for reporting only (progress bars, logs);
    /// it cannot influence the run.
    ///
    /// # Errors
    ///
    /// Any stage failure aborts the run. The destination is still closed
    /// (trailer written) exactly once via the muxer's drop guard.
    pub fn run_with_observer<F>(self, mut on_window: F) -> Result<PipelineStats, FramepipeError>
    where
        F: FnMut(&PipelineStats),
    {
        let mut source = match &self.options.filter {
            Some(spec) => FrameSource::Filtered(Filter::open(&self.input, spec)?),
            None => FrameSource::Plain(Demuxer::open(&self.input)?),
        };

        let frames_expected = source.source().estimated_frame_count();
        log::info!(
            "Pipeline {} -> {} (window={}, filter={:?}, ~{} frames)",
            self.input.display(),
            self.output.display(),
            self.options.window_size,
            self.options.filter,
            frames_expected,
        );

        let mut stats = PipelineStats {
            frames_expected,
            ..PipelineStats::default()
        };

        // The muxer is created from the first window's geometry: a scale
        // filter changes the picture size, which is only known once the
        // first filtered frame exists. A source with zero frames still
        // produces a well-formed (empty) container, header and trailer
        // written exactly once.
        let mut window = source.read_video_frames(self.options.window_size)?;
        let (width, height) = match window.frames().first() {
            Some(first) => (first.width(), first.height()),
            None => (source.source().width(), source.source().height()),
        };
        let mut muxer = Muxer::create(&self.output, width, height, &self.options.encoder)?;

        while !window.is_empty() {
            stats.frames_written += muxer.write_video_frames(window)?;
            stats.frames_decoded = source.frames_decoded();
            stats.windows += 1;
            on_window(&stats);

            window = source.read_video_frames(self.options.window_size)?;
        }

        muxer.finish()?;

        stats.frames_decoded = source.frames_decoded();
        log::info!(
            "Pipeline complete: {} decoded, {} written in {} windows",
            stats.frames_decoded,
            stats.frames_written,
            stats.windows,
        );

        Ok(stats)
    }
}
