//! # framepipe
//!
//! Demux, filter, and re-encode video files through a windowed FFmpeg
//! frame pipeline.
//!
//! `framepipe` opens a media container, decodes its best video stream,
//! optionally threads every picture through an FFmpeg filter graph
//! (deinterlace by default), re-encodes, and writes a new container —
//! powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate. All codec,
//! container, and filter internals belong to FFmpeg; this crate supplies
//! the stage lifecycles and the windowed orchestration connecting them.
//!
//! ## Quick Start
//!
//! ### Run the whole pipeline
//!
//! ```no_run
//! use framepipe::{Pipeline, PipelineOptions};
//!
//! let options = PipelineOptions::default().filter("yadif");
//! let stats = Pipeline::new("input.mkv", "output.mp4", options).run()?;
//! println!("{} frames written", stats.frames_written);
//! # Ok::<(), framepipe::FramepipeError>(())
//! ```
//!
//! ### Drive the stages yourself
//!
//! ```no_run
//! use framepipe::{EncoderOptions, Filter, Muxer};
//!
//! let mut filter = Filter::open("input.mkv", "yadif,scale=640:480")?;
//! let mut muxer = Muxer::create("output.mp4", 640, 480, &EncoderOptions::default())?;
//! loop {
//!     let window = filter.read_video_frames(10)?;
//!     if window.is_empty() {
//!         break;
//!     }
//!     muxer.write_video_frames(window)?;
//! }
//! muxer.finish()?;
//! # Ok::<(), framepipe::FramepipeError>(())
//! ```
//!
//! ### Dump decoded frames raw
//!
//! ```no_run
//! use framepipe::Demuxer;
//!
//! let mut demuxer = Demuxer::open("input.mp4")?;
//! let frames = demuxer.dump_raw("frames.yuv")?;
//! println!("{frames} raw frames written");
//! # Ok::<(), framepipe::FramepipeError>(())
//! ```
//!
//! ## Model
//!
//! Every stage follows the same lifecycle ([`StageState`]): `Closed →
//! Opened → Streaming → Draining → Closed`, with all FFmpeg contexts
//! released exactly once in reverse acquisition order. Stages exchange
//! [`FrameWindow`]s — bounded, ordered picture batches consumed in full
//! before the next one is fetched. Processing is single-threaded and
//! synchronous throughout; any error is fatal to the run.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the system.

mod conversion;
pub mod demux;
pub mod error;
pub mod ffmpeg;
pub mod filter;
pub mod mux;
pub mod options;
pub mod pipeline;
pub mod source;
pub mod stage;
pub mod window;

pub use demux::Demuxer;
pub use error::FramepipeError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use filter::{DEFAULT_FILTER_SPEC, Filter};
pub use mux::Muxer;
pub use options::{EncoderOptions, PipelineOptions, VideoCodec};
pub use pipeline::{Pipeline, PipelineStats};
pub use source::MediaSource;
pub use stage::StageState;
pub use window::{FrameWindow, test_pattern};
