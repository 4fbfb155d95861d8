//! Demuxer stage: pull packets, decode, surface pictures.
//!
//! [`Demuxer`] owns a [`MediaSource`] and runs the decode loop over its
//! selected video stream. Frames are surfaced one at a time via
//! [`next_frame`](Demuxer::next_frame) or in bounded batches via
//! [`read_video_frames`](Demuxer::read_video_frames). At end-of-stream the
//! decoder is flushed so buffered frames are drained before the stage
//! reports exhaustion.
//!
//! The raw write-out variant, [`dump_raw`](Demuxer::dump_raw), decodes the
//! whole stream and appends each picture's tightly packed planes to a
//! headerless file. Playing such a file back requires externally knowing
//! the width, height, and pixel format.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use ffmpeg_next::{Error as FfmpegError, Packet, frame::Video as VideoFrame};

use crate::{
    error::FramepipeError, source::MediaSource, stage::StageState, window::FrameWindow,
};

/// Decode loop over a single video stream.
///
/// Follows the shared stage lifecycle: `Opened` after construction,
/// `Streaming` while packets are read, `Draining` once the container is
/// exhausted and the decoder is being flushed, `Closed` after the last
/// buffered frame has been surfaced. Once `Closed`, every further read
/// returns an empty result.
pub struct Demuxer {
    source: MediaSource,
    state: StageState,
    frames_decoded: u64,
}

impl Demuxer {
    /// Open `path` and prepare the decode loop for its best video stream.
    ///
    /// # Errors
    ///
    /// Same as [`MediaSource::open`]: missing file, missing video stream,
    /// or a decoder that cannot be found/opened all abort setup.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramepipeError> {
        let source = MediaSource::open(path)?;
        Ok(Self {
            source,
            state: StageState::Opened,
            frames_decoded: 0,
        })
    }

    /// The underlying opened source.
    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Number of frames the decoder has produced so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Decode and return the next picture, or `Ok(None)` at exhaustion.
    ///
    /// Reads packets belonging to the selected stream and feeds them to the
    /// decoder until a frame is produced. When the container runs out of
    /// packets the decoder is sent EOF and drained; after the last buffered
    /// frame, `Ok(None)` is returned and the stage transitions to `Closed`.
    ///
    /// # Errors
    ///
    /// [`FramepipeError::VideoDecodeError`] on a decode failure. Per-unit
    /// errors abort the remaining loop; they are not retried or skipped.
    pub fn next_frame(&mut self) -> Result<Option<VideoFrame>, FramepipeError> {
        if self.state == StageState::Closed {
            return Ok(None);
        }

        loop {
            // Surface frames the decoder already buffered before feeding
            // more input. A single packet may yield several frames.
            let mut frame = VideoFrame::empty();
            if self.source.decoder.receive_frame(&mut frame).is_ok() {
                // Best-effort timestamp, as rendered by the demuxer.
                let timestamp = frame.timestamp();
                frame.set_pts(timestamp);
                self.frames_decoded += 1;
                log::trace!(
                    "Decoded frame {} (pts={:?}, ~{:.3}s)",
                    self.frames_decoded,
                    frame.pts(),
                    crate::conversion::pts_to_seconds(
                        frame.pts().unwrap_or(0),
                        self.source.time_base(),
                    ),
                );
                return Ok(Some(frame));
            }

            if self.state == StageState::Draining {
                self.state = StageState::Closed;
                log::debug!(
                    "Demuxer drained: {} frames decoded from {}",
                    self.frames_decoded,
                    self.source.path().display(),
                );
                return Ok(None);
            }

            self.state = StageState::Streaming;

            let mut packet = Packet::empty();
            match packet.read(&mut self.source.input) {
                Ok(()) => {
                    if packet.stream() != self.source.stream_index() {
                        continue;
                    }
                    self.source
                        .decoder
                        .send_packet(&packet)
                        .map_err(|error| FramepipeError::VideoDecodeError(error.to_string()))?;
                }
                Err(FfmpegError::Eof) => {
                    self.source
                        .decoder
                        .send_eof()
                        .map_err(|error| FramepipeError::VideoDecodeError(error.to_string()))?;
                    self.state = StageState::Draining;
                }
                Err(error) => return Err(FramepipeError::from(error)),
            }
        }
    }

    /// Read up to `window_size` decoded pictures.
    ///
    /// An empty window signals end-of-stream; it is reported exactly once,
    /// and every subsequent call keeps returning an empty window.
    pub fn read_video_frames(
        &mut self,
        window_size: usize,
    ) -> Result<FrameWindow, FramepipeError> {
        let mut window = FrameWindow::with_capacity(window_size);
        while window.len() < window_size {
            match self.next_frame()? {
                Some(frame) => window.push(frame),
                None => break,
            }
        }
        Ok(window)
    }

    /// Decode every frame and append its tightly packed planes to `path`.
    ///
    /// The output is a headerless pixel dump: no container, no timing. The
    /// `ffplay` invocation that plays it back is logged on completion.
    /// Returns the number of frames written.
    ///
    /// Assumes 8-bit-per-component planar input, which is what the decoders
    /// this tool targets produce.
    pub fn dump_raw<P: AsRef<Path>>(&mut self, path: P) -> Result<u64, FramepipeError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);

        log::info!(
            "Dumping raw video from '{}' into '{}'",
            self.source.path().display(),
            path.display(),
        );

        let mut count: u64 = 0;
        let mut geometry = None;
        while let Some(frame) = self.next_frame()? {
            write_packed_planes(&frame, &mut writer)?;
            geometry = Some((frame.width(), frame.height(), frame.format()));
            count += 1;
        }
        writer.flush()?;

        if let Some((width, height, format)) = geometry {
            log::info!(
                "Wrote {count} raw frames; play with: ffplay -f rawvideo -pix_fmt {} -video_size {}x{} {}",
                format!("{format:?}").to_lowercase(),
                width,
                height,
                path.display(),
            );
        }

        Ok(count)
    }
}

/// Write each plane of `frame` row by row, dropping stride padding.
fn write_packed_planes<W: Write>(frame: &VideoFrame, writer: &mut W) -> std::io::Result<()> {
    for plane in 0..frame.planes() {
        let stride = frame.stride(plane);
        let rows = frame.plane_height(plane) as usize;
        let row_len = (frame.plane_width(plane) as usize).min(stride);
        let data = frame.data(plane);
        for row in 0..rows {
            let start = row * stride;
            writer.write_all(&data[start..start + row_len])?;
        }
    }
    Ok(())
}
