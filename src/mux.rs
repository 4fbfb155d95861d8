//! Muxer stage: encode pictures and write them into a container.
//!
//! [`Muxer`] owns the destination container, its single video stream, and
//! the open encoder — the write-side analogue of
//! [`MediaSource`](crate::MediaSource). Pictures whose pixel format or
//! geometry differ from what the encoder expects are converted through a
//! lazily created `swscale` context before encoding.
//!
//! Teardown is guarded: the trailer write and context release execute
//! exactly once per container, whether [`finish`](Muxer::finish) is called
//! once, twice, or not at all before drop — even when the frame loop errors
//! early.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Packet, Rational,
    codec::context::Context as CodecContext,
    encoder::video::Encoder as VideoEncoder,
    format::{Flags as FormatFlags, Pixel, context::Output},
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{
    error::FramepipeError, options::EncoderOptions, stage::StageState, window::FrameWindow,
};

/// Destination container + stream + open encoder.
///
/// Exactly one encoder is open per destination stream. Frames are assigned
/// monotonically increasing PTS in the encoder time base (`1/fps`), so the
/// output plays at the configured frame rate regardless of input timing.
pub struct Muxer {
    output: Output,
    encoder: VideoEncoder,
    stream_index: usize,
    encoder_time_base: Rational,
    target_format: Pixel,
    target_width: u32,
    target_height: u32,
    scaler: Option<ScalingContext>,
    scaler_input: Option<(Pixel, u32, u32)>,
    state: StageState,
    next_pts: i64,
    frames_written: u64,
    path: PathBuf,
}

impl Muxer {
    /// Create the destination container and open an encoder for it.
    ///
    /// The container format is inferred from the file extension. `width`
    /// and `height` are the fallback output geometry; `options.width` /
    /// `options.height` override them. Writes the container header.
    ///
    /// # Errors
    ///
    /// - [`FramepipeError::OutputOpen`] if the output cannot be created.
    /// - [`FramepipeError::VideoEncodeError`] if the encoder cannot be
    ///   found or opened.
    /// - [`FramepipeError::VideoWriteError`] if the stream cannot be added
    ///   or the header cannot be written.
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        options: &EncoderOptions,
    ) -> Result<Self, FramepipeError> {
        let path = path.as_ref();
        let destination = path.to_path_buf();

        ffmpeg_next::init().map_err(|error| FramepipeError::OutputOpen {
            path: destination.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let target_width = options.width.unwrap_or(width);
        let target_height = options.height.unwrap_or(height);
        let codec_id = options.codec.to_codec_id();
        let target_format = options.codec.input_pixel_format();

        log::info!(
            "Creating output {} ({}x{}, codec={:?}, fps={}, gop={})",
            destination.display(),
            target_width,
            target_height,
            options.codec,
            options.fps,
            options.gop,
        );

        let mut output =
            ffmpeg_next::format::output(&path).map_err(|error| FramepipeError::OutputOpen {
                path: destination.clone(),
                reason: error.to_string(),
            })?;

        // Some formats want stream headers to be separate; check before
        // adding the stream to avoid a borrow conflict.
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let encoder_codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            FramepipeError::VideoEncodeError(format!("Could not find encoder for {codec_id:?}"))
        })?;

        let mut stream = output.add_stream(encoder_codec).map_err(|error| {
            FramepipeError::VideoWriteError(format!("Could not allocate stream: {error}"))
        })?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| {
                FramepipeError::VideoEncodeError(format!(
                    "Could not create codec context: {error}"
                ))
            })?
            .encoder()
            .video()
            .map_err(|error| {
                FramepipeError::VideoEncodeError(format!("Not a video encoder: {error}"))
            })?;

        let encoder_time_base = Rational::new(1, options.fps as i32);

        encoder.set_width(target_width);
        encoder.set_height(target_height);
        encoder.set_format(target_format);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(Rational::new(options.fps as i32, 1)));
        encoder.set_gop(options.gop);
        if let Some(bitrate) = options.bitrate {
            encoder.set_bit_rate(bitrate);
        }
        if codec_id == ffmpeg_next::codec::Id::MPEG2VIDEO {
            encoder.set_max_b_frames(2);
        }

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let opened_encoder = encoder.open_as(encoder_codec).map_err(|error| {
            FramepipeError::VideoEncodeError(format!("Could not open encoder: {error}"))
        })?;

        stream.set_parameters(&opened_encoder);

        output.write_header().map_err(|error| {
            FramepipeError::VideoWriteError(format!("Could not write header: {error}"))
        })?;

        Ok(Self {
            output,
            encoder: opened_encoder,
            stream_index,
            encoder_time_base,
            target_format,
            target_width,
            target_height,
            scaler: None,
            scaler_input: None,
            state: StageState::Opened,
            next_pts: 0,
            frames_written: 0,
            path: destination,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Number of pictures encoded and handed to the container so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode and write a window of pictures in presentation order.
    ///
    /// Consumes the window: pictures are owned by the muxer from here on,
    /// per the hand-off discipline. Each picture is converted to the
    /// encoder's pixel format and geometry when needed, assigned the next
    /// PTS, encoded, and every packet the encoder yields is written
    /// interleaved. Returns the number of pictures consumed.
    ///
    /// # Errors
    ///
    /// Any encode or write failure aborts the remaining loop. The muxer
    /// can still be finished (and is finished on drop), so the trailer is
    /// written exactly once regardless.
    pub fn write_video_frames(&mut self, window: FrameWindow) -> Result<u64, FramepipeError> {
        if self.state == StageState::Closed || self.state == StageState::Draining {
            return Err(FramepipeError::InvalidState {
                stage: "Muxer",
                operation: "write frames",
                state: self.state.name(),
            });
        }
        self.state = StageState::Streaming;

        let mut written: u64 = 0;
        for frame in window {
            let mut outgoing = self.convert(frame)?;
            outgoing.set_pts(Some(self.next_pts));
            self.next_pts += 1;

            self.encoder.send_frame(&outgoing).map_err(|error| {
                FramepipeError::VideoEncodeError(format!("send_frame failed: {error}"))
            })?;
            self.write_pending_packets()?;

            self.frames_written += 1;
            written += 1;
        }

        log::debug!(
            "Wrote window of {written} frames to {} ({} total)",
            self.path.display(),
            self.frames_written,
        );

        Ok(written)
    }

    /// Flush the encoder and write the trailer.
    ///
    /// Idempotent: the first call drains and writes the trailer, later
    /// calls are no-ops. Called automatically on drop if skipped.
    pub fn finish(&mut self) -> Result<(), FramepipeError> {
        self.close()
    }

    fn close(&mut self) -> Result<(), FramepipeError> {
        if self.state == StageState::Closed {
            return Ok(());
        }
        self.state = StageState::Draining;

        // Attempt both the drain and the trailer even if the drain fails:
        // the trailer must be written before the encoder context goes away,
        // and it must be attempted exactly once.
        let drain_result = self
            .encoder
            .send_eof()
            .map_err(|error| {
                FramepipeError::VideoEncodeError(format!("send_eof failed: {error}"))
            })
            .and_then(|()| self.write_pending_packets());

        let trailer_result = self.output.write_trailer().map_err(|error| {
            FramepipeError::VideoWriteError(format!("Could not write trailer: {error}"))
        });

        self.state = StageState::Closed;
        log::info!(
            "Closed {} after {} frames",
            self.path.display(),
            self.frames_written,
        );

        drain_result?;
        trailer_result
    }

    /// Receive every packet the encoder has ready and write it interleaved.
    fn write_pending_packets(&mut self) -> Result<(), FramepipeError> {
        let stream_time_base = self
            .output
            .stream(self.stream_index)
            .ok_or_else(|| {
                FramepipeError::VideoWriteError("Output stream disappeared".to_string())
            })?
            .time_base();

        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, stream_time_base);
            packet.write_interleaved(&mut self.output).map_err(|error| {
                FramepipeError::VideoWriteError(format!("write packet failed: {error}"))
            })?;
        }
        Ok(())
    }

    /// Convert a picture to the encoder's pixel format and geometry.
    ///
    /// Pictures that already match are passed through untouched. The
    /// scaling context is created on the first mismatching picture and
    /// recreated when the input signature changes mid-stream.
    fn convert(&mut self, frame: VideoFrame) -> Result<VideoFrame, FramepipeError> {
        let signature = (frame.format(), frame.width(), frame.height());
        if signature == (self.target_format, self.target_width, self.target_height) {
            return Ok(frame);
        }

        if self.scaler.is_none() || self.scaler_input != Some(signature) {
            let context = ScalingContext::get(
                frame.format(),
                frame.width(),
                frame.height(),
                self.target_format,
                self.target_width,
                self.target_height,
                ScalingFlags::BICUBIC,
            )
            .map_err(|error| {
                FramepipeError::PixelConversionError(format!(
                    "Could not initialize the conversion context: {error}"
                ))
            })?;
            self.scaler = Some(context);
            self.scaler_input = Some(signature);
        }

        let mut converted = VideoFrame::empty();
        self.scaler
            .as_mut()
            .ok_or_else(|| {
                FramepipeError::PixelConversionError("Conversion context missing".to_string())
            })?
            .run(&frame, &mut converted)
            .map_err(|error| {
                FramepipeError::PixelConversionError(format!("sws_scale failed: {error}"))
            })?;

        Ok(converted)
    }
}

impl Drop for Muxer {
    fn drop(&mut self) {
        if self.state != StageState::Closed {
            log::warn!(
                "Muxer for {} dropped without finish(); closing now",
                self.path.display(),
            );
            if let Err(error) = self.close() {
                log::warn!("Best-effort close of {} failed: {error}", self.path.display());
            }
        }
    }
}
