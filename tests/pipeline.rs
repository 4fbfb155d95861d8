//! End-to-end pipeline tests.
//!
//! These synthesize their own input with the test pattern generator, so no
//! fixture files are required — only a working MPEG-4 encoder, which ships
//! with every stock FFmpeg build. Tests skip when encoding is unavailable.

use std::path::Path;

use ffmpeg_next::frame::Video as VideoFrame;
use framepipe::{
    Demuxer, EncoderOptions, FrameWindow, FramepipeError, Muxer, Pipeline, PipelineOptions,
    StageState, VideoCodec, test_pattern,
};

/// `true` when the error means the encoder is missing on this platform.
fn encoder_unavailable(error: &FramepipeError) -> bool {
    let message = format!("{error}");
    message.contains("Could not find encoder") || message.contains("Could not open encoder")
}

/// Encode `total` test-pattern frames into an MPEG-4 file at `path`.
/// Returns `false` when the encoder is unavailable (test should skip).
fn synthesize_input(path: &Path, total: u64) -> bool {
    let options = EncoderOptions::default().codec(VideoCodec::Mpeg4);
    let mut muxer = match Muxer::create(path, 320, 240, &options) {
        Ok(muxer) => muxer,
        Err(error) if encoder_unavailable(&error) => {
            eprintln!("Skipping: MPEG-4 encoder not available ({error})");
            return false;
        }
        Err(error) => panic!("create muxer: {error}"),
    };

    let window: FrameWindow = (0..total)
        .map(|index| test_pattern(320, 240, index))
        .collect();
    muxer.write_video_frames(window).expect("write frames");
    muxer.finish().expect("finish");
    true
}

#[test]
fn synthesized_file_decodes_to_same_frame_count() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("pattern.mp4");
    if !synthesize_input(&input, 25) {
        return;
    }

    let mut demuxer = Demuxer::open(&input).expect("open");
    assert_eq!(demuxer.state(), StageState::Opened);

    let mut decoded: u64 = 0;
    while let Some(frame) = demuxer.next_frame().expect("decode") {
        assert_eq!(frame.width(), 320);
        assert_eq!(frame.height(), 240);
        decoded += 1;
    }

    assert_eq!(decoded, 25);
    assert_eq!(demuxer.frames_decoded(), 25);
    assert_eq!(demuxer.state(), StageState::Closed);

    // Exhaustion is sticky: further reads stay empty.
    assert!(demuxer.next_frame().expect("read after close").is_none());
    let window = demuxer.read_video_frames(10).expect("window after close");
    assert!(window.is_empty());
}

#[test]
fn windowed_reads_are_bounded_and_ordered() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("pattern.mp4");
    if !synthesize_input(&input, 25) {
        return;
    }

    let mut demuxer = Demuxer::open(&input).expect("open");
    let mut total = 0;
    loop {
        let window = demuxer.read_video_frames(10).expect("window");
        if window.is_empty() {
            break;
        }
        assert!(window.len() <= 10);
        total += window.len();
    }
    assert_eq!(total, 25);
}

#[test]
fn plain_reencode_preserves_frame_count() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("pattern.mp4");
    let output = dir.path().join("reencoded.mp4");
    if !synthesize_input(&input, 25) {
        return;
    }

    let options = PipelineOptions::default()
        .no_filter()
        .window_size(7)
        .encoder(EncoderOptions::default().codec(VideoCodec::Mpeg4));
    let stats = Pipeline::new(&input, &output, options)
        .run()
        .expect("run pipeline");

    assert_eq!(stats.frames_decoded, 25);
    assert_eq!(stats.frames_written, 25);
    // 25 frames in windows of 7: 7 + 7 + 7 + 4.
    assert_eq!(stats.windows, 4);
    assert!(output.exists());
    assert!(std::fs::metadata(&output).expect("metadata").len() > 0);
}

#[test]
fn filtered_pipeline_scales_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("pattern.mp4");
    let output = dir.path().join("scaled.mp4");
    if !synthesize_input(&input, 10) {
        return;
    }

    let options = PipelineOptions::default()
        .filter("scale=160:120")
        .encoder(EncoderOptions::default().codec(VideoCodec::Mpeg4));
    let stats = Pipeline::new(&input, &output, options)
        .run()
        .expect("run pipeline");

    assert_eq!(stats.frames_written, 10);

    let demuxer = Demuxer::open(&output).expect("open scaled output");
    assert_eq!(demuxer.source().width(), 160);
    assert_eq!(demuxer.source().height(), 120);
}

#[test]
fn observer_sees_monotonic_progress() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("pattern.mp4");
    let output = dir.path().join("observed.mp4");
    if !synthesize_input(&input, 25) {
        return;
    }

    let options = PipelineOptions::default()
        .no_filter()
        .window_size(10)
        .encoder(EncoderOptions::default().codec(VideoCodec::Mpeg4));

    let mut seen = Vec::new();
    Pipeline::new(&input, &output, options)
        .run_with_observer(|stats| seen.push(stats.frames_written))
        .expect("run pipeline");

    assert_eq!(seen, vec![10, 20, 25]);
}

/// Compare two pictures plane by plane, row by row (strides may differ).
fn assert_same_pixels(actual: &VideoFrame, expected: &VideoFrame, index: u64) {
    assert_eq!(actual.format(), expected.format(), "frame {index} format");
    for plane in 0..expected.planes() {
        let rows = expected.plane_height(plane) as usize;
        let row_len = expected.plane_width(plane) as usize;
        let (actual_stride, expected_stride) = (actual.stride(plane), expected.stride(plane));
        let (actual_data, expected_data) = (actual.data(plane), expected.data(plane));
        for row in 0..rows {
            assert_eq!(
                &actual_data[row * actual_stride..row * actual_stride + row_len],
                &expected_data[row * expected_stride..row * expected_stride + row_len],
                "frame {index}, plane {plane}, row {row}",
            );
        }
    }
}

#[test]
fn rawvideo_roundtrip_preserves_pixels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("pattern.avi");

    // Uncompressed, so decoding back must reproduce the pattern exactly.
    let options = EncoderOptions::default().codec(VideoCodec::RawVideo);
    let mut muxer = Muxer::create(&output, 320, 240, &options).expect("create muxer");
    let window: FrameWindow = (0..5).map(|index| test_pattern(320, 240, index)).collect();
    muxer.write_video_frames(window).expect("write frames");
    muxer.finish().expect("finish");

    let mut demuxer = Demuxer::open(&output).expect("open");
    let mut index: u64 = 0;
    while let Some(frame) = demuxer.next_frame().expect("decode") {
        assert_same_pixels(&frame, &test_pattern(320, 240, index), index);
        index += 1;
    }
    assert_eq!(index, 5);
}

#[test]
fn dump_raw_writes_packed_planes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("pattern.mp4");
    let dump = dir.path().join("frames.yuv");
    if !synthesize_input(&input, 5) {
        return;
    }

    let mut demuxer = Demuxer::open(&input).expect("open");
    let frames = demuxer.dump_raw(&dump).expect("dump");

    assert_eq!(frames, 5);
    // 320x240 YUV420P is 1.5 bytes per pixel, no stride padding in the dump.
    let expected = 5 * 320 * 240 * 3 / 2;
    assert_eq!(std::fs::metadata(&dump).expect("metadata").len(), expected);
}
