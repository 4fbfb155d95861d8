//! Failure mode and teardown guard tests.

use std::io::Write;

use framepipe::{
    Demuxer, EncoderOptions, FrameWindow, FramepipeError, Muxer, Pipeline, PipelineOptions,
    StageState, VideoCodec, test_pattern,
};

fn encoder_unavailable(error: &FramepipeError) -> bool {
    let message = format!("{error}");
    message.contains("Could not find encoder") || message.contains("Could not open encoder")
}

#[test]
fn open_missing_file_fails() {
    let result = Demuxer::open("/nonexistent/missing.mp4");
    assert!(matches!(result, Err(FramepipeError::FileOpen { .. })));
}

#[test]
fn open_non_media_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("not_a_video.txt");
    let mut file = std::fs::File::create(&path).expect("create");
    file.write_all(b"this is not a media container").expect("write");
    drop(file);

    assert!(Demuxer::open(&path).is_err());
}

#[test]
fn open_audio_only_file_fails_with_no_video_stream() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("silence.wav");

    // Minimal PCM WAV: RIFF header plus 0.1s of 16-bit mono silence. Probes
    // as an audio-only container, so stream selection (not the container
    // open) is what fails.
    let samples = vec![0u8; 1600];
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + samples.len() as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&8000u32.to_le_bytes()); // sample rate
    bytes.extend_from_slice(&16000u32.to_le_bytes()); // byte rate
    bytes.extend_from_slice(&2u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&samples);
    std::fs::write(&path, bytes).expect("write wav");

    let result = Demuxer::open(&path);
    assert!(matches!(result, Err(FramepipeError::NoVideoStream)));
}

#[test]
fn pipeline_with_missing_input_fails() {
    let result = Pipeline::new(
        "/nonexistent/missing.mp4",
        "/tmp/unused.mp4",
        PipelineOptions::default(),
    )
    .run();
    assert!(result.is_err());
}

#[test]
fn finish_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("idempotent.mp4");

    let options = EncoderOptions::default().codec(VideoCodec::Mpeg4);
    let mut muxer = match Muxer::create(&output, 320, 240, &options) {
        Ok(muxer) => muxer,
        Err(error) if encoder_unavailable(&error) => {
            eprintln!("Skipping: MPEG-4 encoder not available ({error})");
            return;
        }
        Err(error) => panic!("create muxer: {error}"),
    };

    let window: FrameWindow = (0..3).map(|index| test_pattern(320, 240, index)).collect();
    muxer.write_video_frames(window).expect("write");

    muxer.finish().expect("first finish");
    assert_eq!(muxer.state(), StageState::Closed);
    muxer.finish().expect("second finish is a no-op");
}

#[test]
fn write_after_finish_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("closed.mp4");

    let options = EncoderOptions::default().codec(VideoCodec::Mpeg4);
    let mut muxer = match Muxer::create(&output, 320, 240, &options) {
        Ok(muxer) => muxer,
        Err(error) if encoder_unavailable(&error) => {
            eprintln!("Skipping: MPEG-4 encoder not available ({error})");
            return;
        }
        Err(error) => panic!("create muxer: {error}"),
    };
    muxer.finish().expect("finish");

    let window: FrameWindow = std::iter::once(test_pattern(320, 240, 0)).collect();
    let result = muxer.write_video_frames(window);
    assert!(matches!(result, Err(FramepipeError::InvalidState { .. })));
}

#[test]
fn drop_without_finish_closes_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("dropped.mp4");

    let options = EncoderOptions::default().codec(VideoCodec::Mpeg4);
    let muxer = match Muxer::create(&output, 320, 240, &options) {
        Ok(muxer) => muxer,
        Err(error) if encoder_unavailable(&error) => {
            eprintln!("Skipping: MPEG-4 encoder not available ({error})");
            return;
        }
        Err(error) => panic!("create muxer: {error}"),
    };

    // The drop guard must write the trailer without panicking.
    drop(muxer);
    assert!(output.exists());
}
