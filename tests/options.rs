//! Configuration builder tests.

use framepipe::{EncoderOptions, PipelineOptions, VideoCodec};

#[test]
fn encoder_options_defaults() {
    let options = EncoderOptions::default();

    assert_eq!(options.codec, VideoCodec::H264);
    assert_eq!(options.fps, 25);
    assert_eq!(options.width, None);
    assert_eq!(options.height, None);
    assert_eq!(options.bitrate, None);
    assert_eq!(options.gop, 12);
}

#[test]
fn encoder_options_builder() {
    let options = EncoderOptions::default()
        .codec(VideoCodec::Mpeg2)
        .fps(30)
        .resolution(1920, 1080)
        .bitrate(4_000_000)
        .gop(25);

    assert_eq!(options.codec, VideoCodec::Mpeg2);
    assert_eq!(options.fps, 30);
    assert_eq!(options.width, Some(1920));
    assert_eq!(options.height, Some(1080));
    assert_eq!(options.bitrate, Some(4_000_000));
    assert_eq!(options.gop, 25);
}

#[test]
fn pipeline_options_defaults() {
    let options = PipelineOptions::default();

    assert_eq!(options.window_size, 10);
    assert_eq!(options.filter.as_deref(), Some("yadif"));
}

#[test]
fn pipeline_options_builder() {
    let options = PipelineOptions::default()
        .window_size(4)
        .filter("yadif,scale=320:240")
        .encoder(EncoderOptions::default().fps(50));

    assert_eq!(options.window_size, 4);
    assert_eq!(options.filter.as_deref(), Some("yadif,scale=320:240"));
    assert_eq!(options.encoder.fps, 50);
}

#[test]
fn pipeline_options_no_filter() {
    let options = PipelineOptions::default().no_filter();
    assert_eq!(options.filter, None);
}

#[test]
fn pipeline_options_window_size_clamped() {
    let options = PipelineOptions::default().window_size(0);
    assert_eq!(options.window_size, 1);
}

#[test]
fn video_codec_from_name() {
    assert_eq!(VideoCodec::from_name("h264"), Some(VideoCodec::H264));
    assert_eq!(VideoCodec::from_name("AVC"), Some(VideoCodec::H264));
    assert_eq!(VideoCodec::from_name("hevc"), Some(VideoCodec::H265));
    assert_eq!(VideoCodec::from_name("x265"), Some(VideoCodec::H265));
    assert_eq!(VideoCodec::from_name("mpeg4"), Some(VideoCodec::Mpeg4));
    assert_eq!(VideoCodec::from_name("mpeg2video"), Some(VideoCodec::Mpeg2));
    assert_eq!(VideoCodec::from_name("rawvideo"), Some(VideoCodec::RawVideo));
    assert_eq!(VideoCodec::from_name("raw"), Some(VideoCodec::RawVideo));
    assert_eq!(VideoCodec::from_name("av1"), None);
}
