use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use colored::Colorize;
use framepipe::{
    Demuxer, EncoderOptions, FfmpegLogLevel, FramepipeError, FrameWindow, Muxer, Pipeline,
    PipelineOptions, VideoCodec, set_ffmpeg_log_level, test_pattern,
};
use indicatif::{ProgressBar, ProgressStyle};

const CLI_AFTER_HELP: &str = "Examples:\n  framepipe input.mkv output.mp4\n  framepipe input.mkv output.mp4 --filter yadif,scale=1280:720 --progress\n  framepipe input.mkv output.mp4 --no-filter --codec mpeg4 --bitrate 4000000\n  framepipe input.mp4 frames.yuv --raw-dump\n  framepipe unused pattern.mp4 --synthesize 250";

#[derive(Debug, Parser)]
#[command(
    name = "framepipe",
    version,
    about = "Demux, filter, and re-encode video files through a windowed FFmpeg pipeline",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input media file.
    input: PathBuf,

    /// Output file (container inferred from the extension).
    output: PathBuf,

    /// Filter spec applied between decode and encode.
    #[arg(long, default_value = framepipe::DEFAULT_FILTER_SPEC, conflicts_with = "no_filter")]
    filter: String,

    /// Skip the filter stage; plain decode → encode.
    #[arg(long)]
    no_filter: bool,

    /// Frames fetched and written per pipeline iteration.
    #[arg(long, default_value_t = 10)]
    window_size: usize,

    /// Output codec (h264, h265, mpeg4, mpeg2, rawvideo).
    #[arg(long, default_value = "h264", value_parser = parse_codec)]
    codec: VideoCodec,

    /// Output frame rate.
    #[arg(long, default_value_t = 25)]
    fps: u32,

    /// Output bit rate in bits per second (encoder default when omitted).
    #[arg(long)]
    bitrate: Option<usize>,

    /// Group-of-pictures size.
    #[arg(long, default_value_t = 12)]
    gop: u32,

    /// Override output width (default: source/filter output width).
    #[arg(long)]
    width: Option<u32>,

    /// Override output height (default: source/filter output height).
    #[arg(long)]
    height: Option<u32>,

    /// Decode only and write raw (headerless) frames to the output path.
    #[arg(long, conflicts_with_all = ["no_filter", "synthesize"])]
    raw_dump: bool,

    /// Ignore the input; encode N synthetic test-pattern frames instead.
    #[arg(long, value_name = "FRAMES")]
    synthesize: Option<u64>,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,

    /// Show additional FFmpeg output (shortcut for --log-level info).
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,
}

fn parse_codec(name: &str) -> Result<VideoCodec, String> {
    VideoCodec::from_name(name).ok_or_else(|| {
        format!("unknown codec '{name}' (expected h264, h265, mpeg4, mpeg2, or rawvideo)")
    })
}

fn run() -> Result<(), FramepipeError> {
    let cli = Cli::parse();

    // FFmpeg's own stderr output defaults to errors only; --verbose or an
    // explicit --log-level widens it.
    let level = match &cli.log_level {
        Some(name) => FfmpegLogLevel::from_name(name).ok_or_else(|| {
            FramepipeError::FfmpegError(format!("unknown FFmpeg log level '{name}'"))
        })?,
        None if cli.verbose => FfmpegLogLevel::Info,
        None => FfmpegLogLevel::Error,
    };
    set_ffmpeg_log_level(level);

    let started = Instant::now();

    if cli.raw_dump {
        let mut demuxer = Demuxer::open(&cli.input)?;
        let source = demuxer.source();
        let (width, height, format) = (source.width(), source.height(), source.format());
        let frames = demuxer.dump_raw(&cli.output)?;
        println!(
            "{} {frames} raw frames to {} in {:.2}s",
            "dumped".green().bold(),
            cli.output.display(),
            started.elapsed().as_secs_f64(),
        );
        println!(
            "play with: ffplay -f rawvideo -pix_fmt {} -video_size {}x{} {}",
            format!("{format:?}").to_lowercase(),
            width,
            height,
            cli.output.display(),
        );
        return Ok(());
    }

    let mut encoder_options = EncoderOptions::default()
        .codec(cli.codec)
        .fps(cli.fps)
        .gop(cli.gop);
    if let Some(bitrate) = cli.bitrate {
        encoder_options = encoder_options.bitrate(bitrate);
    }
    if let (Some(width), Some(height)) = (cli.width, cli.height) {
        encoder_options = encoder_options.resolution(width, height);
    }

    if let Some(total) = cli.synthesize {
        let frames = synthesize(&cli, &encoder_options, total)?;
        println!(
            "{} {frames} synthetic frames to {} in {:.2}s",
            "encoded".green().bold(),
            cli.output.display(),
            started.elapsed().as_secs_f64(),
        );
        return Ok(());
    }

    let mut options = PipelineOptions::default()
        .window_size(cli.window_size)
        .encoder(encoder_options);
    options = if cli.no_filter {
        options.no_filter()
    } else {
        options.filter(cli.filter.clone())
    };

    let bar = if cli.progress {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} frames",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };

    let stats = Pipeline::new(&cli.input, &cli.output, options).run_with_observer(|stats| {
        if let Some(bar) = &bar {
            if bar.length() == Some(0) && stats.frames_expected > 0 {
                bar.set_length(stats.frames_expected);
            }
            bar.set_position(stats.frames_written);
        }
    })?;

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    println!(
        "{} {} frames ({} decoded, {} windows) to {} in {:.2}s",
        "wrote".green().bold(),
        stats.frames_written,
        stats.frames_decoded,
        stats.windows,
        cli.output.display(),
        started.elapsed().as_secs_f64(),
    );

    Ok(())
}

/// Encode `total` generated test-pattern frames, windowed like a real run.
fn synthesize(
    cli: &Cli,
    encoder_options: &EncoderOptions,
    total: u64,
) -> Result<u64, FramepipeError> {
    let width = cli.width.unwrap_or(1280);
    let height = cli.height.unwrap_or(720);
    let window_size = cli.window_size.max(1);

    let mut muxer = Muxer::create(&cli.output, width, height, encoder_options)?;
    let mut index: u64 = 0;
    while index < total {
        let window: FrameWindow = (index..total.min(index + window_size as u64))
            .map(|frame_index| test_pattern(width, height, frame_index))
            .collect();
        index += window.len() as u64;
        muxer.write_video_frames(window)?;
    }
    muxer.finish()?;
    Ok(index)
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
