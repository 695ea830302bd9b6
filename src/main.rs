use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mediacore::media::{
    DecoderCapabilities, ElementaryStream, EncodedFrame, MediaDecodingConfiguration, StreamInfo, VideoConfiguration,
};
use mediacore::player::{ChannelClient, MediaPlayerEvent, SupportChecks};
use mediacore::utils::format_time;
use mediacore::{
    fit_video_to_region, Config, HeadlessMediaPlayer, MediaPlayer, Rational, Rect, VideoFillMode,
    VideoPlaybackState,
};

/// mediacore - media playback core tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file to use instead of the user config
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute where a video frame is drawn inside a region
    Fit {
        /// Decoded frame size
        #[arg(long, value_name = "WxH", value_parser = parse_size)]
        frame: (u32, u32),

        /// Drawing region size
        #[arg(long, value_name = "WxH", value_parser = parse_size)]
        bounds: (u32, u32),

        /// Sample (pixel) aspect ratio
        #[arg(long, value_name = "N:D", value_parser = parse_ratio)]
        sar: Option<Rational<u32>>,

        /// Fill mode (maintain, stretch, zoom); defaults to the configured one
        #[arg(long)]
        mode: Option<VideoFillMode>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a synthetic stream on the headless engine and print its events
    Simulate {
        /// Content duration in seconds
        #[arg(long, default_value_t = 10.0)]
        duration: f64,

        /// Playback rate; defaults to the configured one
        #[arg(long)]
        rate: Option<f64>,

        /// Frames per second of the synthetic stream
        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Seek to this time after the first tick
        #[arg(long, value_name = "SECONDS")]
        seek: Option<f64>,
    },
}

fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    Ok((w, h))
}

fn parse_ratio(s: &str) -> std::result::Result<Rational<u32>, String> {
    let (n, d) = s
        .split_once([':', '/'])
        .ok_or_else(|| format!("expected N:D, got '{}'", s))?;
    let n = n.trim().parse().map_err(|e| format!("bad numerator: {}", e))?;
    let d = d.trim().parse().map_err(|e| format!("bad denominator: {}", e))?;
    Ok(Rational::new(n, d))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    // Initialize logging
    let log_level = if args.debug { "debug" } else { config.general.log_level.as_str() };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting mediacore v{}", env!("CARGO_PKG_VERSION"));
    DecoderCapabilities::init(config.capabilities.clone());

    match args.command {
        Command::Fit {
            frame,
            bounds,
            sar,
            mode,
            json,
        } => fit(&config, frame, bounds, sar, mode, json),
        Command::Simulate {
            duration,
            rate,
            fps,
            seek,
        } => simulate(&config, duration, rate, fps, seek),
    }
}

fn fit(
    config: &Config,
    frame: (u32, u32),
    bounds: (u32, u32),
    sar: Option<Rational<u32>>,
    mode: Option<VideoFillMode>,
    json: bool,
) -> Result<()> {
    let mode = mode.unwrap_or(config.player.fill_mode);
    let sar = sar.unwrap_or_default();
    let (src, dest) = fit_video_to_region(
        Rect::from_size(frame.0, frame.1),
        Rect::from_size(bounds.0, bounds.1),
        sar,
        mode,
    );

    if json {
        let out = serde_json::json!({ "mode": mode, "src": src, "dest": dest });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("mode {}", mode);
        println!("src  {}", src);
        println!("dest {}", dest);
    }

    Ok(())
}

fn append_frames(stream: &ElementaryStream, fps: u32, from: u32, to: u32) {
    let frame_duration = 1.0 / f64::from(fps);
    for i in from..to {
        let t = f64::from(i) / f64::from(fps);
        let frame = EncodedFrame::new(Arc::clone(stream.info()), t, t, frame_duration, i % fps == 0);
        stream.add_frame(Arc::new(frame));
    }
}

fn print_events(player: &HeadlessMediaPlayer, events: &crossbeam_channel::Receiver<MediaPlayerEvent>) {
    for event in events.try_iter() {
        println!("{:>12}  {}", format_time(player.current_time()), event);
    }
}

fn simulate(config: &Config, duration: f64, rate: Option<f64>, fps: u32, seek: Option<f64>) -> Result<()> {
    if !duration.is_finite() || duration <= 0.0 {
        bail!("Duration must be a positive number of seconds");
    }
    if fps == 0 {
        bail!("Frame rate must be positive");
    }

    let player = Arc::new(HeadlessMediaPlayer::new(config));
    let as_engine: Arc<dyn MediaPlayer> = player.clone();
    SupportChecks::global().register(&as_engine);

    let (client, events) = ChannelClient::unbounded();
    player.add_client(client.clone());

    let info = Arc::new(StreamInfo::video("video/mp4", "avc1.640028", 1920, 1080));
    let query = MediaDecodingConfiguration {
        video: VideoConfiguration {
            content_type: info.full_mime(),
            width: info.width,
            height: info.height,
            framerate: f64::from(fps),
            ..Default::default()
        },
        ..Default::default()
    };
    let support = SupportChecks::global().decoding_info(&query);
    println!(
        "{} supported={} smooth={} power_efficient={}",
        info.full_mime(),
        support.supported,
        support.smooth,
        support.power_efficient
    );

    let stream = Arc::new(ElementaryStream::new(Arc::clone(&info)));
    let total_frames = (duration * f64::from(fps)).ceil() as u32;
    let half = total_frames / 2;
    append_frames(&stream, fps, 0, half);

    if !player.attach_mse() {
        bail!("Buffer-based playback is disabled in the configuration");
    }
    if !player.add_mse_buffer(&info.full_mime(), true, Arc::clone(&stream)) {
        bail!("{} is not supported by the configured capabilities", info.full_mime());
    }
    player.loaded_meta_data(duration);
    if let Some(rate) = rate {
        player.set_playback_rate(rate);
    }
    player.play();
    print_events(&player, &events);

    // Deliver the second half only once the engine runs dry, so the trace
    // shows buffering.
    let step = Duration::from_millis(250);
    let max_steps = (duration / player.playback_rate() / step.as_secs_f64()).ceil() as usize * 2 + 100;
    let mut pending_seek = seek;
    let mut appended_rest = false;

    for _ in 0..max_steps {
        player.tick(step);

        if let Some(time) = pending_seek.take() {
            player.set_current_time(time);
        }

        let state = player.playback_state();
        if !appended_rest && matches!(state, VideoPlaybackState::Buffering | VideoPlaybackState::Seeking) {
            debug!("Appending remaining {} frames", total_frames - half);
            append_frames(&stream, fps, half, total_frames);
            player.mse_end_of_stream();
            appended_rest = true;
        }

        print_events(&player, &events);
        if matches!(state, VideoPlaybackState::Ended | VideoPlaybackState::Errored) {
            break;
        }
    }

    let quality = player.video_playback_quality();
    println!(
        "Presented {} frames, final position {} of {}",
        quality.total_video_frames,
        format_time(player.current_time()),
        format_time(player.duration())
    );

    player.detach();
    print_events(&player, &events);
    SupportChecks::global().unregister(&*as_engine);

    Ok(())
}
