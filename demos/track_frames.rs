use fern::Dispatch;
use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use larvatrack_rs::{
    export::save_track_points,
    pipeline::FrameObserver,
    render::{render_track_image, TrailRenderer},
    ExperimentMeta, Frame, Point, ResultsTable, TrackerConfig, VideoInput,
    VideoPipeline,
};
use log::LevelFilter;
use std::{
    env,
    error::Error,
    ffi::OsStr,
    fs,
    io::stderr,
    path::{Path, PathBuf},
};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Advances the progress bar and forwards associated frames to the preview.
struct ProgressObserver<F>
where
    F: FnMut(usize, &RgbImage),
{
    progress: ProgressBar,
    preview: Option<TrailRenderer<F>>,
}

impl<F> FrameObserver for ProgressObserver<F>
where
    F: FnMut(usize, &RgbImage),
{
    fn on_frame(&mut self, frame: &Frame, point: Option<&Point>) {
        if let Some(preview) = self.preview.as_mut() {
            preview.on_frame(frame, point);
        }
        self.progress.inc(1);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 || args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print_usage();
        return Ok(());
    }

    init_logging()?;

    let frames_dir = PathBuf::from(&args[1]);
    let out_dir = PathBuf::from(&args[2]);
    let video_id = args[3].clone();
    let meta = ExperimentMeta {
        date: args.get(4).cloned().unwrap_or_default(),
        label: args.get(5).cloned().unwrap_or_default(),
        dpf: args.get(6).and_then(|v| v.parse().ok()).unwrap_or(0),
        dpi: args.get(7).and_then(|v| v.parse().ok()).unwrap_or(0),
    };
    let fps = args
        .get(8)
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(1.0);
    let config = match args.get(9) {
        Some(path) => TrackerConfig::from_json_file(path)?,
        None => TrackerConfig::default(),
    };
    let preview_every = args
        .get(10)
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    fs::create_dir_all(&out_dir)?;
    let frames = load_frames(&frames_dir)?;
    if frames.is_empty() {
        return Err(format!("No frames found in {}", frames_dir.display()).into());
    }
    log::info!("loaded {} frames from {}", frames.len(), frames_dir.display());

    let progress = ProgressBar::new(frames.len() as u64);
    let style = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )?
    .progress_chars("=>-");
    progress.set_style(style);
    progress.set_message("tracking");

    let preview_dir = out_dir.join(format!("{video_id}_preview"));
    let preview = if preview_every > 0 {
        fs::create_dir_all(&preview_dir)?;
        let dir = preview_dir.clone();
        Some(TrailRenderer::new(move |index: usize, image: &RgbImage| {
            if index % preview_every != 0 {
                return;
            }
            let path = dir.join(format!("frame_{index:06}.png"));
            if let Err(err) = image.save(&path) {
                log::warn!("could not save {}: {}", path.display(), err);
            }
        }))
    } else {
        None
    };
    let mut observer = ProgressObserver {
        progress: progress.clone(),
        preview,
    };

    let pipeline = VideoPipeline::new(config)?;
    let reference = frames[0].image().clone();
    let input = VideoInput {
        video_id: video_id.clone(),
        meta,
        frames,
        fps,
        frame_count: None,
    };
    let analysis = pipeline.analyze_with_observer(&input, &mut observer)?;
    progress.finish_with_message("done");

    save_track_points(
        &analysis.outcome.tracks,
        out_dir.join(format!("{video_id}_tracks.txt")),
    )?;
    save_track_points(
        &analysis.smoothed,
        out_dir.join(format!("{video_id}_smoothed.txt")),
    )?;
    render_track_image(&reference, &analysis.outcome.tracks)
        .save(out_dir.join(format!("{video_id}_tracks.png")))?;

    let table = ResultsTable::open_append(out_dir.join("stats.txt"))?;
    table.append(&analysis.record)?;

    println!(
        "{}: {} tracks, distance {:.1} px, velocity {:.2} px/s, static {:.2} s",
        video_id,
        analysis.outcome.tracks.len(),
        analysis.statistics.total_distance,
        analysis.statistics.avg_velocity,
        analysis.statistics.avg_static_time
    );
    println!("Saved results to {}", table.path().display());

    Ok(())
}

fn print_usage() {
    println!(
        "Usage: cargo run --example track_frames <frames_dir> <out_dir> <video_id> [date] [label] [dpf] [dpi] [fps] [config.json] [preview_every]\n\
Defaults:\n\
  fps: 1\n\
  config.json: built-in defaults\n\
  preview_every: 0 (no preview frames)\n\
Frames are read in file name order."
    );
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(stderr())
        .apply()?;
    Ok(())
}

fn load_frames(dir: &Path) -> Result<Vec<Frame>, Box<dyn Error>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(OsStr::to_str)
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            paths.push(path);
        }
    }
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in &paths {
        images.push(image::open(path)?.into_luma8());
    }
    Ok(Frame::sequence(images))
}
