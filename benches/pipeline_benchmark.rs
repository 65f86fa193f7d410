use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use larvatrack_rs::{Frame, TrackerConfig, VideoPipeline};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const FRAMES: usize = 100;
const RADIUS: f64 = 6.0;

/* ----------------------------------------------------------------------------
 * Synthetic video: a dark disk crossing a bright background
 * ---------------------------------------------------------------------------- */
fn synthetic_frames() -> Vec<Frame> {
    (0..FRAMES)
        .map(|i| {
            let cx = 20.0 + 2.5 * i as f64;
            let cy = 120.0 + 40.0 * (i as f64 / 15.0).sin();
            let image = GrayImage::from_fn(WIDTH, HEIGHT, |x, y| {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                if dx * dx + dy * dy <= RADIUS * RADIUS {
                    Luma([20])
                } else {
                    Luma([210])
                }
            });
            Frame::new(i, image)
        })
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let frames = synthetic_frames();
    let pipeline = VideoPipeline::new(TrackerConfig::default()).unwrap();

    c.bench_function("segment", |b| {
        b.iter(|| {
            let _ = pipeline.segment(&frames);
        });
    });

    c.bench_function("track", |b| {
        b.iter(|| {
            let _ = pipeline.track(&frames);
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_pipeline
}
criterion_main!(benches);
