use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use icedrift_processor::config::PipelineConfig;
use icedrift_processor::models::{Coordinate, PositionSample, Track};
use icedrift_processor::processors::{
    GapSegmenter, PositionValidator, TrackInterpolator, TrackPipeline, VelocityComputer,
};
use icedrift_processor::readers::{InputSchema, TrackReader};
use icedrift_processor::utils::geodesy::haversine_distance;

// Irregular ~20 minute sampling with an occasional 6 hour outage and repeated fixes
fn create_test_track(samples: usize) -> Track {
    let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
    let mut minutes = 0i64;
    let mut track = Vec::with_capacity(samples);

    for i in 0..samples {
        minutes += if i % 500 == 499 { 360 } else { 17 + (i as i64 * 7) % 9 };
        let lat = 80.0 + (i as f64 * 0.0007).sin() * 2.0;
        let lon = -170.0 + (i as f64 * 0.003) % 340.0;
        let (lat, lon) = if i % 50 == 1 {
            let prev: &PositionSample = &track[i - 1];
            (prev.latitude(), prev.longitude())
        } else {
            (lat, lon)
        };
        track.push(PositionSample::new(start + Duration::minutes(minutes), lat, lon));
    }

    Track::new("bench", track)
}

fn create_test_csv(samples: usize) -> String {
    let track = create_test_track(samples);
    let mut csv = String::with_capacity(samples * 40);
    for s in track.samples() {
        csv.push_str(&format!(
            "{},{:.5},{:.5}\n",
            s.timestamp.format("%Y-%m-%d %H:%M:%S"),
            s.latitude(),
            s.longitude()
        ));
    }
    csv
}

fn benchmark_stages(c: &mut Criterion) {
    let track = create_test_track(10_000);
    let config = PipelineConfig::default();

    c.bench_function("position_validator", |b| {
        let validator = PositionValidator::new(true);
        b.iter(|| black_box(validator.validate(&track).flagged_count()))
    });

    c.bench_function("gap_segmenter", |b| {
        let segmenter = GapSegmenter::new(config.threshold_gap, config.threshold_segment);
        b.iter(|| black_box(segmenter.segment(&track).flagged_count()))
    });

    c.bench_function("track_interpolator", |b| {
        let interpolator = TrackInterpolator::new(config.freq, config.maxgap_minutes);
        b.iter(|| black_box(interpolator.interpolate(&track).map(|r| r.len()).unwrap_or(0)))
    });

    c.bench_function("velocity_computer", |b| {
        let computer = VelocityComputer::new();
        b.iter(|| black_box(computer.derive_velocity(&track).filter(|v| v.is_ok()).count()))
    });
}

fn benchmark_haversine(c: &mut Criterion) {
    let a = Coordinate::new(78.2, 15.6);
    let b = Coordinate::new(78.3, -179.9);

    c.bench_function("haversine_distance", |bench| {
        bench.iter(|| black_box(haversine_distance(black_box(&a), black_box(&b))))
    });
}

fn benchmark_track_reader(c: &mut Criterion) {
    let csv = create_test_csv(10_000);
    let reader = TrackReader::new(InputSchema::Auto);

    c.bench_function("track_reader", |b| {
        b.iter(|| {
            let (track, _) = reader.read_from(csv.as_bytes(), "bench", "bench").unwrap();
            black_box(track.len())
        })
    });
}

fn benchmark_varying_track_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_by_size");
    let pipeline = TrackPipeline::new(PipelineConfig::default());

    for &size in &[1_000, 10_000, 50_000] {
        group.bench_with_input(BenchmarkId::new("samples", size), &size, |b, &samples| {
            let track = create_test_track(samples);
            b.iter(|| {
                let output = pipeline.run(&track).unwrap();
                black_box(output.velocity.len())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_stages,
    benchmark_haversine,
    benchmark_track_reader,
    benchmark_varying_track_sizes
);
criterion_main!(benches);
