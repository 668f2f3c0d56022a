use crate::error::{ProcessingError, Result};
use crate::models::Track;
use crate::processors::TrackReport;
use crate::readers::{IngestReport, TrackReader};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one track in a batch.
#[derive(Debug)]
pub struct TrackOutcome {
    pub path: PathBuf,
    pub result: Result<(IngestReport, TrackReport)>,
}

impl TrackOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TrackOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok((_, report)) if !report.is_skipped()))
            .count()
    }

    /// Tracks that ran but had nothing left after cleaning.
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok((_, report)) if report.is_skipped()))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    pub fn track_reports(&self) -> impl Iterator<Item = &TrackReport> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|(_, report)| report))
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Batch Summary:\n");
        summary.push_str(&format!("- Tracks: {}\n", self.total()));
        summary.push_str(&format!("- Processed: {}\n", self.succeeded()));
        summary.push_str(&format!("- Skipped (too little data): {}\n", self.skipped()));
        summary.push_str(&format!("- Failed: {}\n", self.failed()));

        let (rows, excluded) = self
            .outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .fold((0, 0), |(rows, excluded), (ingest, _)| {
                (rows + ingest.rows, excluded + ingest.excluded())
            });
        summary.push_str(&format!(
            "- Rows read: {} ({} excluded at ingestion)\n",
            rows, excluded
        ));

        let velocity: usize = self.track_reports().map(|r| r.velocity_samples).sum();
        summary.push_str(&format!("- Velocity samples: {}\n", velocity));

        if self.total() > 0 {
            summary.push_str("\nTracks:\n");
            for outcome in &self.outcomes {
                match &outcome.result {
                    Ok((_, report)) => summary.push_str(&format!("  {}\n", report.summary())),
                    Err(e) => summary.push_str(&format!(
                        "  {}: FAILED ({})\n",
                        outcome.path.display(),
                        e
                    )),
                }
            }
        }

        summary
    }
}

/// Runs a per-track job over many track files, one track per worker.
pub struct BatchProcessor {
    max_workers: usize,
    reader: TrackReader,
}

impl BatchProcessor {
    pub fn new(max_workers: usize, reader: TrackReader) -> Self {
        Self {
            max_workers,
            reader,
        }
    }

    /// Read each file and hand its track to `job`.
    ///
    /// An error anywhere in a track, including in `job`, is recorded in that
    /// track's outcome; the other tracks carry on.
    pub fn process_files<F>(
        &self,
        paths: &[PathBuf],
        progress: Option<&ProgressReporter>,
        job: F,
    ) -> Result<BatchReport>
    where
        F: Fn(&Path, &Track) -> Result<TrackReport> + Sync,
    {
        let processed_count = Arc::new(AtomicUsize::new(0));

        if let Some(p) = progress {
            p.set_message(&format!("Processing {} tracks...", paths.len()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let outcomes: Vec<TrackOutcome> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    let result = self.process_single_track(path, &job);

                    if let Err(ref e) = result {
                        warn!(path = %path.display(), error = %e, "track failed");
                    }

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }

                    TrackOutcome {
                        path: path.clone(),
                        result,
                    }
                })
                .collect()
        });

        let report = BatchReport { outcomes };
        info!(
            tracks = report.total(),
            processed = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "batch complete"
        );

        Ok(report)
    }

    fn process_single_track<F>(&self, path: &Path, job: &F) -> Result<(IngestReport, TrackReport)>
    where
        F: Fn(&Path, &Track) -> Result<TrackReport>,
    {
        let (track, ingest) = self.reader.read_track(path)?;
        let report = job(path, &track)?;
        Ok((ingest, report))
    }
}

/// CSV track files directly inside `dir`, sorted by name.
pub fn find_track_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if path.is_file() && is_csv {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
