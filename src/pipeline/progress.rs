// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for corpus ingestion
// reference: uses indicatif for progress bars and tracks ingestion metrics

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub papers_indexed: usize,
    pub papers_failed: usize,
    pub embeddings_computed: usize,
    pub embeddings_reused: usize,
    pub total_bytes_processed: u64,
    pub duration_secs: f64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn papers_per_second(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            return 0.0;
        }
        self.papers_indexed as f64 / self.duration_secs
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.papers_indexed + self.papers_failed;
        if total == 0 {
            return 0.0;
        }
        (self.papers_indexed as f64 / total as f64) * 100.0
    }

    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("{} {}", "Papers indexed:".bold(), self.papers_indexed),
            format!("{} {}", "Papers failed:".bold(), self.papers_failed),
            format!(
                "{} {} computed, {} reused",
                "Embeddings:".bold(),
                self.embeddings_computed,
                self.embeddings_reused
            ),
            format!(
                "{} {:.1} KB",
                "Source text:".bold(),
                self.total_bytes_processed as f64 / 1024.0
            ),
            format!(
                "{} {:.2}s ({:.2} papers/sec)",
                "Duration:".bold(),
                self.duration_secs,
                self.papers_per_second()
            ),
        ]
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    papers_indexed: Arc<AtomicUsize>,
    papers_failed: Arc<AtomicUsize>,
    embeddings_computed: Arc<AtomicUsize>,
    embeddings_reused: Arc<AtomicUsize>,
    bytes_processed: Arc<AtomicU64>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_papers: usize) -> Self {
        Self::with_color(total_papers, true)
    }

    pub fn with_color(total_papers: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();
        Self::build(&multi_progress, total_papers, colored)
    }

    /// Counts without drawing, for the MCP server and tests.
    pub fn hidden(total_papers: usize) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        Self::build(&multi_progress, total_papers, false)
    }

    fn build(multi_progress: &MultiProgress, total_papers: usize, colored: bool) -> Self {
        let main_bar = create_progress_bar(multi_progress, total_papers as u64, colored);
        let detail_bar = create_detail_bar(multi_progress);

        Self {
            main_bar,
            detail_bar,
            papers_indexed: Arc::new(AtomicUsize::new(0)),
            papers_failed: Arc::new(AtomicUsize::new(0)),
            embeddings_computed: Arc::new(AtomicUsize::new(0)),
            embeddings_reused: Arc::new(AtomicUsize::new(0)),
            bytes_processed: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_papers_indexed(&self) {
        self.papers_indexed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_papers_failed(&self) {
        self.papers_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn add_embeddings_computed(&self, count: usize) {
        self.embeddings_computed.fetch_add(count, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn add_embeddings_reused(&self, count: usize) {
        self.embeddings_reused.fetch_add(count, Ordering::SeqCst);
    }

    pub fn add_bytes_processed(&self, bytes: u64) {
        self.bytes_processed.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Ingestion complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            papers_indexed: self.papers_indexed.load(Ordering::SeqCst),
            papers_failed: self.papers_failed.load(Ordering::SeqCst),
            embeddings_computed: self.embeddings_computed.load(Ordering::SeqCst),
            embeddings_reused: self.embeddings_reused.load(Ordering::SeqCst),
            total_bytes_processed: self.bytes_processed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs_f64(),
        }
    }

    fn update_detail_bar(&self) {
        let embedded = self.embeddings_computed.load(Ordering::SeqCst);
        let failed = self.papers_failed.load(Ordering::SeqCst);

        self.detail_bar
            .set_message(format!("Embedded: {} | Failed: {}", embedded, failed));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    };

    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars(chars));
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}
