use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

/// Метрики сессии, обновляемые lock-free из нескольких потоков.
#[derive(Debug, Default)]
pub struct RecorderMetrics {
    pub sweeps_completed: AtomicU64,
    pub sweeps_discarded: AtomicU64,
    pub angles_processed: AtomicU64,
    pub angles_without_target: AtomicU64,
    pub timing_errors: AtomicU64,
    pub records_written: AtomicU64,
    pub flush_retries: AtomicU64,
    pub flush_failures: AtomicU64,
}

/// Snapshot метрик для отображения / тестирования.
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub duration_secs: f64,
    pub sweeps_completed: u64,
    pub sweeps_discarded: u64,
    pub angles_processed: u64,
    pub angles_without_target: u64,
    pub timing_errors: u64,
    pub records_written: u64,
    pub flush_retries: u64,
    pub flush_failures: u64,
    pub angles_per_sec: f64,
    pub miss_rate_pct: f64,
}

impl RecorderMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn angles_per_sec(
        &self,
        elapsed: &Instant,
    ) -> f64 {
        let secs = elapsed.elapsed().as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.angles_processed.load(Ordering::Relaxed) as f64 / secs
    }

    /// Процент углов без цели (0.0-100.0).
    pub fn miss_rate_pct(&self) -> f64 {
        let processed = self.angles_processed.load(Ordering::Relaxed);
        let missed = self.angles_without_target.load(Ordering::Relaxed);

        if processed == 0 {
            0.0
        } else {
            missed as f64 / processed as f64 * 100.0
        }
    }

    /// Итоговая сводка для вывода в конце сессии.
    pub fn summary(
        &self,
        elapsed: &Instant,
    ) -> MetricsSummary {
        MetricsSummary {
            duration_secs: elapsed.elapsed().as_secs_f64(),
            sweeps_completed: self.sweeps_completed.load(Ordering::Relaxed),
            sweeps_discarded: self.sweeps_discarded.load(Ordering::Relaxed),
            angles_processed: self.angles_processed.load(Ordering::Relaxed),
            angles_without_target: self.angles_without_target.load(Ordering::Relaxed),
            timing_errors: self.timing_errors.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            flush_retries: self.flush_retries.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            angles_per_sec: self.angles_per_sec(elapsed),
            miss_rate_pct: self.miss_rate_pct(),
        }
    }
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Duration      : {:.1}s", self.duration_secs)?;
        writeln!(
            f,
            "  Sweeps        : {} ({} discarded)",
            self.sweeps_completed, self.sweeps_discarded
        )?;
        writeln!(f, "  Angles        : {}", self.angles_processed)?;
        writeln!(
            f,
            "  No target     : {} ({:.2}%)",
            self.angles_without_target, self.miss_rate_pct
        )?;
        writeln!(f, "  Timing errors : {}", self.timing_errors)?;
        writeln!(f, "  Records       : {}", self.records_written)?;
        writeln!(
            f,
            "  Flush retries : {} ({} failed)",
            self.flush_retries, self.flush_failures
        )?;
        writeln!(f, "  Rate          : {:.1} angles/s", self.angles_per_sec)?;
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}
