use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting observer for pipeline orchestration events.
///
/// Decouples the engine from any specific output mechanism so callers
/// can watch stage timings and queue depths without changing the
/// orchestration code.
pub trait PipelineLogger: Send {
    /// Record how long a named pipeline stage took for one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. queue depth, face count).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger for tests and embedders with their own telemetry.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Constant-memory accumulator; the pipeline runs indefinitely, so raw
/// samples are never retained.
#[derive(Clone, Copy, Debug, Default)]
struct RollingStats {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl RollingStats {
    fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Logger for long-running sessions: forwards messages to the `log`
/// crate and keeps rolling per-stage statistics for the final summary.
pub struct RollingStatsLogger {
    timings: HashMap<String, RollingStats>,
    metrics: HashMap<String, RollingStats>,
    start_time: Instant,
}

impl RollingStatsLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
        }
    }

    /// Formatted summary, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!("Session summary ({elapsed:.1}s):")];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let s = &self.timings[stage];
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  min {:6.1}ms  max {:6.1}ms  ({} samples)",
                s.mean(),
                s.min,
                s.max,
                s.count
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            let s = &self.metrics[name];
            lines.push(format!("  {name}: avg {:.1}", s.mean()));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_mean(&self, stage: &str) -> Option<f64> {
        self.timings.get(stage).map(RollingStats::mean)
    }

    pub fn metric_mean(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(RollingStats::mean)
    }
}

impl Default for RollingStatsLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for RollingStatsLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
