//! In-memory metrics sink with Prometheus text export.

use crate::ports::metrics::{Labels, MetricsSink};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct Summary {
    count: u64,
    sum: f64,
}

#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<BTreeMap<String, u64>>,
    histograms: Mutex<BTreeMap<String, Summary>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter series, 0 if never incremented.
    pub fn counter(&self, name: &str, labels: Labels<'_>) -> u64 {
        let key = series(name, labels);
        self.counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    /// Number of observations recorded for a histogram series.
    pub fn observations(&self, name: &str, labels: Labels<'_>) -> u64 {
        let key = series(name, labels);
        self.histograms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .map(|s| s.count)
            .unwrap_or(0)
    }

    /// Export metrics in Prometheus text format.
    ///
    /// Histograms are exported as `_count` and `_sum` only.
    pub fn render(&self) -> String {
        let mut output = String::new();

        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        for (key, value) in counters.iter() {
            let _ = writeln!(output, "{} {}", key, value);
        }
        drop(counters);

        let histograms = self.histograms.lock().unwrap_or_else(|e| e.into_inner());
        for (key, summary) in histograms.iter() {
            let (name, labels) = split_series(key);
            let _ = writeln!(output, "{}_count{} {}", name, labels, summary.count);
            let _ = writeln!(output, "{}_sum{} {}", name, labels, summary.sum);
        }

        output
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment(&self, name: &'static str, labels: Labels<'_>) {
        let key = series(name, labels);
        *self
            .counters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key)
            .or_insert(0) += 1;
    }

    fn observe(&self, name: &'static str, labels: Labels<'_>, value: f64) {
        let key = series(name, labels);
        let mut histograms = self.histograms.lock().unwrap_or_else(|e| e.into_inner());
        let summary = histograms.entry(key).or_default();
        summary.count += 1;
        summary.sum += value;
    }
}

fn series(name: &str, labels: Labels<'_>) -> String {
    if labels.is_empty() {
        return name.to_string();
    }
    let rendered: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{}{{{}}}", name, rendered.join(","))
}

fn split_series(key: &str) -> (&str, &str) {
    match key.find('{') {
        Some(i) => key.split_at(i),
        None => (key, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::metrics::{FFMPEG_FAILURES, SEGMENTS_CREATED, VIDEO_PROCESSING_DURATION};

    #[test]
    fn test_counters_by_label() {
        let metrics = InMemoryMetrics::new();
        metrics.increment(SEGMENTS_CREATED, &[("quality", "720p")]);
        metrics.increment(SEGMENTS_CREATED, &[("quality", "720p")]);
        metrics.increment(SEGMENTS_CREATED, &[("quality", "360p")]);
        metrics.increment(FFMPEG_FAILURES, &[]);

        assert_eq!(metrics.counter(SEGMENTS_CREATED, &[("quality", "720p")]), 2);
        assert_eq!(metrics.counter(SEGMENTS_CREATED, &[("quality", "360p")]), 1);
        assert_eq!(metrics.counter(SEGMENTS_CREATED, &[("quality", "1080p")]), 0);
        assert_eq!(metrics.counter(FFMPEG_FAILURES, &[]), 1);
    }

    #[test]
    fn test_render_prometheus_text() {
        let metrics = InMemoryMetrics::new();
        metrics.increment(FFMPEG_FAILURES, &[]);
        metrics.observe(VIDEO_PROCESSING_DURATION, &[("quality", "all")], 1.5);
        metrics.observe(VIDEO_PROCESSING_DURATION, &[("quality", "all")], 2.5);

        let text = metrics.render();
        assert!(text.contains("ffmpeg_processing_failures_total 1"));
        assert!(text.contains("video_processing_duration_seconds_count{quality=\"all\"} 2"));
        assert!(text.contains("video_processing_duration_seconds_sum{quality=\"all\"} 4"));
        assert_eq!(
            metrics.observations(VIDEO_PROCESSING_DURATION, &[("quality", "all")]),
            2
        );
    }
}
