use parking_lot::Mutex;
use serde::Serialize;

use crate::domain::error::ErrorCode;

/// レイテンシ記録のフェーズ名
pub const PHASE_RESOLVE: &str = "resolve";
pub const PHASE_ANALYZE: &str = "analyze";
pub const PHASE_SYNTHESIZE: &str = "synthesize";

/// 保持するレイテンシ記録の上限
const MAX_LATENCY_RECORDS: usize = 1000;

/// ローカルメトリクス収集器
pub struct Metrics {
    counters: Mutex<MetricsCounters>,
    latencies: Mutex<Vec<LatencyRecord>>,
}

#[derive(Debug, Default)]
struct MetricsCounters {
    guidance_remote: u64,
    guidance_offline: u64,
    analyses: u64,
    syntheses: u64,
    playbacks_started: u64,
    errors_network: u64,
    errors_no_offline_match: u64,
    errors_audio: u64,
    errors_invalid_input: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyRecord {
    pub phase: String,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// メトリクスサマリー（UIに返す用）
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub guidance_remote: u64,
    pub guidance_offline: u64,
    pub analyses: u64,
    pub syntheses: u64,
    pub playbacks_started: u64,
    pub error_counts: ErrorCounts,
    pub avg_latency_ms: AvgLatency,
    pub recent_latencies: Vec<LatencyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorCounts {
    pub network: u64,
    pub no_offline_match: u64,
    pub audio: u64,
    pub invalid_input: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvgLatency {
    pub resolve: Option<f64>,
    pub analyze: Option<f64>,
    pub synthesize: Option<f64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(MetricsCounters::default()),
            latencies: Mutex::new(Vec::new()),
        }
    }

    /// ガイダンス取得成功（経路別）
    pub fn inc_guidance(&self, offline: bool) {
        let mut c = self.counters.lock();
        if offline {
            c.guidance_offline += 1;
        } else {
            c.guidance_remote += 1;
        }
    }

    pub fn inc_analyses(&self) {
        self.counters.lock().analyses += 1;
    }

    pub fn inc_syntheses(&self) {
        self.counters.lock().syntheses += 1;
    }

    pub fn inc_playbacks_started(&self) {
        self.counters.lock().playbacks_started += 1;
    }

    pub fn inc_error(&self, code: ErrorCode) {
        let mut c = self.counters.lock();
        match code {
            ErrorCode::Network => c.errors_network += 1,
            ErrorCode::NoOfflineMatch => c.errors_no_offline_match += 1,
            ErrorCode::Audio => c.errors_audio += 1,
            ErrorCode::InvalidInput => c.errors_invalid_input += 1,
        }
    }

    pub fn record_latency(&self, phase: &str, duration_ms: u64) {
        let record = LatencyRecord {
            phase: phase.to_string(),
            duration_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let mut latencies = self.latencies.lock();
        latencies.push(record);
        // 最新1000件のみ保持
        if latencies.len() > MAX_LATENCY_RECORDS {
            let excess = latencies.len() - MAX_LATENCY_RECORDS;
            latencies.drain(0..excess);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let c = self.counters.lock();
        let latencies = self.latencies.lock();

        let avg = |phase: &str| -> Option<f64> {
            let vals: Vec<f64> = latencies
                .iter()
                .filter(|r| r.phase == phase)
                .map(|r| r.duration_ms as f64)
                .collect();
            if vals.is_empty() {
                None
            } else {
                Some(vals.iter().sum::<f64>() / vals.len() as f64)
            }
        };

        let recent: Vec<LatencyRecord> = latencies.iter().rev().take(20).cloned().collect();

        MetricsSummary {
            guidance_remote: c.guidance_remote,
            guidance_offline: c.guidance_offline,
            analyses: c.analyses,
            syntheses: c.syntheses,
            playbacks_started: c.playbacks_started,
            error_counts: ErrorCounts {
                network: c.errors_network,
                no_offline_match: c.errors_no_offline_match,
                audio: c.errors_audio,
                invalid_input: c.errors_invalid_input,
            },
            avg_latency_ms: AvgLatency {
                resolve: avg(PHASE_RESOLVE),
                analyze: avg(PHASE_ANALYZE),
                synthesize: avg(PHASE_SYNTHESIZE),
            },
            recent_latencies: recent,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let m = Metrics::new();
        m.inc_guidance(false);
        m.inc_guidance(true);
        m.inc_guidance(true);
        m.inc_analyses();
        m.inc_error(ErrorCode::Network);
        m.inc_error(ErrorCode::NoOfflineMatch);
        m.inc_error(ErrorCode::Audio);

        let s = m.summary();
        assert_eq!(s.guidance_remote, 1);
        assert_eq!(s.guidance_offline, 2);
        assert_eq!(s.analyses, 1);
        assert_eq!(s.error_counts.network, 1);
        assert_eq!(s.error_counts.no_offline_match, 1);
        assert_eq!(s.error_counts.audio, 1);
        assert_eq!(s.error_counts.invalid_input, 0);
    }

    #[test]
    fn test_latency_recording() {
        let m = Metrics::new();
        m.record_latency(PHASE_RESOLVE, 120);
        m.record_latency(PHASE_RESOLVE, 80);
        m.record_latency(PHASE_SYNTHESIZE, 200);

        let s = m.summary();
        assert!((s.avg_latency_ms.resolve.unwrap() - 100.0).abs() < f64::EPSILON);
        assert!((s.avg_latency_ms.synthesize.unwrap() - 200.0).abs() < f64::EPSILON);
        assert!(s.avg_latency_ms.analyze.is_none());
        assert_eq!(s.recent_latencies.len(), 3);
        assert_eq!(s.recent_latencies[0].phase, PHASE_SYNTHESIZE);
    }

    #[test]
    fn test_latency_cap() {
        let m = Metrics::new();
        for i in 0..1100 {
            m.record_latency(PHASE_ANALYZE, i);
        }
        assert_eq!(m.latencies.lock().len(), MAX_LATENCY_RECORDS);
    }
}
