use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

use crate::table::Cell;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SweepReport {
    pub implementation: String,
    pub duration: Duration,
    pub peak_memory_bytes: u64,
    pub data_points: usize,
    pub timeouts: usize,
    pub errors: usize,
}

impl SweepReport {
    /// Share of data points that produced a number.
    pub fn completion_rate(&self) -> f32 {
        if self.data_points == 0 {
            return 0.0;
        }
        let completed = self.data_points - self.timeouts - self.errors;
        completed as f32 / self.data_points as f32
    }
}

#[derive(Default, Clone)]
pub struct MetricsTracker {
    reports: Arc<Mutex<Vec<SweepReport>>>,
}

impl MetricsTracker {
    pub fn start_sweep(&self, implementation: impl Into<String>) -> SweepGuard {
        SweepGuard {
            implementation: implementation.into(),
            start: Instant::now(),
            data_points: 0,
            timeouts: 0,
            errors: 0,
            peak_memory_bytes: 0,
            metrics: self.clone(),
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn reports(&self) -> Vec<SweepReport> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

pub struct SweepGuard {
    implementation: String,
    start: Instant,
    data_points: usize,
    timeouts: usize,
    errors: usize,
    peak_memory_bytes: u64,
    metrics: MetricsTracker,
    system: System,
    pid: Option<Pid>,
}

impl SweepGuard {
    pub fn record_point(&mut self, cell: &Cell) {
        self.data_points += 1;
        match cell {
            Cell::Timeout => self.timeouts += 1,
            Cell::Error => self.errors += 1,
            Cell::Seconds(_) | Cell::Count(_) => {}
        }
        self.sample_memory();
    }

    fn sample_memory(&mut self) {
        let Some(pid) = self.pid else {
            return;
        };
        if self.system.refresh_process(pid) {
            if let Some(process) = self.system.process(pid) {
                self.peak_memory_bytes = self.peak_memory_bytes.max(process.memory());
            }
        }
    }

    pub fn finish(mut self) -> SweepReport {
        self.sample_memory();
        let report = SweepReport {
            implementation: self.implementation.clone(),
            duration: self.start.elapsed(),
            peak_memory_bytes: self.peak_memory_bytes,
            data_points: self.data_points,
            timeouts: self.timeouts,
            errors: self.errors,
        };
        if let Ok(mut reports) = self.metrics.reports.lock() {
            reports.push(report.clone());
        }
        report
    }
}
