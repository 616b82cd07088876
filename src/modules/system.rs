//! Host CPU and memory readings.
//!
//! `SystemMonitor` wraps one `sysinfo::System`; CPU usage is a delta between
//! refreshes, so the first sample after construction reads low.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use crate::config::limits::MODULE_TICK_MS;
use crate::host::lifecycle::{
    ActionOutcome, Module, ModuleAction, ModuleContext, ModuleError, ModuleView,
};
use crate::registry::ModuleId;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    /// Mean usage across logical CPUs, 0-100.
    pub cpu: f32,
    pub cpu_count: usize,
    pub mem_used: u64,
    pub mem_total: u64,
    pub mem_percent: f32,
}

impl SystemStats {
    pub fn from_readings(cpu_usage: &[f32], mem_used: u64, mem_total: u64) -> Self {
        let cpu = if cpu_usage.is_empty() {
            0.0
        } else {
            cpu_usage.iter().sum::<f32>() / cpu_usage.len() as f32
        };
        let mem_percent = if mem_total == 0 {
            0.0
        } else {
            (mem_used as f64 / mem_total as f64 * 100.0) as f32
        };
        Self {
            cpu: cpu.clamp(0.0, 100.0),
            cpu_count: cpu_usage.len(),
            mem_used,
            mem_total,
            mem_percent,
        }
    }
}

pub struct SystemMonitor {
    sys: Mutex<System>,
}

impl SystemMonitor {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }

    pub fn sample(&self) -> SystemStats {
        let mut sys = self.sys.lock();
        sys.refresh_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new().with_cpu_usage())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );
        let usage: Vec<f32> = sys.cpus().iter().map(|cpu| cpu.cpu_usage()).collect();
        SystemStats::from_readings(&usage, sys.used_memory(), sys.total_memory())
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Native `system` module: samples once a second while mounted.
pub struct SystemModule {
    id: ModuleId,
    monitor: Arc<SystemMonitor>,
    stats: Arc<Mutex<SystemStats>>,
}

impl SystemModule {
    pub fn new(monitor: Arc<SystemMonitor>) -> Self {
        Self {
            id: ModuleId::from("system"),
            monitor,
            stats: Arc::new(Mutex::new(SystemStats::default())),
        }
    }
}

#[async_trait]
impl Module for SystemModule {
    async fn mount(&mut self, ctx: &mut ModuleContext) -> Result<(), ModuleError> {
        *self.stats.lock() = self.monitor.sample();
        let monitor = self.monitor.clone();
        let stats = self.stats.clone();
        ctx.scope
            .spawn_interval(Duration::from_millis(MODULE_TICK_MS), move || {
                let next = monitor.sample();
                *stats.lock() = next;
            });
        Ok(())
    }

    fn render(&self) -> ModuleView {
        ModuleView::ready(&self.id, self.stats.lock().clone())
    }

    async fn handle(
        &mut self,
        action: ModuleAction,
        _ctx: &mut ModuleContext,
    ) -> Result<ActionOutcome, ModuleError> {
        match action.name.as_str() {
            "refresh" => {
                *self.stats.lock() = self.monitor.sample();
                Ok(ActionOutcome::Handled)
            }
            _ => Err(action.unknown()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_average_cpus_and_scale_memory() {
        let stats = SystemStats::from_readings(&[10.0, 30.0, 50.0, 70.0], 4 << 30, 16 << 30);
        assert_eq!(stats.cpu, 40.0);
        assert_eq!(stats.cpu_count, 4);
        assert_eq!(stats.mem_percent, 25.0);
    }

    #[test]
    fn empty_readings_are_zero() {
        let stats = SystemStats::from_readings(&[], 0, 0);
        assert_eq!(stats, SystemStats::default());
    }

    #[test]
    fn live_sample_reports_installed_memory() {
        let monitor = SystemMonitor::new();
        let stats = monitor.sample();
        assert!(stats.mem_total > 0);
        assert!(stats.mem_used <= stats.mem_total);
        assert!((0.0..=100.0).contains(&stats.cpu));
    }
}
