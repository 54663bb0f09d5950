// Integration test utilities
//
// Builds synthetic gem5 stats dumps: one "Begin Simulation Statistics" block
// per epoch, each with a simSeconds line and the per-core stats requested.

#![allow(dead_code)]

use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const PREFIX: &str = "system.cpu_cluster.cpus";

/// One simulation epoch
#[derive(Debug, Clone, Default)]
pub struct Epoch {
    pub sim_seconds: Option<f64>,
    /// (core, ipc)
    pub ipc: Vec<(u32, f64)>,
    /// (core, thread, ipc)
    pub thread_ipc: Vec<(u32, u32, f64)>,
    /// (core, watts)
    pub dynamic_power: Vec<(u32, f64)>,
    /// (core, watts)
    pub static_power: Vec<(u32, f64)>,
    /// Raw lines appended verbatim
    pub extra: Vec<String>,
}

/// Synthetic stats.txt builder
#[derive(Debug, Clone, Default)]
pub struct StatsDump {
    epochs: Vec<Epoch>,
}

impl StatsDump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(mut self, epoch: Epoch) -> Self {
        self.epochs.push(epoch);
        self
    }

    /// `steps` epochs of `cores` cores, elapsed time `step_seconds * (i + 1)`
    ///
    /// Core `c` at step `i` has ipc `0.5 + 0.01 * c` and dynamic power
    /// `1.0 + 0.1 * c + 0.001 * i`.
    pub fn uniform(cores: u32, steps: usize, step_seconds: f64) -> Self {
        let mut dump = Self::new();
        for i in 0..steps {
            dump = dump.epoch(Epoch {
                sim_seconds: Some(step_seconds * (i + 1) as f64),
                ipc: (0..cores).map(|c| (c, 0.5 + 0.01 * c as f64)).collect(),
                dynamic_power: (0..cores)
                    .map(|c| (c, 1.0 + 0.1 * c as f64 + 0.001 * i as f64))
                    .collect(),
                static_power: (0..cores).map(|c| (c, 0.2)).collect(),
                ..Epoch::default()
            });
        }
        dump
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for epoch in &self.epochs {
            let _ = writeln!(out);
            let _ = writeln!(out, "---------- Begin Simulation Statistics ----------");
            if let Some(t) = epoch.sim_seconds {
                let _ = writeln!(out, "{:<50} {:>12.6} # Number of seconds simulated", "simSeconds", t);
            }
            let _ = writeln!(out, "{:<50} {:>12} # Simulator tick rate", "simFreq", 1_000_000_000_000u64);
            for (core, v) in &epoch.ipc {
                let _ = writeln!(out, "{:<50} {:>12.6} # IPC", format!("{}{}.ipc", PREFIX, core), v);
            }
            for (core, thread, v) in &epoch.thread_ipc {
                let name = format!("{}{}.commitStats{}.ipc", PREFIX, core, thread);
                let _ = writeln!(out, "{:<50} {:>12.6} # IPC per thread", name, v);
            }
            for (core, v) in &epoch.dynamic_power {
                let name = format!("{}{}.power_model.dynamicPower", PREFIX, core);
                let _ = writeln!(out, "{:<50} {:>12.6} # Dynamic power (Watt)", name, v);
            }
            for (core, v) in &epoch.static_power {
                let name = format!("{}{}.power_model.staticPower", PREFIX, core);
                let _ = writeln!(out, "{:<50} {:>12.6} # Static power (Watt)", name, v);
            }
            for line in &epoch.extra {
                let _ = writeln!(out, "{}", line);
            }
            let _ = writeln!(out, "---------- End Simulation Statistics   ----------");
        }
        out
    }

    /// Write the dump into `dir` and return its path
    pub fn write_to(&self, dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, self.render()).unwrap();
        path
    }
}
