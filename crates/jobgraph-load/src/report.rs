//! Per-phase progress of a load run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of one load phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    /// Label, relationship type, or `constraints`.
    pub phase: String,
    /// Records read from the driving source.
    pub records: u64,
    /// Nodes upserted, relationships matched, or constraints ensured.
    pub written: u64,
    /// Records dropped because a field failed coercion.
    pub skipped: u64,
    /// Relationship records whose endpoints were blank or not found.
    pub unmatched: u64,
    pub elapsed_ms: u64,
}

impl PhaseReport {
    pub fn new(phase: &str) -> Self {
        Self {
            phase: phase.to_string(),
            ..Default::default()
        }
    }
}

/// Outcome of a complete load run.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phases: Vec<PhaseReport>,
}

impl LoadReport {
    /// Report for the phase named `name`.
    pub fn phase(&self, name: &str) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == name)
    }

    pub fn total_skipped(&self) -> u64 {
        self.phases.iter().map(|p| p.skipped).sum()
    }
}
