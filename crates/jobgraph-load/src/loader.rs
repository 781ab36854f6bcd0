//! The graph loader: constraints, then nodes, then relationships.
//!
//! Constraints are applied one statement at a time. Every node and
//! relationship phase opens its own store session, streams its driving
//! source in batches, and commits before the next phase starts. A record whose fields
//! fail coercion is logged and skipped; the rest of the phase carries on.

use std::time::Instant;

use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use jobgraph_core::config::SourceSettings;
use jobgraph_core::{EdgeRow, EdgeSpec, NodeLabel, NodeRow, NodeSpec, EDGE_SPECS, NODE_SPECS};

use crate::error::{LoadError, Result, StoreError};
use crate::report::{LoadReport, PhaseReport};
use crate::retry::{with_retries, RetryPolicy};
use crate::source::CsvSource;
use crate::store::{GraphStore, StoreSession};

const DEFAULT_BATCH_SIZE: usize = 1000;

/// Upper bound on rows reserved up front for a batch.
const MAX_BATCH_RESERVE: usize = 4096;

/// Loads the five entity sources into a graph store.
pub struct GraphLoader<S> {
    store: S,
    sources: SourceSettings,
    batch_size: usize,
}

impl<S: GraphStore> GraphLoader<S> {
    pub fn new(store: S, sources: SourceSettings) -> Self {
        Self {
            store,
            sources,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Rows per bulk statement (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run every phase once, in order.
    pub async fn run(&self) -> Result<LoadReport> {
        let run_id = Uuid::new_v4();
        self.run_phases(run_id)
            .instrument(tracing::info_span!("load", %run_id))
            .await
    }

    /// Run the whole load, starting over while the store is unreachable.
    pub async fn run_with_retries(&self, policy: &RetryPolicy) -> Result<LoadReport> {
        with_retries(policy, |attempt| {
            tracing::info!(attempt, "Starting graph load");
            self.run()
        })
        .await
    }

    async fn run_phases(&self, run_id: Uuid) -> Result<LoadReport> {
        if let Some(label) = self.sources.missing().into_iter().next() {
            return Err(LoadError::MissingSource(label));
        }

        let started_at = Utc::now();
        let mut phases = Vec::with_capacity(1 + NODE_SPECS.len() + EDGE_SPECS.len());

        phases.push(self.init_constraints().await?);
        for spec in &NODE_SPECS {
            phases.push(self.load_nodes(spec).await?);
        }
        for spec in &EDGE_SPECS {
            phases.push(self.load_edges(spec).await?);
        }

        let report = LoadReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            phases,
        };
        tracing::info!(
            phases = report.phases.len(),
            skipped = report.total_skipped(),
            "Graph load complete"
        );
        Ok(report)
    }

    // ── Phases ───────────────────────────────────────────────────

    async fn init_constraints(&self) -> Result<PhaseReport> {
        tracing::info!("Setting uniqueness constraints on nodes");
        let started = Instant::now();
        let mut report = PhaseReport::new("constraints");

        for label in NodeLabel::ALL {
            match self.store.ensure_unique_constraint(label).await {
                Ok(()) => {}
                Err(StoreError::ConstraintExists(detail)) => {
                    tracing::debug!(%label, %detail, "Uniqueness constraint already present");
                }
                Err(e) => return Err(e.into()),
            }
            report.written += 1;
        }

        report.elapsed_ms = elapsed_ms(started);
        Ok(report)
    }

    async fn load_nodes(&self, spec: &NodeSpec) -> Result<PhaseReport> {
        let location = self.location(spec.label)?;
        tracing::info!(label = %spec.label, source = location, "Loading nodes");
        let started = Instant::now();
        let mut report = PhaseReport::new(spec.label.as_str());

        let source = CsvSource::open(location)?;
        let mut session = self.store.open_session().await?;
        let mut batch: Vec<NodeRow> = Vec::with_capacity(self.batch_reserve());

        for record in source {
            let record = record?;
            report.records += 1;

            match spec.node_row(&record) {
                Ok(row) => batch.push(row),
                Err(e) => {
                    report.skipped += 1;
                    tracing::warn!(
                        label = %spec.label,
                        record = record.line,
                        error = %e,
                        "Skipping record"
                    );
                }
            }

            if batch.len() >= self.batch_size {
                session.upsert_nodes(spec.label, &batch).await?;
                report.written += batch.len() as u64;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            session.upsert_nodes(spec.label, &batch).await?;
            report.written += batch.len() as u64;
        }
        session.commit().await?;

        report.elapsed_ms = elapsed_ms(started);
        tracing::info!(
            label = %spec.label,
            records = report.records,
            written = report.written,
            skipped = report.skipped,
            elapsed_ms = report.elapsed_ms,
            "Nodes loaded"
        );
        Ok(report)
    }

    async fn load_edges(&self, spec: &EdgeSpec) -> Result<PhaseReport> {
        let location = self.location(spec.source)?;
        tracing::info!(rel = %spec.rel, source = location, "Loading relationships");
        let started = Instant::now();
        let mut report = PhaseReport::new(spec.rel.as_str());

        let source = CsvSource::open(location)?;
        let mut session = self.store.open_session().await?;
        let mut batch: Vec<EdgeRow> = Vec::with_capacity(self.batch_reserve());

        for record in source {
            let record = record?;
            report.records += 1;

            match spec.edge_row(&record) {
                Ok(Some(row)) => batch.push(row),
                Ok(None) => report.unmatched += 1,
                Err(e) => {
                    report.skipped += 1;
                    tracing::warn!(
                        rel = %spec.rel,
                        record = record.line,
                        error = %e,
                        "Skipping record"
                    );
                }
            }

            if batch.len() >= self.batch_size {
                self.flush_edges(&mut session, spec, &batch, &mut report)
                    .await?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            self.flush_edges(&mut session, spec, &batch, &mut report)
                .await?;
        }
        session.commit().await?;

        report.elapsed_ms = elapsed_ms(started);
        tracing::info!(
            rel = %spec.rel,
            records = report.records,
            matched = report.written,
            unmatched = report.unmatched,
            skipped = report.skipped,
            elapsed_ms = report.elapsed_ms,
            "Relationships loaded"
        );
        Ok(report)
    }

    async fn flush_edges(
        &self,
        session: &mut S::Session,
        spec: &EdgeSpec,
        batch: &[EdgeRow],
        report: &mut PhaseReport,
    ) -> Result<()> {
        let matched = session.upsert_edges(spec, batch).await?;
        let submitted = batch.len() as u64;
        report.written += matched;
        report.unmatched += submitted.saturating_sub(matched);
        Ok(())
    }

    fn batch_reserve(&self) -> usize {
        self.batch_size.min(MAX_BATCH_RESERVE)
    }

    fn location(&self, label: NodeLabel) -> Result<&str> {
        self.sources
            .location_of(label)
            .ok_or(LoadError::MissingSource(label))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
