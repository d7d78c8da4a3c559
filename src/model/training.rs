//! The shared training loop.
//!
//! Units are pulled from the corpus in batches of `batch_size`; each batch is
//! encoded in parallel and then applied to the accumulator as one unit. The
//! abort flag is checked between batches only, so every applied batch is
//! complete.

use crate::config::EmbeddingConfig;
use crate::corpus::Corpus;
use crate::error::Result;
use crate::model::accumulator::Accumulator;
use crate::model::encoder::{EncodeContext, Encoded, Encoder};
use log::{debug, info};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cloneable flag that asks a running training pass to stop.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Creates a handle in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that training stop before the next batch.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether an abort was requested.
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summary of a training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    /// Epochs run to completion.
    pub epochs_completed: usize,
    /// Corpus units encoded.
    pub units: usize,
    /// Composite updates applied.
    pub updates: usize,
    /// Batches applied.
    pub batches: usize,
    /// Tokens skipped because they are not in the vocabulary.
    pub skipped_tokens: usize,
    /// Dependency edges skipped as malformed.
    pub skipped_edges: usize,
    /// Whether the run stopped early on request.
    pub aborted: bool,
    /// Wall-clock time.
    pub elapsed: Duration,
}

pub(crate) fn run<E, C>(
    encoder: &E,
    corpus: &C,
    ctx: &EncodeContext<'_>,
    accumulator: &Accumulator,
    config: &EmbeddingConfig,
    abort: &AbortHandle,
) -> Result<TrainingReport>
where
    E: Encoder,
    C: Corpus<Unit = E::Unit> + ?Sized,
{
    let start = Instant::now();
    let mut report = TrainingReport::default();

    'epochs: for epoch in 0..config.epochs {
        let mut units = corpus.units()?;

        loop {
            if abort.is_aborted() {
                info!("Training aborted after {} batches", report.batches);
                report.aborted = true;
                break 'epochs;
            }

            let batch: Vec<E::Unit> = units
                .by_ref()
                .take(config.batch_size)
                .collect::<Result<_>>()?;
            if batch.is_empty() {
                break;
            }

            let encoded: Vec<Encoded> = batch.par_iter().map(|unit| encoder.encode(unit, ctx)).collect();

            let mut updates = Vec::new();
            for e in encoded {
                report.skipped_tokens += e.skipped_tokens;
                report.skipped_edges += e.skipped_edges;
                updates.extend(e.updates);
            }

            let applied = updates.len();
            accumulator.observe_batch(updates)?;

            report.units += batch.len();
            report.updates += applied;
            report.batches += 1;
            debug!(
                "Epoch {} batch {}: {} units, {} updates",
                epoch + 1,
                report.batches,
                batch.len(),
                applied
            );
        }

        report.epochs_completed += 1;
        info!(
            "Epoch {}/{} complete: {} units, {} updates so far",
            epoch + 1,
            config.epochs,
            report.units,
            report.updates
        );
    }

    report.elapsed = start.elapsed();
    Ok(report)
}
