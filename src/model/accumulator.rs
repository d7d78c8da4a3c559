//! Per-symbol composite vector accumulation.
//!
//! Each composite row has its own mutex, so concurrent writers only contend
//! when they touch the same symbol. A batch gate sits above the rows: writers
//! hold it shared while applying, readers hold it exclusively, so a snapshot
//! never sees half of a batch.

use crate::error::{EmbedError, Result};
use crate::hrr::{add_scaled, Vector};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// One weighted contribution to a symbol's composite vector.
#[derive(Debug, Clone)]
pub struct Update {
    /// Vocabulary index of the target symbol.
    pub symbol: usize,
    /// Contribution vector.
    pub contribution: Vector,
    /// Scale applied to `contribution`.
    pub weight: f32,
}

impl Update {
    /// Creates an update.
    pub fn new(symbol: usize, contribution: Vector, weight: f32) -> Self {
        Self {
            symbol,
            contribution,
            weight,
        }
    }
}

/// Composite vectors for `N` symbols, all starting at zero.
pub struct Accumulator {
    dim: usize,
    rows: Vec<Mutex<Vector>>,
    gate: RwLock<()>,
    applied: AtomicU64,
}

impl Accumulator {
    /// Creates `num_symbols` zero rows of dimension `dim`.
    pub fn new(num_symbols: usize, dim: usize) -> Self {
        Self {
            dim,
            rows: (0..num_symbols).map(|_| Mutex::new(vec![0.0; dim])).collect(),
            gate: RwLock::new(()),
            applied: AtomicU64::new(0),
        }
    }

    /// Vector dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total updates applied so far.
    pub fn updates_applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Adds `weight * contribution` into row `symbol`.
    pub fn observe(&self, symbol: usize, contribution: &[f32], weight: f32) -> Result<()> {
        self.check(symbol, contribution)?;
        let _gate = self.gate.read_recursive();
        add_scaled(&mut self.rows[symbol].lock(), contribution, weight);
        self.applied.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Applies a batch of updates as one unit.
    ///
    /// The whole batch is validated before anything is written, so an error
    /// leaves every row untouched. Updates to the same symbol are applied in
    /// batch order, which makes the result independent of how a stream of
    /// updates is cut into batches.
    pub fn observe_batch(&self, mut updates: Vec<Update>) -> Result<()> {
        for update in &updates {
            self.check(update.symbol, &update.contribution)?;
        }
        if updates.is_empty() {
            return Ok(());
        }

        // stable: keeps batch order within each symbol
        updates.sort_by_key(|u| u.symbol);
        let groups: Vec<&[Update]> = updates.chunk_by(|a, b| a.symbol == b.symbol).collect();

        // recursive: a worker inside the par_iter below may steal another
        // writer's task while holding the gate
        let _gate = self.gate.read_recursive();
        groups.par_iter().for_each(|group| {
            let mut row = self.rows[group[0].symbol].lock();
            for update in group.iter() {
                add_scaled(&mut row, &update.contribution, update.weight);
            }
        });
        self.applied.fetch_add(updates.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Copy of one composite row.
    pub fn composite(&self, symbol: usize) -> Option<Vector> {
        let _gate = self.gate.write();
        self.rows.get(symbol).map(|row| row.lock().clone())
    }

    /// Consistent copy of every row.
    pub fn snapshot(&self) -> Vec<Vector> {
        let _gate = self.gate.write();
        self.rows.iter().map(|row| row.lock().clone()).collect()
    }

    /// Consumes the accumulator and returns its rows.
    pub fn into_rows(self) -> Vec<Vector> {
        self.rows.into_iter().map(Mutex::into_inner).collect()
    }

    fn check(&self, symbol: usize, contribution: &[f32]) -> Result<()> {
        if contribution.len() != self.dim {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dim,
                found: contribution.len(),
            });
        }
        if symbol >= self.rows.len() {
            return Err(EmbedError::UnknownSymbol(format!("#{symbol}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_weighted() {
        let acc = Accumulator::new(2, 3);
        acc.observe(0, &[1.0, 2.0, 3.0], 1.0).unwrap();
        acc.observe(0, &[1.0, 1.0, 1.0], 2.0).unwrap();

        assert_eq!(acc.composite(0).unwrap(), vec![3.0, 4.0, 5.0]);
        assert_eq!(acc.composite(1).unwrap(), vec![0.0; 3]);
        assert_eq!(acc.updates_applied(), 2);
    }

    #[test]
    fn test_dimension_mismatch() {
        let acc = Accumulator::new(1, 3);
        let err = acc.observe(0, &[1.0, 2.0], 1.0).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let acc = Accumulator::new(2, 2);
        let batch = vec![
            Update::new(0, vec![1.0, 1.0], 1.0),
            Update::new(1, vec![1.0], 1.0),
        ];
        assert!(acc.observe_batch(batch).is_err());
        assert_eq!(acc.snapshot(), vec![vec![0.0; 2], vec![0.0; 2]]);
    }

    #[test]
    fn test_order_independence() {
        let updates: Vec<Update> = (0..50)
            .map(|i| Update::new(i % 3, vec![i as f32 * 0.1, 1.0 / (i + 1) as f32], 0.5))
            .collect();

        let forward = Accumulator::new(3, 2);
        for u in &updates {
            forward.observe(u.symbol, &u.contribution, u.weight).unwrap();
        }

        let backward = Accumulator::new(3, 2);
        for u in updates.iter().rev() {
            backward.observe(u.symbol, &u.contribution, u.weight).unwrap();
        }

        for (a, b) in forward.snapshot().iter().zip(backward.snapshot()) {
            for (x, y) in a.iter().zip(&b) {
                assert!((x - y).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_batching_matches_single_updates() {
        let updates: Vec<Update> = (0..40)
            .map(|i| Update::new(i % 4, vec![(i as f32).sin(), (i as f32).cos()], 1.0))
            .collect();

        let single = Accumulator::new(4, 2);
        for u in &updates {
            single.observe(u.symbol, &u.contribution, u.weight).unwrap();
        }

        let batched = Accumulator::new(4, 2);
        for chunk in updates.chunks(7) {
            batched.observe_batch(chunk.to_vec()).unwrap();
        }

        assert_eq!(single.into_rows(), batched.into_rows());
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let acc = Accumulator::new(3, 2);
        let done = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    // rows 1 and 2 only ever change together
                    let rows = acc.snapshot();
                    assert_eq!(rows[1], rows[2]);
                }
            });

            (0..1000).into_par_iter().for_each(|i| {
                if i % 2 == 0 {
                    acc.observe(0, &[1.0, 2.0], 1.0).unwrap();
                } else {
                    acc.observe_batch(vec![
                        Update::new(0, vec![1.0, 2.0], 1.0),
                        Update::new(1, vec![1.0, 1.0], 1.0),
                        Update::new(2, vec![1.0, 1.0], 1.0),
                    ])
                    .unwrap();
                }
            });
            done.store(true, Ordering::Release);
        });

        assert_eq!(acc.updates_applied(), 2000);
        assert_eq!(
            acc.into_rows(),
            vec![vec![1000.0, 2000.0], vec![500.0, 500.0], vec![500.0, 500.0]]
        );
    }
}
