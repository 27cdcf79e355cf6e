use log::trace;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundSet;
use crate::individual::Individual;

/// Projects an infeasible candidate back into the feasible region, in place.
/// Implementations must not change the number of genes.
pub trait Repairer<F = f64>: Send + Sync {
    fn repair(&self, individual: &mut Individual<F>);
}

/// How out-of-range genes are brought back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairMode {
    /// Clamp to the violated boundary.
    #[default]
    Truncate,
    /// Reflect across the violated boundary.
    Fold,
}

/// Box-constraint repair driven by a [`BoundSet`].
#[derive(Clone, Debug)]
pub struct BoundRepairer {
    bounds: BoundSet,
    mode: RepairMode,
}

impl BoundRepairer {
    pub fn new(bounds: BoundSet, mode: RepairMode) -> Self {
        Self { bounds, mode }
    }

    pub fn truncating(bounds: BoundSet) -> Self {
        Self::new(bounds, RepairMode::Truncate)
    }

    pub fn bounds(&self) -> &BoundSet {
        &self.bounds
    }

    pub fn mode(&self) -> RepairMode {
        self.mode
    }

    /// Repair a raw gene slice; returns how many genes moved.
    pub fn apply(&self, genes: &mut [f64]) -> usize {
        match self.mode {
            RepairMode::Truncate => self.bounds.truncate(genes),
            RepairMode::Fold => self.bounds.fold_in(genes),
        }
    }
}

impl<F> Repairer<F> for BoundRepairer {
    fn repair(&self, individual: &mut Individual<F>) {
        let moved = self.apply(&mut individual.genes);
        if moved > 0 {
            trace!("{:?} repair moved {} of {} genes", self.mode, moved, individual.len());
        }
    }
}

impl<F> Repairer<F> for BoundSet {
    fn repair(&self, individual: &mut Individual<F>) {
        let moved = self.truncate(&mut individual.genes);
        if moved > 0 {
            trace!("truncation moved {} of {} genes", moved, individual.len());
        }
    }
}
