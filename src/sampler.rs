use log::debug;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::error::Result;
use crate::individual::{Individual, Population};
use crate::linalg::{affine, cholesky};
use crate::repair::Repairer;

pub const DEFAULT_PSD_TOLERANCE: f64 = 1e-12;

/// Multivariate normal law: mean vector and covariance matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalMulti {
    pub mean: DVector<f64>,
    pub covariance: DMatrix<f64>,
}

impl NormalMulti {
    pub fn new(mean: DVector<f64>, covariance: DMatrix<f64>) -> Self {
        let n = mean.len();
        assert!(n > 0, "distribution must have at least one dimension");
        assert!(
            covariance.nrows() == n && covariance.ncols() == n,
            "covariance is {}x{} but mean has {} entries",
            covariance.nrows(),
            covariance.ncols(),
            n
        );
        Self { mean, covariance }
    }

    /// `covariance` in row-major order.
    pub fn from_row_slice(mean: &[f64], covariance: &[f64]) -> Self {
        let n = mean.len();
        assert_eq!(
            covariance.len(),
            n * n,
            "covariance needs {} entries, got {}",
            n * n,
            covariance.len()
        );
        Self::new(
            DVector::from_column_slice(mean),
            DMatrix::from_row_slice(n, n, covariance),
        )
    }

    /// `sigma^2 * I` around `mean`.
    pub fn isotropic(mean: &[f64], sigma: f64) -> Self {
        let n = mean.len();
        Self::new(
            DVector::from_column_slice(mean),
            DMatrix::from_diagonal_element(n, n, sigma * sigma),
        )
    }

    pub fn size(&self) -> usize {
        self.mean.len()
    }
}

/// Source of independent standard-normal draws.
pub trait NormalSource {
    fn standard_normal(&mut self) -> f64;
}

impl<R: Rng> NormalSource for R {
    fn standard_normal(&mut self) -> f64 {
        self.sample(StandardNormal)
    }
}

/// Replays a fixed sequence of "normal" values, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ReplayNormals {
    values: Vec<f64>,
    cursor: usize,
}

impl ReplayNormals {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "replay sequence must not be empty");
        Self { values, cursor: 0 }
    }

    /// Number of values handed out so far.
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl NormalSource for ReplayNormals {
    fn standard_normal(&mut self) -> f64 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

struct FactorCache {
    covariance: DMatrix<f64>,
    factor: DMatrix<f64>,
}

/// Draws `X = M + L T` with `V = L L^T` and `T ~ N(0, I)`.
///
/// The Cholesky factor is kept until the covariance contents change, so
/// sampling a whole generation from one distribution factorizes once.
pub struct GaussianSampler<F = f64> {
    repairer: Option<Box<dyn Repairer<F>>>,
    tolerance: f64,
    cache: Option<FactorCache>,
    factorizations: usize,
}

impl<F> std::fmt::Debug for GaussianSampler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaussianSampler")
            .field("has_repairer", &self.repairer.is_some())
            .field("tolerance", &self.tolerance)
            .field("cached", &self.cache.is_some())
            .field("factorizations", &self.factorizations)
            .finish()
    }
}

impl<F> Default for GaussianSampler<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> GaussianSampler<F> {
    pub fn new() -> Self {
        Self {
            repairer: None,
            tolerance: DEFAULT_PSD_TOLERANCE,
            cache: None,
            factorizations: 0,
        }
    }

    pub fn with_repairer(mut self, repairer: impl Repairer<F> + 'static) -> Self {
        self.repairer = Some(Box::new(repairer));
        self
    }

    /// Relative pivot tolerance used by the factorization.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self.cache = None;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn has_repairer(&self) -> bool {
        self.repairer.is_some()
    }

    /// Last computed Cholesky factor, if any.
    pub fn factor(&self) -> Option<&DMatrix<f64>> {
        self.cache.as_ref().map(|c| &c.factor)
    }

    /// How many times the covariance has been factorized.
    pub fn factorizations(&self) -> usize {
        self.factorizations
    }

    /// Reuse the cached factor when the covariance is unchanged, otherwise
    /// factorize again.
    fn take_factor(&mut self, covariance: &DMatrix<f64>) -> Result<FactorCache> {
        match self.cache.take() {
            Some(cached) if cached.covariance == *covariance => Ok(cached),
            _ => {
                let factor = cholesky(covariance, self.tolerance)?;
                self.factorizations += 1;
                debug!(
                    "factorized {}x{} covariance (#{})",
                    covariance.nrows(),
                    covariance.ncols(),
                    self.factorizations
                );
                Ok(FactorCache {
                    covariance: covariance.clone(),
                    factor,
                })
            }
        }
    }

    /// Draw one individual, repaired once if a repairer is configured.
    pub fn sample<S>(
        &mut self,
        distribution: &NormalMulti,
        source: &mut S,
    ) -> Result<Individual<F>>
    where
        S: NormalSource + ?Sized,
    {
        let n = distribution.size();
        assert!(n > 0, "distribution must have at least one dimension");
        let cache = self.take_factor(&distribution.covariance)?;
        let t: Vec<f64> = (0..n).map(|_| source.standard_normal()).collect();
        let individual = self.build(distribution, &cache.factor, &t);
        self.cache = Some(cache);
        Ok(individual)
    }

    /// Draw `count` individuals. Normals are taken from `source` one candidate
    /// after another, so the result matches `count` calls to [`sample`];
    /// the affine transform and repair then run in parallel.
    ///
    /// [`sample`]: GaussianSampler::sample
    pub fn sample_batch<S>(
        &mut self,
        distribution: &NormalMulti,
        count: usize,
        source: &mut S,
    ) -> Result<Population<F>>
    where
        S: NormalSource + ?Sized,
        F: Send,
    {
        let n = distribution.size();
        assert!(n > 0, "distribution must have at least one dimension");
        let cache = self.take_factor(&distribution.covariance)?;
        let draws: Vec<f64> = (0..n * count).map(|_| source.standard_normal()).collect();
        let this = &*self;
        let population = draws
            .par_chunks(n)
            .map(|t| this.build(distribution, &cache.factor, t))
            .collect();
        self.cache = Some(cache);
        Ok(population)
    }

    fn build(
        &self,
        distribution: &NormalMulti,
        factor: &DMatrix<f64>,
        t: &[f64],
    ) -> Individual<F> {
        let mut individual = Individual::from_genes(affine(&distribution.mean, factor, t));
        if let Some(repairer) = &self.repairer {
            repairer.repair(&mut individual);
        }
        individual
    }
}
