use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundSet;
use crate::error::{EdoError, Result};
use crate::repair::{BoundRepairer, RepairMode};
use crate::sampler::{GaussianSampler, DEFAULT_PSD_TOLERANCE};

/// Sampler settings, typically read from a TOML table.
///
/// ```toml
/// seed = 42
/// bounds = "2(0,1),(-inf,+inf)"
/// dimension = 5
/// repair = "fold"
/// psd_tolerance = 1e-10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub seed: Option<u64>,
    pub bounds: Option<String>,
    pub dimension: Option<usize>,
    pub repair: RepairMode,
    pub psd_tolerance: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            bounds: None,
            dimension: None,
            repair: RepairMode::Truncate,
            psd_tolerance: DEFAULT_PSD_TOLERANCE,
        }
    }
}

impl SamplerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.psd_tolerance.is_finite() || self.psd_tolerance < 0.0 {
            return Err(EdoError::Config(format!(
                "psd_tolerance must be finite and non-negative, got {}",
                self.psd_tolerance
            )));
        }
        if self.dimension == Some(0) {
            return Err(EdoError::Config("dimension must be positive".to_string()));
        }
        Ok(())
    }

    /// Parsed bounds grown to `dimension`, if any bounds are configured.
    /// Without `dimension` the set keeps its parsed length.
    pub fn bound_set(&self) -> Result<Option<BoundSet>> {
        self.bounds_for(self.dimension)
    }

    fn bounds_for(&self, dimension: Option<usize>) -> Result<Option<BoundSet>> {
        let Some(spec) = &self.bounds else {
            return Ok(None);
        };
        let mut set = BoundSet::parse(spec)?;
        if let Some(dim) = dimension {
            set.adjust_size(dim);
        }
        Ok(Some(set))
    }

    /// Sampler whose repairer uses the bounds as configured. Repairing an
    /// individual of a different length than [`bound_set`] panics, so prefer
    /// [`build_for`] when `dimension` is unset.
    ///
    /// [`bound_set`]: SamplerConfig::bound_set
    /// [`build_for`]: SamplerConfig::build_for
    pub fn build<F: 'static>(&self) -> Result<GaussianSampler<F>> {
        self.validate()?;
        let bounds = self.bound_set()?;
        Ok(self.assemble(bounds))
    }

    /// Sampler for `dimension`-sized distributions; bounds are grown to that
    /// size. A configured `dimension` that disagrees, or bounds covering more
    /// dimensions, is a configuration error.
    pub fn build_for<F: 'static>(&self, dimension: usize) -> Result<GaussianSampler<F>> {
        self.validate()?;
        if dimension == 0 {
            return Err(EdoError::Config("dimension must be positive".to_string()));
        }
        if let Some(configured) = self.dimension.filter(|&d| d != dimension) {
            return Err(EdoError::Config(format!(
                "configured dimension {configured} does not match problem dimension {dimension}"
            )));
        }
        let bounds = self.bounds_for(Some(dimension))?;
        if let Some(set) = bounds.as_ref().filter(|set| set.len() != dimension) {
            return Err(EdoError::Config(format!(
                "bounds cover {} dimensions but the problem has {dimension}",
                set.len()
            )));
        }
        Ok(self.assemble(bounds))
    }

    fn assemble<F: 'static>(&self, bounds: Option<BoundSet>) -> GaussianSampler<F> {
        let sampler = GaussianSampler::new().with_tolerance(self.psd_tolerance);
        match bounds {
            Some(bounds) => {
                debug!("sampler repairs with {:?} into {}", self.repair, bounds);
                sampler.with_repairer(BoundRepairer::new(bounds, self.repair))
            }
            None => sampler,
        }
    }

    /// Seeded generator when `seed` is set, entropy-seeded otherwise.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
