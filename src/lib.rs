//! Statistical core of an estimation-of-distribution optimizer: worth
//! transforms over a population, bound specifications with repair, and
//! multivariate normal sampling through a cached Cholesky factor.

pub mod bounds;
pub mod config;
pub mod error;
pub mod individual;
pub mod linalg;
pub mod repair;
pub mod sampler;
pub mod worth;

pub use bounds::{Bound, BoundSet, NO_BOUNDS};
pub use config::SamplerConfig;
pub use error::{EdoError, Result};
pub use individual::{Individual, Population};
pub use linalg::cholesky;
pub use repair::{BoundRepairer, RepairMode, Repairer};
pub use sampler::{GaussianSampler, NormalMulti, NormalSource, ReplayNormals};
pub use worth::{
    CachedWorth, LinearRanking, NoWorth, PlainWorth, WorthCalculator, WorthTransform,
};
