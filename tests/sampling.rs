use fastedo::{
    BoundSet, EdoError, GaussianSampler, Individual, NormalMulti, NormalSource, ReplayNormals,
    SamplerConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn empirical_moments(samples: &[Individual]) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = samples[0].len();
    let count = samples.len() as f64;
    let mut mean = vec![0.0; n];
    for s in samples {
        for i in 0..n {
            mean[i] += s[i] / count;
        }
    }
    let mut cov = vec![vec![0.0; n]; n];
    for s in samples {
        for i in 0..n {
            for j in 0..n {
                cov[i][j] += (s[i] - mean[i]) * (s[j] - mean[j]) / (count - 1.0);
            }
        }
    }
    (mean, cov)
}

#[test]
fn identity_covariance_with_fixed_draws() {
    init_logging();
    let dist = NormalMulti::from_row_slice(&[0.0, 0.0], &[1.0, 0.0, 0.0, 1.0]);
    let mut sampler: GaussianSampler = GaussianSampler::new();
    let x = sampler
        .sample(&dist, &mut ReplayNormals::new(vec![1.0, 2.0]))
        .unwrap();
    assert_eq!(x.genes, vec![1.0, 2.0]);
}

#[test]
fn zero_covariance_ignores_draws() {
    let mean = [1.5, -2.0, 0.0, 7.25];
    let dist = NormalMulti::from_row_slice(&mean, &[0.0; 16]);
    let mut sampler: GaussianSampler = GaussianSampler::new();
    let mut src = ReplayNormals::new(vec![3.0, -1.0, 100.0]);
    for _ in 0..5 {
        assert_eq!(sampler.sample(&dist, &mut src).unwrap().genes, mean.to_vec());
    }
    assert_eq!(src.drawn(), 20);
}

#[test]
fn correlated_draws_match_moments() {
    init_logging();
    let start = Instant::now();
    let cov = [4.0, 1.2, 1.2, 1.0];
    let dist = NormalMulti::from_row_slice(&[1.0, -3.0], &cov);
    let mut sampler: GaussianSampler = GaussianSampler::new();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let samples = sampler.sample_batch(&dist, 20_000, &mut rng).unwrap();
    let (mean, emp) = empirical_moments(&samples);
    assert!((mean[0] - 1.0).abs() < 0.08, "mean[0] = {}", mean[0]);
    assert!((mean[1] + 3.0).abs() < 0.08, "mean[1] = {}", mean[1]);
    for i in 0..2 {
        for j in 0..2 {
            let expected = cov[i * 2 + j];
            assert!(
                (emp[i][j] - expected).abs() < 0.15,
                "cov[{i}][{j}] = {} (expected {expected})",
                emp[i][j]
            );
        }
    }
    assert_eq!(sampler.factorizations(), 1);
    assert!(
        start.elapsed().as_millis() < 10_000,
        "sampling timing regression"
    );
}

#[test]
fn same_seed_same_population() {
    let dist = NormalMulti::isotropic(&[0.0; 5], 0.7);
    let draw = |seed: u64| {
        let mut sampler: GaussianSampler = GaussianSampler::new();
        let mut rng = StdRng::seed_from_u64(seed);
        (0..10)
            .map(|_| sampler.sample(&dist, &mut rng).unwrap().genes)
            .collect::<Vec<_>>()
    };
    assert_eq!(draw(17), draw(17));
    assert_ne!(draw(17), draw(18));
}

#[test]
fn not_positive_semi_definite_propagates() {
    let cov = [1.0, 0.0, 0.0, 0.0, -2.0, 0.0, 0.0, 0.0, 1.0];
    let dist = NormalMulti::from_row_slice(&[0.0; 3], &cov);
    let mut sampler: GaussianSampler = GaussianSampler::new();
    match sampler.sample(&dist, &mut StdRng::seed_from_u64(1)) {
        Err(EdoError::Numerical(msg)) => assert!(msg.contains("positive semi-definite"), "{msg}"),
        other => panic!("expected numerical error, got {other:?}"),
    }
    assert!(sampler
        .sample_batch(&dist, 4, &mut StdRng::seed_from_u64(1))
        .unwrap_err()
        .is_numerical());
}

#[test]
fn configured_sampler_repairs_into_bounds() {
    let config = SamplerConfig::from_toml_str(
        r#"
        seed = 9
        bounds = "[-1,1] [0,+inf]"
        dimension = 3
        "#,
    )
    .unwrap();
    let mut sampler: GaussianSampler = config.build().unwrap();
    let mut rng = config.rng();
    let bounds = config.bound_set().unwrap().unwrap();
    assert_eq!(bounds, BoundSet::parse("[-1,1] 2[0,+inf]").unwrap());

    let dist = NormalMulti::isotropic(&[0.0; 3], 5.0);
    for _ in 0..100 {
        let x = sampler.sample(&dist, &mut rng).unwrap();
        assert_eq!(x.len(), 3);
        assert!(bounds.is_in_bounds(&x.genes), "{:?}", x.genes);
    }
}

struct CountingSource {
    inner: StdRng,
    draws: usize,
}

impl NormalSource for CountingSource {
    fn standard_normal(&mut self) -> f64 {
        self.draws += 1;
        self.inner.standard_normal()
    }
}

#[test]
fn one_normal_per_dimension_per_sample() {
    let dist = NormalMulti::isotropic(&[0.0; 6], 1.0);
    let mut sampler: GaussianSampler = GaussianSampler::new();
    let mut src = CountingSource {
        inner: StdRng::seed_from_u64(0),
        draws: 0,
    };
    sampler.sample(&dist, &mut src).unwrap();
    sampler.sample_batch(&dist, 7, &mut src).unwrap();
    assert_eq!(src.draws, 6 * 8);
}
