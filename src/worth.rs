//! Fitness-to-worth transforms used by selection.
//!
//! A transform owns the worth vector; the population stays with the caller.
//! `compute`, `sort` and `resize` keep population, worths and (for
//! [`CachedWorth`]) the fitness cache index-aligned and of equal length.

use std::cmp::Ordering;
use std::marker::PhantomData;

use log::{debug, trace};

use crate::error::{EdoError, Result};
use crate::individual::{compare_valid_first, Individual, Population};

const DEFAULT_NAME: &str = "Worths";

/// Maps a population's fitness values to selection worths.
pub trait WorthTransform<F> {
    /// Name under which the worth vector is published.
    fn name(&self) -> &str;

    fn compute(&mut self, population: &[Individual<F>]);

    fn worths(&self) -> &[f64];

    fn worth_of(&self, i: usize) -> f64 {
        self.worths()[i]
    }

    /// Reorder `population` so that worths are non-increasing. Order among
    /// equal worths is unspecified.
    fn sort(&mut self, population: &mut Population<F>);

    /// Resize population and worths to `n`, keeping entries by index and
    /// filling new slots with defaults.
    fn resize(&mut self, population: &mut Population<F>, n: usize);
}

/// The actual fitness-to-worth mapping behind [`PlainWorth`] and [`CachedWorth`].
pub trait WorthCalculator<F> {
    /// Overwrite `worths` with one value per individual.
    fn calculate_worths(&mut self, population: &[Individual<F>], worths: &mut Vec<f64>);
}

impl<F, G> WorthCalculator<F> for G
where
    G: FnMut(&[Individual<F>], &mut Vec<f64>),
{
    fn calculate_worths(&mut self, population: &[Individual<F>], worths: &mut Vec<f64>) {
        self(population, worths)
    }
}

/// Linear ranking: the best individual gets `pressure`, the worst
/// `2 - pressure`, evenly spaced in between.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearRanking {
    pressure: f64,
    minimize: bool,
}

impl LinearRanking {
    pub fn new(pressure: f64) -> Result<Self> {
        if !(pressure > 1.0 && pressure <= 2.0) {
            return Err(EdoError::Config(format!(
                "selective pressure must be in (1, 2], got {pressure}"
            )));
        }
        Ok(Self {
            pressure,
            minimize: false,
        })
    }

    /// Rank lower fitness as better.
    pub fn minimizing(mut self) -> Self {
        self.minimize = true;
        self
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }
}

impl<F: PartialOrd> WorthCalculator<F> for LinearRanking {
    fn calculate_worths(&mut self, population: &[Individual<F>], worths: &mut Vec<f64>) {
        let n = population.len();
        worths.clear();
        worths.resize(n, 0.0);
        if n == 0 {
            return;
        }
        if n == 1 {
            worths[0] = self.pressure;
            return;
        }
        // worst first; missing and NaN fitness rank worst in either direction
        let mut idx: Vec<usize> = (0..n).collect();
        idx.sort_by(|&a, &b| {
            compare_valid_first(
                population[a].comparable_fitness(),
                population[b].comparable_fitness(),
                self.minimize,
            )
        });
        let low = 2.0 - self.pressure;
        let step = 2.0 * (self.pressure - 1.0) / ((n - 1) as f64);
        for (rank, &i) in idx.iter().enumerate() {
            worths[i] = low + step * rank as f64;
        }
    }
}

/// Recomputes worths on every call to `compute`.
#[derive(Clone, Debug)]
pub struct PlainWorth<F, C> {
    name: String,
    worths: Vec<f64>,
    calculator: C,
    _fitness: PhantomData<fn() -> F>,
}

impl<F, C> PlainWorth<F, C> {
    pub fn new(calculator: C) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            worths: Vec::new(),
            calculator,
            _fitness: PhantomData,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F, C: WorthCalculator<F>> WorthTransform<F> for PlainWorth<F, C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&mut self, population: &[Individual<F>]) {
        self.calculator.calculate_worths(population, &mut self.worths);
        check_aligned(population.len(), self.worths.len());
    }

    fn worths(&self) -> &[f64] {
        &self.worths
    }

    fn sort(&mut self, population: &mut Population<F>) {
        check_aligned(population.len(), self.worths.len());
        let order = worth_order(&self.worths);
        gather(population, &order);
        gather(&mut self.worths, &order);
    }

    fn resize(&mut self, population: &mut Population<F>, n: usize) {
        population.resize_with(n, Individual::default);
        self.worths.resize(n, 0.0);
    }
}

/// Keeps a snapshot of each individual's fitness and only runs the
/// calculator when at least one of them changed.
#[derive(Clone, Debug)]
pub struct CachedWorth<F, C> {
    name: String,
    worths: Vec<f64>,
    fitness_cache: Vec<Option<F>>,
    calculator: C,
    recomputes: usize,
}

impl<F, C> CachedWorth<F, C> {
    pub fn new(calculator: C) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            worths: Vec::new(),
            fitness_cache: Vec::new(),
            calculator,
            recomputes: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fitness values as of the last recomputation.
    pub fn fitness_cache(&self) -> &[Option<F>] {
        &self.fitness_cache
    }

    /// How many times the calculator has run.
    pub fn recompute_count(&self) -> usize {
        self.recomputes
    }
}

impl<F, C> WorthTransform<F> for CachedWorth<F, C>
where
    F: Clone + PartialEq,
    C: WorthCalculator<F>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&mut self, population: &[Individual<F>]) {
        if self.fitness_cache.len() == population.len() {
            let mut in_sync = true;
            for (cached, ind) in self.fitness_cache.iter_mut().zip(population) {
                if *cached != ind.fitness {
                    in_sync = false;
                    *cached = ind.fitness.clone();
                }
            }
            if in_sync {
                trace!("{}: fitness unchanged, worths up to date", self.name);
                return;
            }
        } else {
            self.fitness_cache = population.iter().map(|ind| ind.fitness.clone()).collect();
        }
        self.calculator.calculate_worths(population, &mut self.worths);
        self.recomputes += 1;
        check_aligned(population.len(), self.worths.len());
        debug!(
            "{}: recomputed {} worths (#{})",
            self.name,
            self.worths.len(),
            self.recomputes
        );
    }

    fn worths(&self) -> &[f64] {
        &self.worths
    }

    fn sort(&mut self, population: &mut Population<F>) {
        check_aligned(population.len(), self.worths.len());
        check_aligned(population.len(), self.fitness_cache.len());
        let order = worth_order(&self.worths);
        gather(population, &order);
        gather(&mut self.worths, &order);
        gather(&mut self.fitness_cache, &order);
    }

    fn resize(&mut self, population: &mut Population<F>, n: usize) {
        population.resize_with(n, Individual::default);
        self.worths.resize(n, 0.0);
        self.fitness_cache.resize(n, None);
    }
}

/// Worth is the raw fitness.
#[derive(Clone, Debug)]
pub struct NoWorth<F = f64> {
    name: String,
    worths: Vec<f64>,
    _fitness: PhantomData<fn() -> F>,
}

impl<F> Default for NoWorth<F> {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            worths: Vec::new(),
            _fitness: PhantomData,
        }
    }
}

impl<F> NoWorth<F> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: Copy + Into<f64>> WorthTransform<F> for NoWorth<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&mut self, population: &[Individual<F>]) {
        self.worths.clear();
        for (i, ind) in population.iter().enumerate() {
            match ind.fitness {
                Some(f) => self.worths.push(f.into()),
                None => panic!("individual {i} has no fitness to copy into its worth"),
            }
        }
    }

    fn worths(&self) -> &[f64] {
        &self.worths
    }

    fn sort(&mut self, population: &mut Population<F>) {
        check_aligned(population.len(), self.worths.len());
        let order = worth_order(&self.worths);
        gather(population, &order);
        gather(&mut self.worths, &order);
    }

    fn resize(&mut self, population: &mut Population<F>, n: usize) {
        population.resize_with(n, Individual::default);
        self.worths.resize(n, 0.0);
    }
}

fn check_aligned(population: usize, other: usize) {
    assert_eq!(
        population, other,
        "population has {population} individuals but {other} worth entries"
    );
}

/// Indices ordered by decreasing worth; NaN worths go last.
fn worth_order(worths: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..worths.len()).collect();
    idx.sort_unstable_by(|&a, &b| {
        let (wa, wb) = (worths[a], worths[b]);
        match (wb.partial_cmp(&wa), wa.is_nan(), wb.is_nan()) {
            (Some(ord), false, false) => ord,
            (_, true, false) => Ordering::Greater,
            (_, false, true) => Ordering::Less,
            _ => Ordering::Equal,
        }
    });
    idx
}

/// Rebuild `items` as `[items[order[0]], items[order[1]], ...]`.
fn gather<T>(items: &mut Vec<T>, order: &[usize]) {
    let mut slots: Vec<Option<T>> = items.drain(..).map(Some).collect();
    items.extend(order.iter().filter_map(|&i| slots[i].take()));
}
