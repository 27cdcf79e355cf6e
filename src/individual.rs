use std::cmp::Ordering;
use std::ops::{Deref, DerefMut};

/// A real-valued candidate solution and its (optional) fitness.
#[derive(Clone, Debug, PartialEq)]
pub struct Individual<F = f64> {
    pub genes: Vec<f64>,
    pub fitness: Option<F>,
}

/// Ordered collection of individuals; position is rank after sorting.
pub type Population<F = f64> = Vec<Individual<F>>;

impl<F> Default for Individual<F> {
    fn default() -> Self {
        Self {
            genes: Vec::new(),
            fitness: None,
        }
    }
}

impl<F> Individual<F> {
    /// `n` genes set to zero, not yet evaluated.
    pub fn new(n: usize) -> Self {
        Self::from_genes(vec![0.0; n])
    }

    pub fn from_genes(genes: Vec<f64>) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    pub fn with_fitness(mut self, fitness: F) -> Self {
        self.fitness = Some(fitness);
        self
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn fitness(&self) -> Option<&F> {
        self.fitness.as_ref()
    }

    pub fn set_fitness(&mut self, fitness: F) {
        self.fitness = Some(fitness);
    }

    /// Drop the fitness, e.g. after the genes were modified.
    pub fn invalidate(&mut self) {
        self.fitness = None;
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }
}

impl<F: PartialOrd> Individual<F> {
    /// The fitness, unless it is missing or not comparable with itself (NaN).
    pub fn comparable_fitness(&self) -> Option<&F> {
        self.fitness
            .as_ref()
            .filter(|f| f.partial_cmp(f).is_some())
    }

    /// Total fitness-based order. Unevaluated individuals and NaN fitnesses
    /// order below every comparable fitness and equal to each other.
    pub fn compare_fitness(&self, other: &Self) -> Ordering {
        compare_valid_first(self.comparable_fitness(), other.comparable_fitness(), false)
    }
}

/// Compare two optional fitnesses; `None` is always the lowest. `reverse`
/// flips only the order between two present values.
pub(crate) fn compare_valid_first<F: PartialOrd>(
    a: Option<&F>,
    b: Option<&F>,
    reverse: bool,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            if reverse {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

impl<F> Deref for Individual<F> {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.genes
    }
}

impl<F> DerefMut for Individual<F> {
    fn deref_mut(&mut self) -> &mut [f64] {
        &mut self.genes
    }
}

impl<F> From<Vec<f64>> for Individual<F> {
    fn from(genes: Vec<f64>) -> Self {
        Self::from_genes(genes)
    }
}
