use fastedo::{
    CachedWorth, GaussianSampler, Individual, LinearRanking, NoWorth, NormalMulti, PlainWorth,
    Population, WorthTransform,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_population(rng: &mut StdRng, size: usize, dim: usize) -> Population {
    (0..size)
        .map(|_| {
            let genes: Vec<f64> = (0..dim).map(|_| rng.gen_range(-3.0..3.0)).collect();
            let f = genes.iter().map(|v| v * v).sum::<f64>();
            Individual::from_genes(genes).with_fitness(f)
        })
        .collect()
}

fn check_sorted<T: WorthTransform<f64>>(worth: &T, pop: &Population) {
    assert_eq!(pop.len(), worth.worths().len());
    for w in worth.worths().windows(2) {
        assert!(w[0] >= w[1], "worths not non-increasing: {:?}", worth.worths());
    }
}

fn gene_multiset(pop: &Population) -> Vec<Vec<f64>> {
    let mut genes: Vec<Vec<f64>> = pop.iter().map(|ind| ind.genes.clone()).collect();
    genes.sort_by(|a, b| a.partial_cmp(b).unwrap());
    genes
}

#[test]
fn compute_then_sort_keeps_lockstep_for_many_seeds() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let size = rng.gen_range(1..40);
        let mut pop = random_population(&mut rng, size, 3);
        let before = gene_multiset(&pop);

        let mut worth = CachedWorth::new(LinearRanking::new(1.8).unwrap().minimizing());
        worth.compute(&pop);
        worth.sort(&mut pop);

        check_sorted(&worth, &pop);
        assert_eq!(worth.fitness_cache().len(), pop.len());
        for (cached, ind) in worth.fitness_cache().iter().zip(&pop) {
            assert_eq!(*cached, ind.fitness);
        }
        assert_eq!(gene_multiset(&pop), before, "sort is not a permutation");
        // best (smallest sphere value) first
        let best = pop
            .iter()
            .map(|ind| ind.fitness.unwrap())
            .fold(f64::INFINITY, f64::min);
        assert_eq!(pop[0].fitness, Some(best));
    }
}

#[test]
fn unchanged_fitness_skips_recompute() {
    let mut rng = StdRng::seed_from_u64(77);
    let mut pop = random_population(&mut rng, 12, 2);
    let mut worth = CachedWorth::new(LinearRanking::new(2.0).unwrap());
    worth.compute(&pop);
    worth.compute(&pop);
    worth.sort(&mut pop);
    worth.compute(&pop);
    assert_eq!(worth.recompute_count(), 1);

    pop[5].set_fitness(-1.0);
    worth.compute(&pop);
    assert_eq!(worth.recompute_count(), 2);
}

#[test]
fn resize_then_refill_from_sampler() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut pop = random_population(&mut rng, 6, 2);
    let mut worth = CachedWorth::new(LinearRanking::new(2.0).unwrap().minimizing());
    worth.compute(&pop);
    worth.sort(&mut pop);
    worth.resize(&mut pop, 3);
    assert_eq!((pop.len(), worth.worths().len(), worth.fitness_cache().len()), (3, 3, 3));

    let mut sampler: GaussianSampler = GaussianSampler::new();
    let dist = NormalMulti::isotropic(&pop[0].genes, 0.1);
    let offspring = sampler.sample_batch(&dist, 5, &mut rng).unwrap();
    pop.extend(offspring.into_iter().map(|mut ind| {
        let f = ind.genes.iter().map(|v| v * v).sum::<f64>();
        ind.set_fitness(f);
        ind
    }));
    worth.compute(&pop);
    worth.sort(&mut pop);
    check_sorted(&worth, &pop);
    assert_eq!(worth.fitness_cache().len(), 8);
}

#[test]
fn no_worth_and_plain_worth_agree_on_order() {
    let mut rng = StdRng::seed_from_u64(123);
    let pop = random_population(&mut rng, 15, 4);

    let mut a = pop.clone();
    let mut identity = NoWorth::new();
    identity.compute(&a);
    identity.sort(&mut a);

    let mut b = pop;
    let mut plain = PlainWorth::new(|p: &[Individual], w: &mut Vec<f64>| {
        w.clear();
        w.extend(p.iter().map(|ind| ind.fitness.unwrap_or(f64::NAN)));
    });
    plain.compute(&b);
    plain.sort(&mut b);

    assert_eq!(identity.worths(), plain.worths());
    check_sorted(&identity, &a);
    assert_eq!(identity.name(), "Worths");
}
