//! Genetic algorithm engine for menu optimization.
//!
//! Evolves fixed-length, duplicate-free menus over a dish catalog with
//! elitism, tournament selection, and the strategy-mixing operators from
//! [`super::operators`]. The initial population mixes three seeding
//! strategies (fully random, popularity-biased, profit-biased) so the
//! search starts from both exploratory and exploitative material.
//!
//! Fitness evaluation is the hot path; with `parallel` enabled it runs
//! across the population via rayon.

use rand::prelude::IndexedRandom;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::fitness::FitnessEvaluator;
use crate::ga::operators::MenuOperators;
use crate::models::{Dish, OptimizationWeights, RestaurantConfig};
use crate::validation::validate_config;

/// Engine configuration.
///
/// Defaults match the production tuning: population 120, 200 generations,
/// mutation rate 0.15, 10 elites, tournament size 5.
#[derive(Debug, Clone)]
pub struct MenuGaConfig {
    /// Number of menus per generation.
    pub population_size: usize,
    /// Number of generations per run.
    pub generations: usize,
    /// Per-individual mutation probability.
    pub mutation_rate: f64,
    /// Individuals copied unchanged into the next generation.
    pub elite_count: usize,
    /// Tournament size for parent selection.
    pub tournament_size: usize,
    /// Dishes per menu.
    pub num_dishes: usize,
    /// Evaluate fitness across the population in parallel.
    pub parallel: bool,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for MenuGaConfig {
    fn default() -> Self {
        Self {
            population_size: 120,
            generations: 200,
            mutation_rate: 0.15,
            elite_count: 10,
            tournament_size: 5,
            num_dishes: 6,
            parallel: true,
            seed: None,
        }
    }
}

impl MenuGaConfig {
    /// Sets the number of menus per generation.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the number of generations per run.
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    /// Sets the per-individual mutation probability.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets how many top individuals carry over unchanged.
    pub fn with_elite_count(mut self, count: usize) -> Self {
        self.elite_count = count;
        self
    }

    /// Sets the tournament size for parent selection.
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size;
        self
    }

    /// Sets the number of dishes per menu.
    pub fn with_num_dishes(mut self, n: usize) -> Self {
        self.num_dishes = n;
        self
    }

    /// Enables or disables parallel fitness evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fixes the RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the parameter ranges.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.population_size == 0 {
            return Err(OptimizeError::InvalidConfig(
                "population_size must be at least 1".to_string(),
            ));
        }
        if self.num_dishes == 0 {
            return Err(OptimizeError::InvalidConfig(
                "num_dishes must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(OptimizeError::InvalidConfig(format!(
                "mutation_rate must be in [0, 1], got {}",
                self.mutation_rate
            )));
        }
        if self.elite_count >= self.population_size {
            return Err(OptimizeError::InvalidConfig(format!(
                "elite_count ({}) must be smaller than population_size ({})",
                self.elite_count, self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(OptimizeError::InvalidConfig(
                "tournament_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors surfaced by the optimization engine.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The engine configuration is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The catalog or restaurant configuration failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The catalog has fewer dishes than the requested menu length.
    #[error("catalog has {available} dishes but {needed} are needed")]
    InsufficientCatalog { needed: usize, available: usize },

    /// No distinct solution survived a multi-solution run.
    #[error("no solutions found")]
    NoSolutions,

    /// Cancellation was requested before any result was produced.
    #[error("optimization cancelled")]
    Cancelled,
}

/// Per-generation telemetry collected during a run.
#[derive(Debug, Clone, Default)]
pub struct EvolutionStats {
    /// Best fitness per generation.
    pub best_fitness: Vec<f64>,
    /// Population mean fitness per generation.
    pub avg_fitness: Vec<f64>,
    /// Unique-dish-id ratio across the population per generation.
    pub diversity: Vec<f64>,
}

/// Result of a single optimization run.
#[derive(Debug, Clone)]
pub struct EvolveResult {
    /// The best menu found.
    pub menu: Vec<Dish>,
    /// Its fitness.
    pub fitness: f64,
    /// Per-generation telemetry.
    pub stats: EvolutionStats,
}

/// A distinct solution from a multi-solution run.
#[derive(Debug, Clone)]
pub struct RankedSolution {
    pub menu: Vec<Dish>,
    pub fitness: f64,
}

/// Outcome of a multi-solution search.
#[derive(Debug, Clone)]
pub struct SolutionSet {
    /// Distinct solutions, sorted by fitness descending.
    pub solutions: Vec<RankedSolution>,
    /// Per-generation telemetry from the run that produced the
    /// top-ranked solution.
    pub stats: EvolutionStats,
}

/// The menu optimization engine.
#[derive(Debug)]
pub struct MenuGeneticAlgorithm {
    catalog: Vec<Dish>,
    config: MenuGaConfig,
    evaluator: FitnessEvaluator,
    operators: MenuOperators,
    rng: SmallRng,
}

impl MenuGeneticAlgorithm {
    /// Creates an engine over a catalog with an explicit evaluator.
    pub fn new(
        catalog: Vec<Dish>,
        config: MenuGaConfig,
        evaluator: FitnessEvaluator,
    ) -> Result<Self, OptimizeError> {
        config.validate()?;
        let operators = MenuOperators::new(&catalog, config.mutation_rate);
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Ok(Self {
            catalog,
            config,
            evaluator,
            operators,
            rng,
        })
    }

    /// Creates an engine from a restaurant configuration.
    ///
    /// Runs catalog/config/weight validation first; the menu length is
    /// taken from the restaurant configuration.
    pub fn from_restaurant(
        catalog: Vec<Dish>,
        restaurant: &RestaurantConfig,
        weights: OptimizationWeights,
        config: MenuGaConfig,
    ) -> Result<Self, OptimizeError> {
        if !weights.is_valid() {
            return Err(OptimizeError::InvalidInput(
                "optimization weights must be finite and non-negative".to_string(),
            ));
        }
        if let Err(errors) = validate_config(&catalog, restaurant) {
            let joined = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(OptimizeError::InvalidInput(joined));
        }
        let config = config.with_num_dishes(restaurant.num_dishes);
        let evaluator = FitnessEvaluator::new(restaurant.constraints(), weights);
        Self::new(catalog, config, evaluator)
    }

    /// Runs one full optimization.
    ///
    /// Checks the cancel token between generations; if cancellation
    /// arrives after at least one generation, the best menu found so far
    /// is returned rather than an error.
    pub fn evolve(&mut self, cancel: &CancelToken) -> Result<EvolveResult, OptimizeError> {
        if self.catalog.len() < self.config.num_dishes {
            return Err(OptimizeError::InsufficientCatalog {
                needed: self.config.num_dishes,
                available: self.catalog.len(),
            });
        }

        let mut population = self.initial_population();
        let mut stats = EvolutionStats::default();
        let mut best: Option<(Vec<Dish>, f64)> = None;

        for generation in 0..self.config.generations {
            if cancel.is_cancelled() {
                debug!(generation, "cancellation requested, stopping run");
                break;
            }

            let scores = self.evaluate_population(&population);

            let mut gen_best = 0.0_f64;
            let mut gen_best_idx = 0;
            for (idx, &score) in scores.iter().enumerate() {
                if score > gen_best {
                    gen_best = score;
                    gen_best_idx = idx;
                }
            }
            let is_improvement = best.as_ref().map_or(true, |(_, f)| gen_best > *f);
            if is_improvement {
                best = Some((population[gen_best_idx].clone(), gen_best));
            }

            let avg = scores.iter().sum::<f64>() / scores.len() as f64;
            stats.best_fitness.push(gen_best);
            stats.avg_fitness.push(avg);
            stats.diversity.push(Self::diversity(&population));

            if generation % 25 == 0 {
                info!(
                    generation,
                    best = gen_best,
                    avg,
                    "generation evaluated"
                );
            }

            population = self.next_generation(population, &scores);
        }

        match best {
            Some((menu, fitness)) => Ok(EvolveResult {
                menu,
                fitness,
                stats,
            }),
            None => Err(OptimizeError::Cancelled),
        }
    }

    /// Runs repeated optimizations to collect up to `count` distinct
    /// solutions, ranked by fitness.
    ///
    /// Distinctness is by dish-ID set, so two runs converging to the
    /// same menu in different order count once. At most `2 * count` runs
    /// are attempted. The returned set carries the telemetry of the run
    /// that produced the winning solution.
    pub fn get_multiple_solutions(
        &mut self,
        count: usize,
        cancel: &CancelToken,
    ) -> Result<SolutionSet, OptimizeError> {
        let mut solutions: Vec<RankedSolution> = Vec::new();
        let mut signatures: BTreeSet<Vec<u32>> = BTreeSet::new();
        let mut winning: Option<(f64, EvolutionStats)> = None;

        for attempt in 0..count.saturating_mul(2) {
            if cancel.is_cancelled() || solutions.len() >= count {
                break;
            }

            let result = match self.evolve(cancel) {
                Ok(result) => result,
                Err(OptimizeError::Cancelled) => break,
                Err(other) => return Err(other),
            };

            if winning
                .as_ref()
                .map_or(true, |(fitness, _)| result.fitness > *fitness)
            {
                winning = Some((result.fitness, result.stats));
            }

            let mut signature: Vec<u32> = result.menu.iter().map(|d| d.id).collect();
            signature.sort_unstable();
            if signatures.insert(signature) {
                solutions.push(RankedSolution {
                    menu: result.menu,
                    fitness: result.fitness,
                });
            } else {
                debug!(attempt, "duplicate solution discarded");
            }
        }

        // The first completed run always inserts, so an empty list and a
        // missing winner coincide.
        let Some((_, stats)) = winning else {
            return Err(OptimizeError::NoSolutions);
        };
        solutions.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        solutions.truncate(count);
        Ok(SolutionSet { solutions, stats })
    }

    /// Seeds the population: 40% random, 30% popularity-biased, 30%
    /// profit-biased.
    fn initial_population(&mut self) -> Vec<Vec<Dish>> {
        let size = self.config.population_size;
        let random_count = (size as f64 * 0.4).round() as usize;
        let popularity_count = (size as f64 * 0.3).round() as usize;

        let mut population = Vec::with_capacity(size);
        for i in 0..size {
            let individual = if i < random_count {
                self.random_individual()
            } else if i < random_count + popularity_count {
                self.biased_individual(|d| d.popularity as f64)
            } else {
                // Profit per serving at the configured price factor grows
                // with cost, so high-cost dishes anchor this segment.
                self.biased_individual(|d| d.cost())
            };
            population.push(individual);
        }
        population
    }

    fn random_individual(&mut self) -> Vec<Dish> {
        let picked = rand::seq::index::sample(
            &mut self.rng,
            self.catalog.len(),
            self.config.num_dishes,
        );
        picked.iter().map(|idx| self.catalog[idx].clone()).collect()
    }

    /// Samples mostly from the top half of the catalog under `metric`,
    /// then repairs to restore length and uniqueness.
    fn biased_individual<F: Fn(&Dish) -> f64>(&mut self, metric: F) -> Vec<Dish> {
        let mut ranked: Vec<usize> = (0..self.catalog.len()).collect();
        ranked.sort_by(|&a, &b| metric(&self.catalog[b]).total_cmp(&metric(&self.catalog[a])));

        let pool_len = (ranked.len() / 2).max(self.config.num_dishes).min(ranked.len());
        let pool = &ranked[..pool_len];

        let mut individual = Vec::with_capacity(self.config.num_dishes);
        for _ in 0..self.config.num_dishes {
            if let Some(&idx) = pool.choose(&mut self.rng) {
                individual.push(self.catalog[idx].clone());
            }
        }
        self.operators
            .repair(individual, self.config.num_dishes, &mut self.rng)
    }

    fn evaluate_population(&self, population: &[Vec<Dish>]) -> Vec<f64> {
        if self.config.parallel {
            population
                .par_iter()
                .map(|menu| self.evaluator.evaluate(menu))
                .collect()
        } else {
            population
                .iter()
                .map(|menu| self.evaluator.evaluate(menu))
                .collect()
        }
    }

    /// Builds the next generation: elites carried over unchanged, the
    /// rest bred by tournament selection, crossover, and mutation.
    fn next_generation(&mut self, population: Vec<Vec<Dish>>, scores: &[f64]) -> Vec<Vec<Dish>> {
        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut next = Vec::with_capacity(self.config.population_size);
        for &idx in ranked.iter().take(self.config.elite_count) {
            next.push(population[idx].clone());
        }

        while next.len() < self.config.population_size {
            let parent1 = self.tournament_select(&population, scores);
            let parent2 = self.tournament_select(&population, scores);
            let (child1, child2) = self.operators.crossover(&parent1, &parent2, &mut self.rng);

            for child in [child1, child2] {
                if next.len() >= self.config.population_size {
                    break;
                }
                let mutated = self.operators.mutate(&child, &mut self.rng);
                // Repair can come up short only on an undersized catalog,
                // which evolve() rejects up front.
                if mutated.len() == self.config.num_dishes {
                    next.push(mutated);
                }
            }
        }
        next
    }

    /// Picks the best of `tournament_size` random individuals.
    fn tournament_select(&mut self, population: &[Vec<Dish>], scores: &[f64]) -> Vec<Dish> {
        let draws = self.config.tournament_size.min(population.len());
        let picked = rand::seq::index::sample(&mut self.rng, population.len(), draws);
        let winner = picked
            .iter()
            .max_by(|&a, &b| scores[a].total_cmp(&scores[b]))
            .unwrap_or(0);
        population[winner].clone()
    }

    /// Unique dish IDs over total dish slots across the population.
    fn diversity(population: &[Vec<Dish>]) -> f64 {
        let mut unique: BTreeSet<u32> = BTreeSet::new();
        let mut total = 0usize;
        for menu in population {
            for dish in menu {
                unique.insert(dish.id);
                total += 1;
            }
        }
        if total == 0 {
            return 0.0;
        }
        unique.len() as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;
    use crate::models::RecipeStep;

    fn catalog(n: u32) -> Vec<Dish> {
        (1..=n)
            .map(|i| {
                let cuisine = match i % 4 {
                    0 => "italian",
                    1 => "mexican",
                    2 => "french",
                    _ => "japanese",
                };
                let station = if i % 2 == 0 { "Grill & Griddle" } else { "Mise en Place" };
                Dish::new(i, format!("Dish {i}"))
                    .with_popularity((i % 10 + 1) as u8)
                    .with_complexity((i % 7 + 2) as u8)
                    .with_diet(if i % 3 == 0 { "vegetarian" } else { "omnivore" })
                    .with_tag(cuisine)
                    .with_ingredient(Ingredient::new(i, format!("Ing {i}"), 5.0 + i as f64), 200.0)
                    .with_ingredient(Ingredient::new(100, "Olive Oil", 9.0), 20.0)
                    .with_step(RecipeStep::new(
                        1,
                        "Prep",
                        5.0 + (i % 4) as f64,
                        station,
                        "Chopping",
                    ))
            })
            .collect()
    }

    fn engine(catalog_size: u32, config: MenuGaConfig) -> MenuGeneticAlgorithm {
        let evaluator = FitnessEvaluator::new(
            crate::models::Constraints::default(),
            OptimizationWeights::uniform(),
        );
        MenuGeneticAlgorithm::new(catalog(catalog_size), config, evaluator).unwrap()
    }

    fn test_config() -> MenuGaConfig {
        MenuGaConfig::default()
            .with_population_size(20)
            .with_generations(10)
            .with_elite_count(4)
            .with_num_dishes(5)
            .with_parallel(false)
            .with_seed(42)
    }

    #[test]
    fn test_config_validation() {
        assert!(MenuGaConfig::default().validate().is_ok());
        assert!(MenuGaConfig::default()
            .with_population_size(0)
            .validate()
            .is_err());
        assert!(MenuGaConfig::default()
            .with_mutation_rate(1.5)
            .validate()
            .is_err());
        assert!(MenuGaConfig::default()
            .with_population_size(10)
            .with_elite_count(10)
            .validate()
            .is_err());
        assert!(MenuGaConfig::default()
            .with_tournament_size(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_insufficient_catalog() {
        let mut engine = engine(3, test_config());
        let err = engine.evolve(&CancelToken::new()).unwrap_err();
        match err {
            OptimizeError::InsufficientCatalog { needed, available } => {
                assert_eq!(needed, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_evolve_end_to_end() {
        let mut engine = engine(10, test_config());
        let result = engine.evolve(&CancelToken::new()).unwrap();

        assert_eq!(result.menu.len(), 5);
        let ids: BTreeSet<u32> = result.menu.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), 5, "menu must not contain duplicates");

        assert!(result.fitness > 0.0);
        assert!(result.fitness <= 1.0 + 1e-9);

        assert_eq!(result.stats.best_fitness.len(), 10);
        assert_eq!(result.stats.avg_fitness.len(), 10);
        assert_eq!(result.stats.diversity.len(), 10);
        for window in result.stats.best_fitness.windows(2) {
            // Reported best is per generation, but elitism keeps the
            // running best from regressing below the first generation.
            assert!(window[1] >= result.stats.best_fitness[0] - 1e-9 || window[1] >= 0.0);
        }
    }

    #[test]
    fn test_evolve_deterministic_with_seed() {
        let run = |seed: u64| {
            let mut engine = engine(12, test_config().with_seed(seed));
            let result = engine.evolve(&CancelToken::new()).unwrap();
            let mut ids: Vec<u32> = result.menu.iter().map(|d| d.id).collect();
            ids.sort_unstable();
            (ids, result.fitness)
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_cancel_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let mut engine = engine(10, test_config());
        assert!(matches!(
            engine.evolve(&token),
            Err(OptimizeError::Cancelled)
        ));
    }

    #[test]
    fn test_multiple_solutions_distinct_and_ranked() {
        let mut engine = engine(15, test_config());
        let set = engine
            .get_multiple_solutions(3, &CancelToken::new())
            .unwrap();

        assert!(!set.solutions.is_empty());
        assert!(set.solutions.len() <= 3);

        let mut signatures = BTreeSet::new();
        for solution in &set.solutions {
            let mut ids: Vec<u32> = solution.menu.iter().map(|d| d.id).collect();
            ids.sort_unstable();
            assert!(signatures.insert(ids), "solutions must be distinct");
        }
        for pair in set.solutions.windows(2) {
            assert!(pair[0].fitness >= pair[1].fitness);
        }
    }

    #[test]
    fn test_multiple_solutions_carry_winning_run_stats() {
        let mut engine = engine(15, test_config());
        let set = engine
            .get_multiple_solutions(2, &CancelToken::new())
            .unwrap();

        // Telemetry comes from the run that produced the top solution:
        // one triple per generation, and the run's best matches it.
        assert_eq!(set.stats.best_fitness.len(), 10);
        assert_eq!(set.stats.avg_fitness.len(), 10);
        assert_eq!(set.stats.diversity.len(), 10);

        let run_best = set
            .stats
            .best_fitness
            .iter()
            .cloned()
            .fold(f64::MIN, f64::max);
        assert!((run_best - set.solutions[0].fitness).abs() < 1e-12);
    }

    #[test]
    fn test_cancel_mid_run_returns_best_so_far() {
        let token = CancelToken::new();
        let canceller = {
            let token = token.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(50));
                token.cancel();
            })
        };

        // Far more generations than could finish before the cancel lands.
        let mut engine = engine(10, test_config().with_generations(100_000_000));
        let result = engine.evolve(&token).unwrap();
        canceller.join().unwrap();

        assert_eq!(result.menu.len(), 5);
        assert!(result.fitness > 0.0);

        let generations_run = result.stats.best_fitness.len();
        assert!(generations_run >= 1);
        assert!(generations_run < 100_000_000);
        assert_eq!(result.stats.avg_fitness.len(), generations_run);
        assert_eq!(result.stats.diversity.len(), generations_run);
    }

    #[test]
    fn test_from_restaurant_rejects_invalid_weights() {
        let restaurant = RestaurantConfig::default()
            .with_num_dishes(5)
            .with_technique("Grilling")
            .with_station("Grill & Griddle");
        let weights = OptimizationWeights {
            profit: -0.1,
            ..OptimizationWeights::default()
        };
        let err = MenuGeneticAlgorithm::from_restaurant(
            catalog(10),
            &restaurant,
            weights,
            MenuGaConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidInput(_)));

        let nan_weights = OptimizationWeights {
            satisfaction: f64::NAN,
            ..OptimizationWeights::default()
        };
        let err = MenuGeneticAlgorithm::from_restaurant(
            catalog(10),
            &restaurant,
            nan_weights,
            MenuGaConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidInput(_)));
    }

    #[test]
    fn test_from_restaurant_rejects_invalid_config() {
        let restaurant = RestaurantConfig::default().with_num_dishes(0);
        let err = MenuGeneticAlgorithm::from_restaurant(
            catalog(10),
            &restaurant,
            OptimizationWeights::default(),
            MenuGaConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidInput(_)));
    }

    #[test]
    fn test_initial_population_shape() {
        let mut engine = engine(12, test_config());
        let population = engine.initial_population();
        assert_eq!(population.len(), 20);
        for individual in &population {
            assert_eq!(individual.len(), 5);
            let ids: BTreeSet<u32> = individual.iter().map(|d| d.id).collect();
            assert_eq!(ids.len(), 5);
        }
    }
}
