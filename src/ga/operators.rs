//! Genetic operators for menu individuals.
//!
//! A menu individual is a fixed-length, duplicate-free sequence of catalog
//! dishes. Operators pick a concrete strategy uniformly at random per
//! call; every crossover and mutation is followed by a repair pass that
//! restores the fixed-length, no-duplicate invariant.
//!
//! # Strategies
//!
//! - **Crossover**: uniform, single-point, cuisine-aware, balance-aware
//! - **Mutation**: random-replacement, smart-replacement, swap,
//!   cuisine-consistent
//!
//! Cuisine- and similarity-aware strategies fall back to the simpler
//! strategies when no suitable replacement exists in the catalog.

use std::collections::{HashMap, HashSet};

use rand::prelude::IndexedRandom;
use rand::Rng;

use crate::models::Dish;

/// Catalog-parameterized genetic operators.
///
/// Owns an indexed copy of the catalog so that smart strategies can look
/// up dishes by cuisine, diet, and complexity without rescanning.
#[derive(Debug, Clone)]
pub struct MenuOperators {
    catalog: Vec<Dish>,
    mutation_rate: f64,
    by_cuisine: HashMap<&'static str, Vec<usize>>,
    by_diet: HashMap<String, Vec<usize>>,
    /// Catalog indices per complexity level 1-10 (slot 0 unused).
    by_complexity: Vec<Vec<usize>>,
}

impl MenuOperators {
    /// Creates operators over the given catalog.
    pub fn new(catalog: &[Dish], mutation_rate: f64) -> Self {
        let mut by_cuisine: HashMap<&'static str, Vec<usize>> = HashMap::new();
        let mut by_diet: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_complexity: Vec<Vec<usize>> = vec![Vec::new(); 11];

        for (idx, dish) in catalog.iter().enumerate() {
            if let Some(cuisine) = dish.cuisine() {
                by_cuisine.entry(cuisine).or_default().push(idx);
            }
            by_diet.entry(dish.diet_type.clone()).or_default().push(idx);
            let level = dish.complexity.clamp(1, 10) as usize;
            by_complexity[level].push(idx);
        }

        Self {
            catalog: catalog.to_vec(),
            mutation_rate: mutation_rate.clamp(0.0, 1.0),
            by_cuisine,
            by_diet,
            by_complexity,
        }
    }

    /// The configured mutation rate.
    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    /// Crosses two parent menus, producing two repaired offspring.
    ///
    /// The strategy is chosen uniformly at random per call.
    pub fn crossover<R: Rng>(
        &self,
        parent1: &[Dish],
        parent2: &[Dish],
        rng: &mut R,
    ) -> (Vec<Dish>, Vec<Dish>) {
        if parent1.is_empty() || parent2.is_empty() {
            return (parent1.to_vec(), parent2.to_vec());
        }

        let (child1, child2) = match rng.random_range(0..4) {
            0 => self.uniform_crossover(parent1, parent2, rng),
            1 => self.single_point_crossover(parent1, parent2, rng),
            2 => self.cuisine_aware_crossover(parent1, parent2, rng),
            _ => self.balance_aware_crossover(parent1, parent2, rng),
        };

        (
            self.repair(child1, parent1.len(), rng),
            self.repair(child2, parent2.len(), rng),
        )
    }

    /// Mutates a menu with probability `mutation_rate`, returning a
    /// repaired copy (or a plain copy when no mutation fires).
    pub fn mutate<R: Rng>(&self, individual: &[Dish], rng: &mut R) -> Vec<Dish> {
        if individual.is_empty() || rng.random::<f64>() >= self.mutation_rate {
            return individual.to_vec();
        }

        let mut mutated = individual.to_vec();
        match rng.random_range(0..4) {
            0 => self.random_replacement(&mut mutated, rng),
            1 => self.smart_replacement(&mut mutated, rng),
            2 => Self::swap_positions(&mut mutated, rng),
            _ => self.cuisine_consistent(&mut mutated, rng),
        }
        self.repair(mutated, individual.len(), rng)
    }

    /// Removes duplicate dish IDs (keeping first occurrences), refills
    /// from the catalog up to `target_len`, then truncates.
    ///
    /// The result is shorter than `target_len` only when the catalog
    /// itself has fewer than `target_len` dishes.
    pub fn repair<R: Rng>(
        &self,
        individual: Vec<Dish>,
        target_len: usize,
        rng: &mut R,
    ) -> Vec<Dish> {
        let mut seen: HashSet<u32> = HashSet::new();
        let mut unique: Vec<Dish> = Vec::with_capacity(target_len);
        for dish in individual {
            if seen.insert(dish.id) {
                unique.push(dish);
            }
        }

        while unique.len() < target_len {
            let available: Vec<&Dish> = self
                .catalog
                .iter()
                .filter(|d| !seen.contains(&d.id))
                .collect();
            match available.choose(rng) {
                Some(dish) => {
                    seen.insert(dish.id);
                    unique.push((*dish).clone());
                }
                None => break,
            }
        }

        unique.truncate(target_len);
        unique
    }

    // ---- crossover strategies ----

    /// Each position inherited from either parent with equal probability.
    fn uniform_crossover<R: Rng>(
        &self,
        parent1: &[Dish],
        parent2: &[Dish],
        rng: &mut R,
    ) -> (Vec<Dish>, Vec<Dish>) {
        let len = parent1.len().min(parent2.len());
        let mut child1 = Vec::with_capacity(len);
        let mut child2 = Vec::with_capacity(len);
        for i in 0..len {
            if rng.random_bool(0.5) {
                child1.push(parent1[i].clone());
                child2.push(parent2[i].clone());
            } else {
                child1.push(parent2[i].clone());
                child2.push(parent1[i].clone());
            }
        }
        (child1, child2)
    }

    /// Swaps the tails after a random cut point.
    fn single_point_crossover<R: Rng>(
        &self,
        parent1: &[Dish],
        parent2: &[Dish],
        rng: &mut R,
    ) -> (Vec<Dish>, Vec<Dish>) {
        let len = parent1.len().min(parent2.len());
        if len <= 1 {
            return (parent1.to_vec(), parent2.to_vec());
        }
        let point = rng.random_range(1..len);
        let child1 = [&parent1[..point], &parent2[point..]].concat();
        let child2 = [&parent2[..point], &parent1[point..]].concat();
        (child1, child2)
    }

    /// Exchanges positions only when the dishes share a cuisine (or with
    /// a 30% escape probability), keeping cuisines otherwise grouped.
    fn cuisine_aware_crossover<R: Rng>(
        &self,
        parent1: &[Dish],
        parent2: &[Dish],
        rng: &mut R,
    ) -> (Vec<Dish>, Vec<Dish>) {
        let len = parent1.len().min(parent2.len());
        let mut child1 = Vec::with_capacity(len);
        let mut child2 = Vec::with_capacity(len);

        for i in 0..len {
            let compatible = parent1[i].cuisine() == parent2[i].cuisine();
            if compatible || rng.random::<f64>() < 0.3 {
                if rng.random_bool(0.5) {
                    child1.push(parent1[i].clone());
                    child2.push(parent2[i].clone());
                } else {
                    child1.push(parent2[i].clone());
                    child2.push(parent1[i].clone());
                }
            } else {
                child1.push(parent1[i].clone());
                child2.push(parent2[i].clone());
            }
        }
        (child1, child2)
    }

    /// Biases inheritance 0.7/0.3 toward the better-balanced parent.
    fn balance_aware_crossover<R: Rng>(
        &self,
        parent1: &[Dish],
        parent2: &[Dish],
        rng: &mut R,
    ) -> (Vec<Dish>, Vec<Dish>) {
        let balance1 = menu_balance(parent1);
        let balance2 = menu_balance(parent2);
        let prob_parent1 = if balance1 > balance2 {
            0.7
        } else if balance2 > balance1 {
            0.3
        } else {
            0.5
        };

        let len = parent1.len().min(parent2.len());
        let mut child1 = Vec::with_capacity(len);
        let mut child2 = Vec::with_capacity(len);
        for i in 0..len {
            if rng.random::<f64>() < prob_parent1 {
                child1.push(parent1[i].clone());
                child2.push(parent2[i].clone());
            } else {
                child1.push(parent2[i].clone());
                child2.push(parent1[i].clone());
            }
        }
        (child1, child2)
    }

    // ---- mutation strategies ----

    /// Replaces one random slot with a random catalog dish, retrying up
    /// to 10 times to avoid duplicates.
    fn random_replacement<R: Rng>(&self, individual: &mut [Dish], rng: &mut R) {
        if self.catalog.is_empty() {
            return;
        }
        let slot = rng.random_range(0..individual.len());
        let present: HashSet<u32> = individual.iter().map(|d| d.id).collect();

        for _ in 0..10 {
            let candidate = &self.catalog[rng.random_range(0..self.catalog.len())];
            if !present.contains(&candidate.id) {
                individual[slot] = candidate.clone();
                return;
            }
        }
    }

    /// Replaces one slot with a dish similar to the one removed
    /// (shared cuisine, diet, or complexity within ±1).
    fn smart_replacement<R: Rng>(&self, individual: &mut [Dish], rng: &mut R) {
        if self.catalog.is_empty() {
            return;
        }
        let slot = rng.random_range(0..individual.len());
        let present: HashSet<u32> = individual.iter().map(|d| d.id).collect();

        let candidates: Vec<usize> = self
            .similar_dishes(&individual[slot])
            .into_iter()
            .filter(|&idx| !present.contains(&self.catalog[idx].id))
            .collect();

        match candidates.choose(rng) {
            Some(&idx) => individual[slot] = self.catalog[idx].clone(),
            None => self.random_replacement(individual, rng),
        }
    }

    /// Exchanges two random positions; no catalog lookup.
    fn swap_positions<R: Rng>(individual: &mut [Dish], rng: &mut R) {
        if individual.len() < 2 {
            return;
        }
        let picked = rand::seq::index::sample(rng, individual.len(), 2);
        individual.swap(picked.index(0), picked.index(1));
    }

    /// Replaces one slot with a same-cuisine dish, falling back to smart
    /// replacement when the cuisine group is exhausted.
    fn cuisine_consistent<R: Rng>(&self, individual: &mut [Dish], rng: &mut R) {
        let slot = rng.random_range(0..individual.len());
        let present: HashSet<u32> = individual.iter().map(|d| d.id).collect();

        if let Some(cuisine) = individual[slot].cuisine() {
            if let Some(group) = self.by_cuisine.get(cuisine) {
                let candidates: Vec<usize> = group
                    .iter()
                    .copied()
                    .filter(|&idx| !present.contains(&self.catalog[idx].id))
                    .collect();
                if let Some(&idx) = candidates.choose(rng) {
                    individual[slot] = self.catalog[idx].clone();
                    return;
                }
            }
        }
        self.smart_replacement(individual, rng);
    }

    /// Catalog indices of dishes sharing cuisine, diet, or complexity ±1
    /// with the given dish, excluding the dish itself.
    fn similar_dishes(&self, dish: &Dish) -> Vec<usize> {
        let mut seen: HashSet<u32> = HashSet::new();
        seen.insert(dish.id);
        let mut similar = Vec::new();

        let mut push_all = |indices: &[usize], similar: &mut Vec<usize>, seen: &mut HashSet<u32>| {
            for &idx in indices {
                if seen.insert(self.catalog[idx].id) {
                    similar.push(idx);
                }
            }
        };

        if let Some(cuisine) = dish.cuisine() {
            if let Some(group) = self.by_cuisine.get(cuisine) {
                push_all(group, &mut similar, &mut seen);
            }
        }
        if let Some(group) = self.by_diet.get(&dish.diet_type) {
            push_all(group, &mut similar, &mut seen);
        }
        let complexity = dish.complexity.clamp(1, 10) as usize;
        for level in complexity.saturating_sub(1).max(1)..=(complexity + 1).min(10) {
            push_all(&self.by_complexity[level], &mut similar, &mut seen);
        }

        similar
    }
}

/// Balance metric used by the balance-aware crossover: mean of complexity
/// evenness, average popularity, and diet-type diversity.
fn menu_balance(menu: &[Dish]) -> f64 {
    if menu.is_empty() {
        return 0.0;
    }

    let complexities: Vec<f64> = menu.iter().map(|d| d.complexity as f64).collect();
    let mean = complexities.iter().sum::<f64>() / complexities.len() as f64;
    let std = (complexities
        .iter()
        .map(|c| (c - mean) * (c - mean))
        .sum::<f64>()
        / complexities.len() as f64)
        .sqrt();
    let complexity_balance = (1.0 - std / 3.0).max(0.0);

    let popularity_avg =
        menu.iter().map(|d| d.popularity as f64).sum::<f64>() / menu.len() as f64;
    let popularity_balance = popularity_avg / 10.0;

    let mut diets: Vec<&str> = menu.iter().map(|d| d.diet_type.as_str()).collect();
    diets.sort_unstable();
    diets.dedup();
    let diet_diversity = diets.len() as f64 / menu.len() as f64;

    (complexity_balance + popularity_balance + diet_diversity) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn catalog(n: u32) -> Vec<Dish> {
        (1..=n)
            .map(|i| {
                let cuisine = match i % 3 {
                    0 => "italian",
                    1 => "mexican",
                    _ => "japanese",
                };
                Dish::new(i, format!("Dish {i}"))
                    .with_popularity((i % 10 + 1) as u8)
                    .with_complexity((i % 10 + 1) as u8)
                    .with_diet(if i % 2 == 0 { "vegetarian" } else { "omnivore" })
                    .with_tag(cuisine)
            })
            .collect()
    }

    fn has_no_duplicates(menu: &[Dish]) -> bool {
        let ids: HashSet<u32> = menu.iter().map(|d| d.id).collect();
        ids.len() == menu.len()
    }

    #[test]
    fn test_repair_removes_duplicates_and_fixes_length() {
        let cat = catalog(12);
        let ops = MenuOperators::new(&cat, 0.15);
        let mut rng = SmallRng::seed_from_u64(42);

        let broken = vec![
            cat[0].clone(),
            cat[0].clone(),
            cat[1].clone(),
            cat[1].clone(),
        ];
        let repaired = ops.repair(broken, 4, &mut rng);
        assert_eq!(repaired.len(), 4);
        assert!(has_no_duplicates(&repaired));
    }

    #[test]
    fn test_repair_truncates_oversized() {
        let cat = catalog(12);
        let ops = MenuOperators::new(&cat, 0.15);
        let mut rng = SmallRng::seed_from_u64(42);

        let oversized: Vec<Dish> = cat[..8].to_vec();
        let repaired = ops.repair(oversized, 3, &mut rng);
        assert_eq!(repaired.len(), 3);
        // Keep-first order preserved
        assert_eq!(repaired[0].id, cat[0].id);
    }

    #[test]
    fn test_repair_capped_by_catalog_size() {
        let cat = catalog(3);
        let ops = MenuOperators::new(&cat, 0.15);
        let mut rng = SmallRng::seed_from_u64(42);

        let repaired = ops.repair(vec![cat[0].clone()], 10, &mut rng);
        assert_eq!(repaired.len(), 3);
        assert!(has_no_duplicates(&repaired));
    }

    #[test]
    fn test_crossover_preserves_length_and_uniqueness() {
        let cat = catalog(20);
        let ops = MenuOperators::new(&cat, 0.15);
        let mut rng = SmallRng::seed_from_u64(42);

        let p1: Vec<Dish> = cat[..6].to_vec();
        let p2: Vec<Dish> = cat[6..12].to_vec();

        for _ in 0..50 {
            let (c1, c2) = ops.crossover(&p1, &p2, &mut rng);
            assert_eq!(c1.len(), 6);
            assert_eq!(c2.len(), 6);
            assert!(has_no_duplicates(&c1));
            assert!(has_no_duplicates(&c2));
        }
    }

    #[test]
    fn test_crossover_empty_parent_passthrough() {
        let cat = catalog(6);
        let ops = MenuOperators::new(&cat, 0.15);
        let mut rng = SmallRng::seed_from_u64(42);

        let (c1, c2) = ops.crossover(&[], &cat[..3], &mut rng);
        assert!(c1.is_empty());
        assert_eq!(c2.len(), 3);
    }

    #[test]
    fn test_mutation_rate_zero_is_identity() {
        let cat = catalog(12);
        let ops = MenuOperators::new(&cat, 0.0);
        let mut rng = SmallRng::seed_from_u64(42);

        let individual: Vec<Dish> = cat[..5].to_vec();
        let mutated = ops.mutate(&individual, &mut rng);
        let original_ids: Vec<u32> = individual.iter().map(|d| d.id).collect();
        let mutated_ids: Vec<u32> = mutated.iter().map(|d| d.id).collect();
        assert_eq!(original_ids, mutated_ids);
    }

    #[test]
    fn test_mutation_preserves_invariants() {
        let cat = catalog(20);
        let ops = MenuOperators::new(&cat, 1.0);
        let mut rng = SmallRng::seed_from_u64(42);

        let individual: Vec<Dish> = cat[..6].to_vec();
        for _ in 0..100 {
            let mutated = ops.mutate(&individual, &mut rng);
            assert_eq!(mutated.len(), 6);
            assert!(has_no_duplicates(&mutated));
        }
    }

    #[test]
    fn test_mutation_eventually_changes_menu() {
        let cat = catalog(20);
        let ops = MenuOperators::new(&cat, 1.0);
        let mut rng = SmallRng::seed_from_u64(42);

        let individual: Vec<Dish> = cat[..6].to_vec();
        let original_ids: Vec<u32> = individual.iter().map(|d| d.id).collect();
        let changed = (0..50).any(|_| {
            let ids: Vec<u32> = ops
                .mutate(&individual, &mut rng)
                .iter()
                .map(|d| d.id)
                .collect();
            ids != original_ids
        });
        assert!(changed, "mutation at rate 1.0 should alter the menu");
    }

    #[test]
    fn test_similar_dishes_excludes_self() {
        let cat = catalog(12);
        let ops = MenuOperators::new(&cat, 0.15);
        let similar = ops.similar_dishes(&cat[0]);
        assert!(!similar.iter().any(|&idx| cat[idx].id == cat[0].id));
        assert!(!similar.is_empty());
    }

    #[test]
    fn test_menu_balance_prefers_even_complexity() {
        let even: Vec<Dish> = (1..=3)
            .map(|i| Dish::new(i, "D").with_complexity(5).with_popularity(8))
            .collect();
        let uneven = vec![
            Dish::new(1, "D").with_complexity(1).with_popularity(8),
            Dish::new(2, "D").with_complexity(10).with_popularity(8),
            Dish::new(3, "D").with_complexity(5).with_popularity(8),
        ];
        assert!(menu_balance(&even) > menu_balance(&uneven));
        assert_eq!(menu_balance(&[]), 0.0);
    }
}
