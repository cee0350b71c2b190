//! Multi-objective menu fitness evaluation.
//!
//! Maps a candidate menu to a scalar fitness: a weighted sum of seven
//! sub-scores, each normalized to approximately `[0, 1]`, minus penalties
//! for hard-constraint violations. The evaluator is a pure function of
//! its inputs — no randomness, no shared state — so population-wide
//! evaluation parallelizes trivially.
//!
//! # Objectives
//!
//! 1. Profit margin against the configured target
//! 2. Average preparation time (quadratic penalty past the optimum)
//! 3. Nutrition balance (diet diversity + complexity spread)
//! 4. Gastronomic variety (tag and cuisine diversity)
//! 5. Ingredient reuse efficiency
//! 6. Workload distribution across stations
//! 7. Projected customer satisfaction

use std::collections::HashMap;
use tracing::trace;

use crate::models::{Constraints, Dish, OptimizationWeights, CUISINE_TAGS};

/// Reference margin (percent) that maps to a full profit score.
const MAX_PROFIT_MARGIN: f64 = 80.0;
/// Average prep time (minutes) considered optimal.
const OPTIMAL_PREP_TIME_MIN: f64 = 20.0;
/// Popularity scale ceiling.
const MAX_POPULARITY: f64 = 10.0;
/// Station count that maps to full station diversity.
const MAX_STATIONS: f64 = 10.0;
/// Unique-ingredient count past which the efficiency bonus vanishes.
const MAX_UNIQUE_INGREDIENTS: f64 = 50.0;

/// Evaluates menus against restaurant constraints and objective weights.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    constraints: Constraints,
    weights: OptimizationWeights,
}

impl FitnessEvaluator {
    /// Creates an evaluator for the given constraints and weights.
    pub fn new(constraints: Constraints, weights: OptimizationWeights) -> Self {
        Self {
            constraints,
            weights,
        }
    }

    /// Evaluates a menu. Returns `0.0` for an empty menu; never negative.
    pub fn evaluate(&self, menu: &[Dish]) -> f64 {
        if menu.is_empty() {
            return 0.0;
        }

        let profit = self.profit_score(menu);
        let time = self.time_efficiency_score(menu);
        let nutrition = self.nutrition_balance_score(menu);
        let variety = self.variety_score(menu);
        let ingredients = self.ingredient_efficiency_score(menu);
        let workload = self.workload_distribution_score(menu);
        let satisfaction = self.satisfaction_score(menu);

        let weighted = profit * self.weights.profit
            + time * self.weights.time
            + nutrition * self.weights.nutrition
            + variety * self.weights.variety
            + ingredients * self.weights.ingredient_efficiency
            + workload * self.weights.workload_distribution
            + satisfaction * self.weights.satisfaction;

        let penalty = self.constraint_penalties(menu);

        trace!(
            profit,
            time,
            nutrition,
            variety,
            ingredients,
            workload,
            satisfaction,
            penalty,
            "fitness components"
        );

        (weighted - penalty).max(0.0)
    }

    /// Profit margin of the whole menu against the configured target.
    fn profit_score(&self, menu: &[Dish]) -> f64 {
        let total_cost: f64 = menu.iter().map(|d| d.cost()).sum();
        let total_revenue = total_cost * self.constraints.price_factor;
        if total_revenue == 0.0 {
            return 0.0;
        }

        let margin = (total_revenue - total_cost) / total_revenue * 100.0;
        let target = self.constraints.min_profit_margin;
        if margin >= target {
            (margin / MAX_PROFIT_MARGIN).min(1.0)
        } else if target > 0.0 {
            // Steep penalty below the minimum margin
            margin / target * 0.5
        } else {
            0.0
        }
    }

    /// Full score at or below the optimal average prep time, quadratic
    /// penalty beyond it.
    fn time_efficiency_score(&self, menu: &[Dish]) -> f64 {
        let avg: f64 = menu.iter().map(|d| d.prep_time_min()).sum::<f64>() / menu.len() as f64;
        if avg <= OPTIMAL_PREP_TIME_MIN {
            1.0
        } else {
            let excess = (avg - OPTIMAL_PREP_TIME_MIN) / OPTIMAL_PREP_TIME_MIN;
            (1.0 - excess * excess).max(0.0)
        }
    }

    /// Diet-type diversity plus complexity spread.
    fn nutrition_balance_score(&self, menu: &[Dish]) -> f64 {
        let mut diets: Vec<&str> = menu.iter().map(|d| d.diet_type.as_str()).collect();
        let complexities: Vec<f64> = menu.iter().map(|d| d.complexity as f64).collect();

        diets.sort_unstable();
        diets.dedup();
        let diet_diversity = diets.len() as f64 / menu.len() as f64;

        let complexity_balance = if complexities.len() > 1 {
            (1.0 - std_dev(&complexities) / 3.0).clamp(0.0, 1.0)
        } else {
            0.5
        };

        diet_diversity * 0.6 + complexity_balance * 0.4
    }

    /// Tag diversity plus cuisine diversity against the fixed vocabulary.
    fn variety_score(&self, menu: &[Dish]) -> f64 {
        let mut tags: Vec<String> = Vec::new();
        let mut cuisines: Vec<&str> = Vec::new();

        for dish in menu {
            for tag in &dish.tags {
                let normalized = tag.trim().to_lowercase();
                if let Some(cuisine) = CUISINE_TAGS.iter().find(|c| normalized == **c) {
                    cuisines.push(cuisine);
                }
                tags.push(normalized);
            }
        }

        tags.sort_unstable();
        tags.dedup();
        cuisines.sort_unstable();
        cuisines.dedup();

        let tag_diversity = (tags.len() as f64 / 10.0).min(1.0);
        let cuisine_diversity = (cuisines.len() as f64 / 3.0).min(1.0);

        tag_diversity * 0.6 + cuisine_diversity * 0.4
    }

    /// Rewards ingredients shared across dishes and small total inventories.
    fn ingredient_efficiency_score(&self, menu: &[Dish]) -> f64 {
        let mut usage: HashMap<u32, usize> = HashMap::new();
        let mut total = 0usize;
        for dish in menu {
            for item in &dish.recipe {
                *usage.entry(item.ingredient.id).or_insert(0) += 1;
                total += 1;
            }
        }
        if total == 0 || usage.is_empty() {
            return 0.0;
        }

        let reused = usage.values().filter(|&&count| count > 1).count() as f64;
        let unique = usage.len() as f64;
        let reuse_ratio = reused / unique;
        let inventory_bonus = (1.0 - unique / MAX_UNIQUE_INGREDIENTS).max(0.0);

        (reuse_ratio * 0.7 + inventory_bonus * 0.3).min(1.0)
    }

    /// Even spread of step time across stations plus station diversity.
    ///
    /// A single-station menu scores zero on the distribution term.
    fn workload_distribution_score(&self, menu: &[Dish]) -> f64 {
        let mut station_time: HashMap<&str, f64> = HashMap::new();
        for dish in menu {
            for step in &dish.steps {
                if !step.station.is_empty() {
                    *station_time.entry(step.station.as_str()).or_insert(0.0) +=
                        step.duration_min;
                }
            }
        }
        if station_time.is_empty() {
            // Neutral score without station information
            return 0.5;
        }

        let times: Vec<f64> = station_time.values().copied().collect();
        let distribution = if times.len() > 1 {
            let max_time = times.iter().cloned().fold(f64::MIN, f64::max);
            let max_variance = max_time * max_time / 4.0;
            if max_variance > 0.0 {
                (1.0 - variance(&times) / max_variance).max(0.0)
            } else {
                0.0
            }
        } else {
            0.0
        };

        let diversity = (station_time.len() as f64 / MAX_STATIONS).min(1.0);
        distribution * 0.7 + diversity * 0.3
    }

    /// Average popularity minus a spread penalty.
    fn satisfaction_score(&self, menu: &[Dish]) -> f64 {
        let popularities: Vec<f64> = menu.iter().map(|d| d.popularity as f64).collect();
        let avg = popularities.iter().sum::<f64>() / popularities.len() as f64;

        let variance_penalty = if popularities.len() > 1 {
            (std_dev(&popularities) / 5.0).min(0.3)
        } else {
            0.0
        };

        (avg / MAX_POPULARITY - variance_penalty).clamp(0.0, 1.0)
    }

    /// Additive, uncapped penalties for hard-constraint violations.
    fn constraint_penalties(&self, menu: &[Dish]) -> f64 {
        let mut penalty = 0.0;

        let max_cost = self.constraints.max_cost_per_dish;
        if max_cost.is_finite() && max_cost > 0.0 {
            for dish in menu {
                if dish.cost() > max_cost {
                    penalty += (dish.cost() - max_cost) / max_cost * 0.5;
                }
            }
        }

        let min_margin = self.constraints.min_profit_margin;
        let total_cost: f64 = menu.iter().map(|d| d.cost()).sum();
        let total_revenue = total_cost * self.constraints.price_factor;
        if total_revenue > 0.0 && min_margin > 0.0 {
            let actual = (total_revenue - total_cost) / total_revenue * 100.0;
            if actual < min_margin {
                penalty += (min_margin - actual) / min_margin * 0.3;
            }
        }

        penalty
    }
}

/// Population variance.
fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}
