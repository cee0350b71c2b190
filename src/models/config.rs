//! Restaurant configuration, optimization constraints, and objective weights.
//!
//! These records are the external input contract: the catalog/config
//! collaborator fills them in, the optimizer and the workflow manager
//! consume them read-only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Season;

/// Establishment classification.
///
/// Drives chef skill tiers and the workflow assignment strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EstablishmentType {
    #[default]
    Casual,
    Upscale,
    FastFood,
}

/// Hard and contextual constraints for menu optimization.
///
/// `season` and `establishment_type` are consumed by the external catalog
/// filtering stage and the workflow manager; the fitness evaluator uses
/// only the pricing fields for penalty computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraints {
    /// Menu price = dish cost × this factor.
    pub price_factor: f64,
    /// Minimum acceptable profit margin, in percent.
    pub min_profit_margin: f64,
    /// Maximum allowed production cost per dish.
    pub max_cost_per_dish: f64,
    /// Season the menu targets.
    pub season: Season,
    /// Establishment classification.
    pub establishment_type: EstablishmentType,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            price_factor: 1.5,
            min_profit_margin: 40.0,
            max_cost_per_dish: f64::INFINITY,
            season: Season::AllYear,
            establishment_type: EstablishmentType::Casual,
        }
    }
}

impl Constraints {
    pub fn with_price_factor(mut self, factor: f64) -> Self {
        self.price_factor = factor;
        self
    }

    pub fn with_min_profit_margin(mut self, percent: f64) -> Self {
        self.min_profit_margin = percent;
        self
    }

    pub fn with_max_cost_per_dish(mut self, max_cost: f64) -> Self {
        self.max_cost_per_dish = max_cost;
        self
    }
}

/// Weights for the seven optimization objectives.
///
/// Weights must be non-negative but need not sum to 1; every sub-score is
/// normalized to `[0, 1]` before weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationWeights {
    pub profit: f64,
    pub time: f64,
    pub nutrition: f64,
    pub variety: f64,
    pub ingredient_efficiency: f64,
    pub workload_distribution: f64,
    pub satisfaction: f64,
}

impl Default for OptimizationWeights {
    fn default() -> Self {
        Self {
            profit: 0.25,
            time: 0.15,
            nutrition: 0.10,
            variety: 0.15,
            ingredient_efficiency: 0.15,
            workload_distribution: 0.10,
            satisfaction: 0.10,
        }
    }
}

impl OptimizationWeights {
    /// All seven objectives weighted equally at `1/7`.
    pub fn uniform() -> Self {
        let w = 1.0 / 7.0;
        Self {
            profit: w,
            time: w,
            nutrition: w,
            variety: w,
            ingredient_efficiency: w,
            workload_distribution: w,
            satisfaction: w,
        }
    }

    /// Whether every weight is non-negative and finite.
    pub fn is_valid(&self) -> bool {
        [
            self.profit,
            self.time,
            self.nutrition,
            self.variety,
            self.ingredient_efficiency,
            self.workload_distribution,
            self.satisfaction,
        ]
        .iter()
        .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Restaurant configuration record.
///
/// Collects everything the optimizer and workflow manager need about the
/// establishment: menu size, pricing policy, staffing, and the technique
/// and station inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantConfig {
    /// Number of dishes per menu (fixed individual length for a GA run).
    pub num_dishes: usize,
    /// Maximum allowed production cost per dish.
    pub max_cost_per_dish: f64,
    /// Number of chefs available.
    pub num_chefs: usize,
    /// Minimum acceptable profit margin, in percent.
    pub min_profit_margin: f64,
    /// Menu price = dish cost × this factor.
    pub price_factor: f64,
    /// Season the menu targets.
    pub season: Season,
    /// Establishment classification.
    pub establishment_type: EstablishmentType,
    /// Techniques the kitchen staff can cover.
    pub available_techniques: BTreeSet<String>,
    /// Stations the kitchen has.
    pub available_stations: BTreeSet<String>,
}

impl Default for RestaurantConfig {
    fn default() -> Self {
        Self {
            num_dishes: 6,
            max_cost_per_dish: f64::INFINITY,
            num_chefs: 4,
            min_profit_margin: 40.0,
            price_factor: 1.5,
            season: Season::AllYear,
            establishment_type: EstablishmentType::Casual,
            available_techniques: BTreeSet::new(),
            available_stations: BTreeSet::new(),
        }
    }
}

impl RestaurantConfig {
    pub fn with_num_dishes(mut self, n: usize) -> Self {
        self.num_dishes = n;
        self
    }

    pub fn with_max_cost_per_dish(mut self, max_cost: f64) -> Self {
        self.max_cost_per_dish = max_cost;
        self
    }

    pub fn with_num_chefs(mut self, n: usize) -> Self {
        self.num_chefs = n;
        self
    }

    pub fn with_min_profit_margin(mut self, percent: f64) -> Self {
        self.min_profit_margin = percent;
        self
    }

    pub fn with_price_factor(mut self, factor: f64) -> Self {
        self.price_factor = factor;
        self
    }

    pub fn with_season(mut self, season: Season) -> Self {
        self.season = season;
        self
    }

    pub fn with_establishment(mut self, establishment_type: EstablishmentType) -> Self {
        self.establishment_type = establishment_type;
        self
    }

    pub fn with_technique(mut self, technique: impl Into<String>) -> Self {
        self.available_techniques.insert(technique.into());
        self
    }

    pub fn with_station(mut self, station: impl Into<String>) -> Self {
        self.available_stations.insert(station.into());
        self
    }

    /// Derives the evaluator-facing constraint record.
    pub fn constraints(&self) -> Constraints {
        Constraints {
            price_factor: self.price_factor,
            min_profit_margin: self.min_profit_margin,
            max_cost_per_dish: self.max_cost_per_dish,
            season: self.season,
            establishment_type: self.establishment_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = OptimizationWeights::default();
        let sum = w.profit
            + w.time
            + w.nutrition
            + w.variety
            + w.ingredient_efficiency
            + w.workload_distribution
            + w.satisfaction;
        assert!((sum - 1.0).abs() < 1e-10);
        assert!(w.is_valid());
    }

    #[test]
    fn test_uniform_weights() {
        let w = OptimizationWeights::uniform();
        assert!((w.profit - 1.0 / 7.0).abs() < 1e-10);
        assert!(w.is_valid());
    }

    #[test]
    fn test_negative_weight_invalid() {
        let w = OptimizationWeights {
            profit: -0.1,
            ..OptimizationWeights::default()
        };
        assert!(!w.is_valid());
    }

    #[test]
    fn test_config_builder() {
        let config = RestaurantConfig::default()
            .with_num_dishes(5)
            .with_max_cost_per_dish(150.0)
            .with_num_chefs(3)
            .with_min_profit_margin(40.0)
            .with_establishment(EstablishmentType::Upscale)
            .with_technique("Grilling")
            .with_station("Grill & Griddle");

        assert_eq!(config.num_dishes, 5);
        assert_eq!(config.num_chefs, 3);
        assert_eq!(config.establishment_type, EstablishmentType::Upscale);
        assert!(config.available_techniques.contains("Grilling"));
        assert!(config.available_stations.contains("Grill & Griddle"));
    }

    #[test]
    fn test_constraints_derivation() {
        let config = RestaurantConfig::default()
            .with_max_cost_per_dish(120.0)
            .with_price_factor(2.0);
        let constraints = config.constraints();
        assert!((constraints.max_cost_per_dish - 120.0).abs() < 1e-10);
        assert!((constraints.price_factor - 2.0).abs() < 1e-10);
    }
}
