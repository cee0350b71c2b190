//! Dish model.
//!
//! A dish combines a recipe (ingredient quantities), an ordered sequence
//! of preparation steps, and menu-engineering metadata (popularity,
//! complexity, diet type, tags). Total cost and preparation time are
//! accumulated while the dish is built and treated as immutable afterward,
//! so fitness evaluation never recomputes them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Ingredient;

/// Cuisine vocabulary recognized in dish tags.
///
/// Used both for cuisine-aware genetic operators and for the variety
/// sub-score of the fitness evaluator.
pub const CUISINE_TAGS: [&str; 8] = [
    "mexican", "italian", "asian", "french", "spanish", "arabic", "indian", "japanese",
];

/// One step of a dish's preparation sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeStep {
    /// 1-based position within the dish's step sequence.
    pub order: u32,
    /// What the step does.
    pub description: String,
    /// Duration in minutes.
    pub duration_min: f64,
    /// Kitchen station the step runs at.
    pub station: String,
    /// Technique the step requires.
    pub technique: String,
}

impl RecipeStep {
    /// Creates a new recipe step.
    pub fn new(
        order: u32,
        description: impl Into<String>,
        duration_min: f64,
        station: impl Into<String>,
        technique: impl Into<String>,
    ) -> Self {
        Self {
            order,
            description: description.into(),
            duration_min,
            station: station.into(),
            technique: technique.into(),
        }
    }
}

/// An ingredient with the quantity a dish uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeItem {
    /// The ingredient used.
    pub ingredient: Ingredient,
    /// Quantity in grams.
    pub quantity_g: f64,
}

/// A dish from the restaurant catalog.
///
/// Cost and prep time accumulate as ingredients and steps are added via
/// the builder; the cached values stay valid as long as the dish is not
/// mutated afterward, which is the catalog lifecycle contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dish {
    /// Unique dish identifier.
    pub id: u32,
    /// Human-readable name.
    pub name: String,
    /// Customer popularity (1-10).
    pub popularity: u8,
    /// Preparation complexity (1-10).
    pub complexity: u8,
    /// Diet classification (e.g. "omnivore", "vegetarian", "vegan").
    pub diet_type: String,
    /// Free-form tags; cuisine tags are matched against [`CUISINE_TAGS`].
    pub tags: Vec<String>,
    /// Ingredient quantities.
    pub recipe: Vec<RecipeItem>,
    /// Ordered preparation steps.
    pub steps: Vec<RecipeStep>,
    cost: f64,
    prep_time_min: f64,
}

impl Dish {
    /// Creates a new dish with neutral popularity and complexity.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            popularity: 5,
            complexity: 5,
            diet_type: "omnivore".to_string(),
            tags: Vec::new(),
            recipe: Vec::new(),
            steps: Vec::new(),
            cost: 0.0,
            prep_time_min: 0.0,
        }
    }

    /// Sets the popularity (clamped to 1-10).
    pub fn with_popularity(mut self, popularity: u8) -> Self {
        self.popularity = popularity.clamp(1, 10);
        self
    }

    /// Sets the complexity (clamped to 1-10).
    pub fn with_complexity(mut self, complexity: u8) -> Self {
        self.complexity = complexity.clamp(1, 10);
        self
    }

    /// Sets the diet classification.
    pub fn with_diet(mut self, diet_type: impl Into<String>) -> Self {
        self.diet_type = diet_type.into();
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds an ingredient with its quantity in grams.
    ///
    /// Updates the cached total cost.
    pub fn with_ingredient(mut self, ingredient: Ingredient, quantity_g: f64) -> Self {
        self.cost += ingredient.cost_per_kg / 1000.0 * quantity_g;
        self.recipe.push(RecipeItem {
            ingredient,
            quantity_g,
        });
        self
    }

    /// Adds a preparation step.
    ///
    /// Updates the cached total prep time.
    pub fn with_step(mut self, step: RecipeStep) -> Self {
        self.prep_time_min += step.duration_min;
        self.steps.push(step);
        self
    }

    /// Total production cost: sum over the recipe of cost-per-kg × kg.
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Total preparation time in minutes: sum of step durations.
    #[inline]
    pub fn prep_time_min(&self) -> f64 {
        self.prep_time_min
    }

    /// The first cuisine from [`CUISINE_TAGS`] found in this dish's tags.
    pub fn cuisine(&self) -> Option<&'static str> {
        CUISINE_TAGS
            .iter()
            .find(|cuisine| {
                self.tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(**cuisine))
            })
            .copied()
    }

    /// Sorted, deduplicated union of allergens across all ingredients.
    pub fn allergens(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .recipe
            .iter()
            .flat_map(|item| item.ingredient.allergens.iter().map(|a| a.as_str()))
            .collect();
        set.into_iter().map(|a| a.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dish() -> Dish {
        Dish::new(1, "Margherita")
            .with_popularity(8)
            .with_complexity(4)
            .with_diet("vegetarian")
            .with_tag("italian")
            .with_tag("pizza")
            .with_ingredient(Ingredient::new(10, "Flour", 2.0), 250.0)
            .with_ingredient(
                Ingredient::new(11, "Mozzarella", 12.0).with_allergen("dairy"),
                125.0,
            )
            .with_step(RecipeStep::new(1, "Knead dough", 15.0, "Mise en Place", "Kneading"))
            .with_step(RecipeStep::new(2, "Bake", 12.0, "Oven & Roast", "Baking"))
    }

    #[test]
    fn test_dish_cost_accumulates() {
        let dish = sample_dish();
        // 2.0/1000*250 + 12.0/1000*125 = 0.5 + 1.5
        assert!((dish.cost() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_dish_prep_time_accumulates() {
        let dish = sample_dish();
        assert!((dish.prep_time_min() - 27.0).abs() < 1e-10);
    }

    #[test]
    fn test_dish_cuisine_extraction() {
        assert_eq!(sample_dish().cuisine(), Some("italian"));

        let untagged = Dish::new(2, "House Salad").with_tag("fresh");
        assert_eq!(untagged.cuisine(), None);

        // Cuisine matched as a substring of a longer tag
        let fusion = Dish::new(3, "Ramen").with_tag("japanese-fusion");
        assert_eq!(fusion.cuisine(), Some("japanese"));
    }

    #[test]
    fn test_dish_allergens_sorted_unique() {
        let dish = Dish::new(4, "Pad Thai")
            .with_ingredient(Ingredient::new(20, "Peanuts", 8.0).with_allergen("peanut"), 30.0)
            .with_ingredient(
                Ingredient::new(21, "Fish Sauce", 6.0)
                    .with_allergen("fish")
                    .with_allergen("peanut"),
                15.0,
            );
        assert_eq!(dish.allergens(), vec!["fish".to_string(), "peanut".to_string()]);
    }

    #[test]
    fn test_popularity_clamped() {
        let dish = Dish::new(5, "Mystery").with_popularity(14).with_complexity(0);
        assert_eq!(dish.popularity, 10);
        assert_eq!(dish.complexity, 1);
    }

    #[test]
    fn test_empty_dish() {
        let dish = Dish::new(6, "Water");
        assert_eq!(dish.cost(), 0.0);
        assert_eq!(dish.prep_time_min(), 0.0);
        assert!(dish.allergens().is_empty());
    }
}
