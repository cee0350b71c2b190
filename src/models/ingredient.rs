//! Ingredient model.
//!
//! Ingredients are the leaf records of the dish catalog: a priced raw
//! material with allergen and seasonality metadata. They are loaded once
//! from the external catalog and read-only afterward.

use serde::{Deserialize, Serialize};

/// Seasonal availability of an ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Season {
    /// Available year-round.
    #[default]
    AllYear,
    Spring,
    Summer,
    Autumn,
    Winter,
}

/// A raw ingredient with cost and availability metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Unique ingredient identifier.
    pub id: u32,
    /// Human-readable name.
    pub name: String,
    /// Cost per kilogram (currency units).
    pub cost_per_kg: f64,
    /// Allergens contained in this ingredient.
    pub allergens: Vec<String>,
    /// Seasonal availability.
    pub season: Season,
    /// Caloric density (kcal per kg). `None` = unknown.
    pub calories_per_kg: Option<f64>,
}

impl Ingredient {
    /// Creates a new ingredient.
    pub fn new(id: u32, name: impl Into<String>, cost_per_kg: f64) -> Self {
        Self {
            id,
            name: name.into(),
            cost_per_kg,
            allergens: Vec::new(),
            season: Season::AllYear,
            calories_per_kg: None,
        }
    }

    /// Adds an allergen.
    pub fn with_allergen(mut self, allergen: impl Into<String>) -> Self {
        self.allergens.push(allergen.into());
        self
    }

    /// Sets the seasonal availability.
    pub fn with_season(mut self, season: Season) -> Self {
        self.season = season;
        self
    }

    /// Sets the caloric density (kcal per kg).
    pub fn with_calories(mut self, calories_per_kg: f64) -> Self {
        self.calories_per_kg = Some(calories_per_kg);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_builder() {
        let ing = Ingredient::new(1, "Salmon", 32.5)
            .with_allergen("fish")
            .with_season(Season::AllYear)
            .with_calories(2080.0);

        assert_eq!(ing.id, 1);
        assert_eq!(ing.name, "Salmon");
        assert!((ing.cost_per_kg - 32.5).abs() < 1e-10);
        assert_eq!(ing.allergens, vec!["fish".to_string()]);
        assert_eq!(ing.season, Season::AllYear);
        assert_eq!(ing.calories_per_kg, Some(2080.0));
    }

    #[test]
    fn test_ingredient_defaults() {
        let ing = Ingredient::new(2, "Basil", 14.0);
        assert!(ing.allergens.is_empty());
        assert_eq!(ing.season, Season::AllYear);
        assert_eq!(ing.calories_per_kg, None);
    }

    #[test]
    fn test_season_serde_roundtrip() {
        let json = serde_json::to_string(&Season::Winter).unwrap();
        let back: Season = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Season::Winter);
    }
}
