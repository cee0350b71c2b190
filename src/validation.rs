//! Input validation for menu optimization runs.
//!
//! Checks structural integrity of the dish catalog and the restaurant
//! configuration before any optimization work begins. Detects:
//! - Out-of-range parameters (zero dishes, non-positive costs)
//! - Empty technique/station inventories
//! - Duplicate dish or ingredient IDs
//!
//! A catalog smaller than the requested menu length is *not* an error:
//! it is logged as a warning here and surfaced as an explicit signal by
//! the engine when a run is actually attempted.

use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::models::{Dish, RestaurantConfig};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A numeric parameter is out of range.
    InvalidParameter,
    /// Two catalog entities share the same ID.
    DuplicateId,
    /// The kitchen has no techniques configured.
    EmptyTechniqueSet,
    /// The kitchen has no stations configured.
    EmptyStationSet,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the catalog and configuration for an optimization run.
///
/// Checks:
/// 1. `num_dishes`, `num_chefs` at least 1
/// 2. `max_cost_per_dish`, `price_factor` positive; `min_profit_margin` non-negative
/// 3. Technique and station inventories non-empty
/// 4. No duplicate dish IDs; no dish reusing one ingredient ID with
///    conflicting ingredient records
/// 5. No non-positive ingredient costs
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_config(catalog: &[Dish], config: &RestaurantConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.num_dishes == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidParameter,
            "num_dishes must be at least 1",
        ));
    }
    if config.num_chefs == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidParameter,
            "num_chefs must be at least 1",
        ));
    }
    if config.max_cost_per_dish <= 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidParameter,
            format!("max_cost_per_dish must be positive, got {}", config.max_cost_per_dish),
        ));
    }
    if config.price_factor <= 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidParameter,
            format!("price_factor must be positive, got {}", config.price_factor),
        ));
    }
    if config.min_profit_margin < 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidParameter,
            format!(
                "min_profit_margin must be non-negative, got {}",
                config.min_profit_margin
            ),
        ));
    }
    if config.available_techniques.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyTechniqueSet,
            "available_techniques is empty",
        ));
    }
    if config.available_stations.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyStationSet,
            "available_stations is empty",
        ));
    }

    // Catalog integrity
    let mut dish_ids = HashSet::new();
    let mut ingredient_costs: HashMap<u32, f64> = HashMap::new();
    for dish in catalog {
        if !dish_ids.insert(dish.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate dish ID: {}", dish.id),
            ));
        }
        for item in &dish.recipe {
            let ing = &item.ingredient;
            if ing.cost_per_kg <= 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidParameter,
                    format!(
                        "Ingredient '{}' (ID {}) has non-positive cost {}",
                        ing.name, ing.id, ing.cost_per_kg
                    ),
                ));
            }
            match ingredient_costs.get(&ing.id) {
                Some(&cost) if (cost - ing.cost_per_kg).abs() > 1e-9 => {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::DuplicateId,
                        format!("Ingredient ID {} appears with conflicting costs", ing.id),
                    ));
                }
                _ => {
                    ingredient_costs.insert(ing.id, ing.cost_per_kg);
                }
            }
        }
    }

    if catalog.len() < config.num_dishes {
        // Soft constraint: the caller may still proceed with a larger catalog.
        warn!(
            catalog = catalog.len(),
            requested = config.num_dishes,
            "catalog smaller than requested menu length"
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
