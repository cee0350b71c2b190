//! Menu planning domain models.
//!
//! Core data types for the dish catalog and the restaurant configuration
//! contract. Catalog records (`Ingredient`, `RecipeStep`, `Dish`) are
//! loaded once per run and read-only afterward; configuration records are
//! filled by the external collaborator and consumed by the optimizer and
//! the workflow manager.

mod config;
mod dish;
mod ingredient;

pub use config::{Constraints, EstablishmentType, OptimizationWeights, RestaurantConfig};
pub use dish::{Dish, RecipeItem, RecipeStep, CUISINE_TAGS};
pub use ingredient::{Ingredient, Season};
