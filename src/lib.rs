//! Menu planning and kitchen workflow optimization.
//!
//! Evolves restaurant menus with a multi-objective genetic algorithm and
//! plans the kitchen workflow that cooks the winning menu.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Ingredient`, `Dish`, `RecipeStep`,
//!   `RestaurantConfig`, `OptimizationWeights`
//! - **`fitness`**: Seven-objective menu evaluator (profit, time,
//!   nutrition, variety, ingredient reuse, workload, satisfaction)
//! - **`ga`**: Evolutionary engine and the crossover/mutation/repair
//!   operators over fixed-length, duplicate-free menus
//! - **`workflow`**: Cubic `(person, position, precedence)` assignment
//!   structure with consistency checking, plus the manager that staffs it
//! - **`validation`**: Input integrity checks (duplicate IDs, parameter
//!   ranges, technique/station inventories)
//! - **`cancel`**: Cooperative cancellation token for long runs
//!
//! # References
//!
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and
//!   Machine Learning"
//! - Kahn (1962), "Topological sorting of large networks"
//! - Kasavana & Smith (1982), "Menu Engineering"

pub mod cancel;
pub mod fitness;
pub mod ga;
pub mod models;
pub mod validation;
pub mod workflow;

pub use cancel::CancelToken;
pub use fitness::FitnessEvaluator;
pub use ga::{
    EvolveResult, MenuGaConfig, MenuGeneticAlgorithm, OptimizeError, RankedSolution, SolutionSet,
};
pub use models::{Dish, OptimizationWeights, RestaurantConfig};
pub use workflow::{WorkflowManager, WorkflowReport};
