//! Genetic algorithm for menu optimization.
//!
//! [`engine`] drives the evolutionary loop (seeding, selection, elitism,
//! telemetry, multi-solution runs); [`operators`] holds the crossover and
//! mutation strategies plus the repair pass that keeps every menu a
//! fixed-length, duplicate-free dish selection.

mod engine;
mod operators;

pub use engine::{
    EvolutionStats, EvolveResult, MenuGaConfig, MenuGeneticAlgorithm, OptimizeError,
    RankedSolution, SolutionSet,
};
pub use operators::MenuOperators;
