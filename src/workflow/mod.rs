//! Kitchen workflow assignment.
//!
//! [`cube`] holds the dense `(person, position, precedence)` assignment
//! table with its consistency checker and topological repair; [`manager`]
//! builds that table from an optimized menu and a restaurant
//! configuration and layers reporting and integrity validation on top.

mod cube;
mod manager;

pub use cube::{
    CubeStats, CubicWorkflow, FoodStage, OptimizationReport, Person, Position, StationCategory,
};
pub use manager::{
    AssignmentStrategy, IntegrityReport, PersonReport, PositionReport, WorkflowError,
    WorkflowManager, WorkflowReport,
};
