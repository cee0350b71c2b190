//! High-level workflow orchestration.
//!
//! Turns an optimized menu plus a restaurant configuration into a staffed
//! [`CubicWorkflow`]: builds chef and station records, converts recipe
//! steps into preparation stages with sequential precedence per dish,
//! runs an establishment-specific initial assignment, and exposes
//! reporting and integrity validation over the result.

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Dish, EstablishmentType, RestaurantConfig};
use crate::workflow::cube::{
    CubeStats, CubicWorkflow, FoodStage, OptimizationReport, Person, Position, StationCategory,
};

/// Minutes in a standard working day; utilization is measured against it.
const WORK_DAY_MIN: f64 = 480.0;
/// Load above this many minutes counts as an overload warning.
const OVERLOAD_THRESHOLD_MIN: f64 = 600.0;
/// Load below this many minutes counts as an underload warning.
const UNDERLOAD_THRESHOLD_MIN: f64 = 240.0;

/// How initial stage assignment distributes work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStrategy {
    /// Match technique and skill level to stage complexity.
    SkillBased,
    /// Longest stages first, to the currently least-loaded chef.
    LoadBalanced,
    /// Simple rotation.
    RoundRobin,
}

impl AssignmentStrategy {
    /// The strategy an establishment type calls for.
    pub fn for_establishment(establishment: EstablishmentType) -> Self {
        match establishment {
            EstablishmentType::Upscale => Self::SkillBased,
            EstablishmentType::FastFood => Self::LoadBalanced,
            EstablishmentType::Casual => Self::RoundRobin,
        }
    }
}

/// Errors from the workflow manager.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Reporting or optimization requested before initialization.
    #[error("workflow structure not initialized")]
    NotInitialized,
}

/// Per-chef analysis in a workflow report.
#[derive(Debug, Clone)]
pub struct PersonReport {
    pub name: String,
    pub total_tasks: usize,
    pub estimated_time_min: f64,
    /// Estimated time against a 480-minute day, capped at 1.
    pub utilization: f64,
    pub positions_used: usize,
}

/// Per-station analysis in a workflow report.
#[derive(Debug, Clone)]
pub struct PositionReport {
    pub name: String,
    pub total_assignments: usize,
    pub concurrent_peak: usize,
    pub capacity_utilization: f64,
    pub assigned_persons: usize,
}

/// Full workflow report for the presentation layer.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub stats: CubeStats,
    pub persons: Vec<PersonReport>,
    pub positions: Vec<PositionReport>,
    pub consistent: bool,
    pub issues: Vec<String>,
}

/// Result of an integrity validation pass.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Orchestrates the cubic workflow for one optimized menu.
#[derive(Debug, Default)]
pub struct WorkflowManager {
    cube: Option<CubicWorkflow>,
    history: Vec<OptimizationReport>,
}

impl WorkflowManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying cube, if initialized.
    pub fn cube(&self) -> Option<&CubicWorkflow> {
        self.cube.as_ref()
    }

    /// Reports from previous optimization passes, oldest first.
    pub fn optimization_history(&self) -> &[OptimizationReport] {
        &self.history
    }

    /// Builds the cube from a menu and configuration, then runs the
    /// initial assignment.
    ///
    /// When the initial assignment leaves the structure inconsistent, a
    /// topological optimization pass runs immediately. Returns `false`
    /// only when there is nothing to staff (no chefs or no stations).
    pub fn initialize(&mut self, menu: &[Dish], config: &RestaurantConfig) -> bool {
        let persons = build_persons(config);
        let positions = build_positions(config);
        if persons.is_empty() || positions.is_empty() {
            warn!("cannot initialize workflow without chefs and stations");
            return false;
        }

        let total_steps: usize = menu.iter().map(|dish| dish.steps.len()).sum();
        let max_precedence = (total_steps + 10).max(50);
        let mut cube = CubicWorkflow::new(persons.len(), positions.len(), max_precedence);

        for person in persons {
            cube.add_person(person);
        }
        for position in positions {
            cube.add_position(position);
        }

        // Recipe steps become stages, chained sequentially within a dish.
        let mut stage_id = 0;
        for dish in menu {
            let mut dish_stage_ids = Vec::with_capacity(dish.steps.len());
            for step in &dish.steps {
                cube.add_stage(FoodStage {
                    id: stage_id,
                    dish_id: dish.id,
                    step_order: step.order,
                    description: format!("{}: {}", dish.name, step.description),
                    estimated_time_min: step.duration_min,
                    required_technique: step.technique.clone(),
                    required_station: step.station.clone(),
                    complexity: dish.complexity,
                });
                dish_stage_ids.push(stage_id);
                stage_id += 1;
            }
            for pair in dish_stage_ids.windows(2) {
                cube.add_precedence(pair[0], pair[1]);
            }
        }
        info!(stages = stage_id, dishes = menu.len(), "workflow cube built");

        let strategy = AssignmentStrategy::for_establishment(config.establishment_type);
        match strategy {
            AssignmentStrategy::SkillBased => assign_by_skills(&mut cube, menu),
            AssignmentStrategy::LoadBalanced => assign_load_balanced(&mut cube, menu),
            AssignmentStrategy::RoundRobin => assign_round_robin(&mut cube, menu),
        }

        if !cube.check_consistency() {
            warn!("initial assignment inconsistent, running optimization");
            self.cube = Some(cube);
            let report = self
                .optimize_workflow()
                .unwrap_or_else(|_| unreachable!("cube was just set"));
            info!(
                before = report.before,
                after = report.after,
                "post-initialization optimization finished"
            );
        } else {
            self.cube = Some(cube);
        }
        true
    }

    /// Runs a topological optimization pass and records it in the history.
    pub fn optimize_workflow(&mut self) -> Result<OptimizationReport, WorkflowError> {
        let cube = self.cube.as_mut().ok_or(WorkflowError::NotInitialized)?;
        let report = cube.optimize_assignments();
        self.history.push(report.clone());
        Ok(report)
    }

    /// Builds the full workflow report: general statistics, per-chef
    /// load, per-station utilization, and outstanding issues.
    pub fn workflow_report(&self) -> Result<WorkflowReport, WorkflowError> {
        let cube = self.cube.as_ref().ok_or(WorkflowError::NotInitialized)?;
        let stats = cube.stats();

        let persons = cube
            .persons()
            .values()
            .map(|person| {
                let workflow = cube.person_workflow(person.id);
                let total_tasks = workflow.values().map(Vec::len).sum();
                let estimated_time_min = person_total_time(cube, person.id);
                PersonReport {
                    name: person.name.clone(),
                    total_tasks,
                    estimated_time_min,
                    utilization: (estimated_time_min / WORK_DAY_MIN).min(1.0),
                    positions_used: workflow.len(),
                }
            })
            .collect();

        let positions = cube
            .positions()
            .values()
            .map(|position| {
                let schedule = cube.position_schedule(position.id);
                let peak = position_peak_usage(cube, position.id);
                PositionReport {
                    name: position.name.clone(),
                    total_assignments: schedule.values().map(Vec::len).sum(),
                    concurrent_peak: peak,
                    capacity_utilization: if position.max_capacity > 0 {
                        peak as f64 / position.max_capacity as f64
                    } else {
                        0.0
                    },
                    assigned_persons: schedule.len(),
                }
            })
            .collect();

        Ok(WorkflowReport {
            consistent: stats.inconsistency_count == 0,
            issues: cube.inconsistencies().to_vec(),
            stats,
            persons,
            positions,
        })
    }

    /// Re-checks consistency and audits chef load and station usage.
    pub fn validate_integrity(&mut self) -> Result<IntegrityReport, WorkflowError> {
        let cube = self.cube.as_mut().ok_or(WorkflowError::NotInitialized)?;

        let mut report = IntegrityReport {
            valid: true,
            warnings: Vec::new(),
            errors: Vec::new(),
            recommendations: Vec::new(),
        };

        if !cube.check_consistency() {
            report.valid = false;
            report
                .errors
                .extend(cube.inconsistencies().iter().cloned());
        }

        let mut overloaded = false;
        let person_ids: Vec<usize> = cube.persons().keys().copied().collect();
        for person_id in person_ids {
            let load = person_total_time(cube, person_id);
            let name = cube.persons()[&person_id].name.clone();
            if load > OVERLOAD_THRESHOLD_MIN {
                overloaded = true;
                report
                    .warnings
                    .push(format!("{name} is overloaded: {load:.1} minutes"));
            } else if load < UNDERLOAD_THRESHOLD_MIN {
                report
                    .warnings
                    .push(format!("{name} is underutilized: {load:.1} minutes"));
            }
        }

        let position_ids: Vec<usize> = cube.positions().keys().copied().collect();
        for position_id in position_ids {
            if cube.position_schedule(position_id).is_empty() {
                let name = &cube.positions()[&position_id].name;
                report.warnings.push(format!("{name} has no assignments"));
            }
        }

        if !report.warnings.is_empty() || !report.errors.is_empty() {
            report
                .recommendations
                .push("Run workflow optimization".to_string());
        }
        if overloaded {
            report
                .recommendations
                .push("Add staff or redistribute tasks".to_string());
        }

        Ok(report)
    }
}

/// Sum of estimated stage minutes across one person's assignments.
fn person_total_time(cube: &CubicWorkflow, person_id: usize) -> f64 {
    cube.person_workflow(person_id)
        .values()
        .flatten()
        .filter_map(|&(_, stage_id)| cube.stages().get(&stage_id))
        .map(|stage| stage.estimated_time_min)
        .sum()
}

/// Highest number of persons working a position at any single slot.
fn position_peak_usage(cube: &CubicWorkflow, position_id: usize) -> usize {
    (0..cube.max_precedence())
        .map(|precedence| {
            (0..cube.max_persons())
                .filter(|&person_id| cube.stage_at(person_id, position_id, precedence).is_some())
                .count()
        })
        .max()
        .unwrap_or(0)
}

/// Builds chef records from the configured head count and technique set.
///
/// Techniques are dealt out in sorted order with a two-technique overlap
/// window between neighboring chefs; skill level and concurrency come
/// from the establishment tier.
fn build_persons(config: &RestaurantConfig) -> Vec<Person> {
    let techniques: Vec<&String> = config.available_techniques.iter().collect();
    let num_chefs = config.num_chefs;

    (0..num_chefs)
        .map(|i| {
            let specializations = if techniques.is_empty() {
                Vec::new()
            } else {
                let per_chef = (techniques.len() / num_chefs).max(1);
                let start = (i * per_chef).min(techniques.len());
                let end = (start + per_chef + 2).min(techniques.len());
                techniques[start..end].iter().map(|t| (*t).clone()).collect()
            };

            let (skill_level, max_concurrent) = match config.establishment_type {
                EstablishmentType::Upscale => (7 + (i % 3) as u8, 2),
                EstablishmentType::FastFood => (5 + (i % 3) as u8, 3),
                EstablishmentType::Casual => (6 + (i % 3) as u8, 2),
            };

            Person::new(i, format!("Chef {}", i + 1), skill_level)
                .with_specializations(specializations)
                .with_max_concurrent_tasks(max_concurrent)
        })
        .collect()
}

/// Per-station capacity and skill profile; unrecognized stations get a
/// generic two-person profile.
fn station_profile(name: &str) -> (usize, Vec<String>) {
    let profile: Option<(usize, &[&str])> = match name {
        "Mise en Place" => Some((3, &["Preparation", "Organization"][..])),
        "Grill & Griddle" => Some((2, &["Grilling", "Griddling"][..])),
        "Oven & Roast" => Some((2, &["Baking", "Roasting"][..])),
        "Stews & Sauces" => Some((2, &["Stewing", "Sauces"][..])),
        "Fryer" => Some((1, &["Frying"][..])),
        "Plating & Assembly" => Some((3, &["Plating", "Presentation"][..])),
        "Pastry & Desserts" => Some((2, &["Pastry", "Decoration"][..])),
        "Salads & Cold" => Some((2, &["Salads", "Cold Preparation"][..])),
        "Pasta & Grains" => Some((2, &["Boiling", "Pasta"][..])),
        "Beverages" => Some((1, &["Mixing", "Beverages"][..])),
        "Sushi Station" => Some((1, &["Sushi", "Knife Work"][..])),
        "Wok Station" => Some((1, &["Wok", "Stir-Frying"][..])),
        "Smoker" => Some((1, &["Smoking"][..])),
        "Tandoor" => Some((1, &["Tandoor"][..])),
        _ => None,
    };
    match profile {
        Some((capacity, skills)) => (capacity, skills.iter().map(|s| s.to_string()).collect()),
        None => (2, vec!["General".to_string()]),
    }
}

/// Keyword-based station categorizer.
fn categorize_station(name: &str) -> StationCategory {
    let lower = name.to_lowercase();
    const HOT: [&str; 9] = [
        "grill", "griddle", "oven", "fry", "roast", "stew", "wok", "smoker", "tandoor",
    ];
    const COLD: [&str; 5] = ["salad", "cold", "sushi", "beverage", "plating"];
    const PREP: [&str; 2] = ["mise en place", "pastry"];

    if HOT.iter().any(|kw| lower.contains(kw)) {
        StationCategory::Hot
    } else if COLD.iter().any(|kw| lower.contains(kw)) {
        StationCategory::Cold
    } else if PREP.iter().any(|kw| lower.contains(kw)) {
        StationCategory::Prep
    } else {
        StationCategory::General
    }
}

/// Builds position records from the configured station set, in sorted
/// station-name order.
fn build_positions(config: &RestaurantConfig) -> Vec<Position> {
    config
        .available_stations
        .iter()
        .enumerate()
        .map(|(id, name)| {
            let (capacity, skills) = station_profile(name);
            Position::new(id, name.clone(), categorize_station(name), capacity)
                .with_required_skills(skills)
        })
        .collect()
}

/// Looks up the stage generated for a dish step.
fn find_stage(cube: &CubicWorkflow, dish_id: u32, step_order: u32) -> Option<usize> {
    cube.stages()
        .values()
        .find(|stage| stage.dish_id == dish_id && stage.step_order == step_order)
        .map(|stage| stage.id)
}

/// Looks up a position by station name.
fn find_position(cube: &CubicWorkflow, station: &str) -> Option<usize> {
    cube.positions()
        .values()
        .find(|position| position.name == station)
        .map(|position| position.id)
}

/// Best-scoring chef for a technique and complexity: +10 for a matching
/// specialization, plus closeness of skill level to stage complexity.
fn find_skilled_person(cube: &CubicWorkflow, technique: &str, complexity: u8) -> Option<usize> {
    cube.persons()
        .values()
        .map(|person| {
            let mut score = 0i32;
            if person.specializations.iter().any(|s| s == technique) {
                score += 10;
            }
            score += (10 - (person.skill_level as i32 - complexity as i32).abs()).max(0);
            (score, person.id)
        })
        .max_by_key(|&(score, id)| (score, std::cmp::Reverse(id)))
        .map(|(_, id)| id)
}

fn assign_by_skills(cube: &mut CubicWorkflow, menu: &[Dish]) {
    let mut next_slot: BTreeMap<(usize, usize), usize> = BTreeMap::new();

    for dish in menu {
        for step in &dish.steps {
            let Some(stage_id) = find_stage(cube, dish.id, step.order) else {
                continue;
            };
            let Some(position_id) = find_position(cube, &step.station) else {
                continue;
            };
            let Some(person_id) = find_skilled_person(cube, &step.technique, dish.complexity)
            else {
                continue;
            };

            let slot = next_slot.entry((person_id, position_id)).or_insert(0);
            if cube.assign_stage(person_id, position_id, *slot, stage_id) {
                *slot += 1;
            } else {
                warn!(stage_id, "skill-based assignment failed");
            }
        }
    }
}

fn assign_load_balanced(cube: &mut CubicWorkflow, menu: &[Dish]) {
    let mut person_load: BTreeMap<usize, f64> =
        cube.persons().keys().map(|&id| (id, 0.0)).collect();
    let mut next_slot: BTreeMap<(usize, usize), usize> = BTreeMap::new();

    let mut pending: Vec<(usize, f64, String)> = Vec::new();
    for dish in menu {
        for step in &dish.steps {
            if let Some(stage_id) = find_stage(cube, dish.id, step.order) {
                pending.push((stage_id, step.duration_min, step.station.clone()));
            }
        }
    }
    // Longest stages placed first.
    pending.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (stage_id, duration, station) in pending {
        let Some(position_id) = find_position(cube, &station) else {
            continue;
        };
        let Some((&person_id, _)) = person_load
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1).then(a.0.cmp(b.0)))
        else {
            continue;
        };

        let slot = next_slot.entry((person_id, position_id)).or_insert(0);
        if cube.assign_stage(person_id, position_id, *slot, stage_id) {
            *slot += 1;
            *person_load.entry(person_id).or_insert(0.0) += duration;
        }
    }
}

fn assign_round_robin(cube: &mut CubicWorkflow, menu: &[Dish]) {
    let person_ids: Vec<usize> = cube.persons().keys().copied().collect();
    if person_ids.is_empty() {
        return;
    }
    let mut rotation = 0usize;
    let mut next_slot: BTreeMap<(usize, usize), usize> = BTreeMap::new();

    for dish in menu {
        for step in &dish.steps {
            let Some(stage_id) = find_stage(cube, dish.id, step.order) else {
                continue;
            };
            let Some(position_id) = find_position(cube, &step.station) else {
                continue;
            };

            let person_id = person_ids[rotation % person_ids.len()];
            rotation += 1;

            let slot = next_slot.entry((person_id, position_id)).or_insert(0);
            if cube.assign_stage(person_id, position_id, *slot, stage_id) {
                *slot += 1;
            }
        }
    }
}
