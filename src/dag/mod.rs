// src/dag/mod.rs

//! Target graph and build planning.
//!
//! - [`graph`] holds the substituted, acyclic table of targets.
//! - [`plan`] decides which targets are stale and orders them so every
//!   prerequisite runs before its dependents.

pub mod graph;
pub mod plan;

pub use graph::{Prerequisite, TargetGraph, TargetNode};
pub use plan::{plan, BuildPlan, OutputState, PlannedStep, PrerequisiteState, RunReason};
