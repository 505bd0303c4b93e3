//! Spatial layout of the simulated nodes.
//!
//! This module computes where ordinary nodes sit on a bounded square grid.
//! Layouts are pure functions of the node count and the layout settings,
//! so building the same scenario twice always yields the same positions.

pub mod planner;

pub use planner::{
    plan_grid, GridPlan, LayoutError, Position, SpacingMode, DEFAULT_AREA_M2, DEFAULT_GRID_SIDE_M,
};
