//! Grid layout planning.
//!
//! Ordinary nodes are laid out row-major from the origin on a square grid.
//! In density mode the cell spacing is derived from a target area so that
//! node density stays roughly constant as the node count changes:
//!
//! ```text
//! spacing   = ceil(sqrt(area / node_count))
//! row_width = ceil(grid_side / spacing)
//! ```

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Target area covered by the nodes, in square meters
pub const DEFAULT_AREA_M2: f64 = 40_000.0;

/// Side length of the square the nodes must stay inside, in meters
pub const DEFAULT_GRID_SIDE_M: u32 = 200;

/// A fixed point in the simulated plane, in meters. `z` is always 0 for
/// the layouts produced here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// How the grid spacing is chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SpacingMode {
    /// Derive spacing from the target area and the node count
    #[default]
    Density,
    /// Use the given spacing and row width as-is
    Fixed { spacing: u32, row_width: u32 },
}

/// Layout planning errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("node count must be at least 1")]
    NoNodes,
    #[error("target area must be positive, got {0}")]
    InvalidArea(f64),
    #[error("grid side must be at least 1 m")]
    ZeroGridSide,
    #[error("fixed layout needs spacing >= 1 and row width >= 1 (got spacing {spacing}, row width {row_width})")]
    ZeroFixedParameter { spacing: u32, row_width: u32 },
    #[error("spacing underflows to zero placing {node_count} nodes in a {grid_side} m square")]
    ZeroSpacing { node_count: usize, grid_side: u32 },
    #[error("{node_count} nodes at {spacing} m spacing, {row_width} per row, do not fit in a {grid_side} m square")]
    DoesNotFit {
        node_count: usize,
        spacing: u32,
        row_width: u32,
        grid_side: u32,
    },
}

/// Result of layout planning: spacing and row width for a given square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPlan {
    /// Distance between adjacent nodes on both axes, in meters
    pub spacing: u32,
    /// Nodes per row
    pub row_width: u32,
    /// Side of the bounding square, in meters
    pub grid_side: u32,
}

impl GridPlan {
    /// Number of rows needed for `node_count` nodes
    pub fn rows(&self, node_count: usize) -> u64 {
        (node_count as u64).div_ceil(u64::from(self.row_width))
    }

    /// Whether `node_count` nodes laid out row-major stay inside the square
    pub fn fits(&self, node_count: usize) -> bool {
        if node_count == 0 {
            return true;
        }
        let spacing = u64::from(self.spacing);
        let side = u64::from(self.grid_side);
        let columns = (node_count as u64).min(u64::from(self.row_width));
        (columns - 1) * spacing <= side && (self.rows(node_count) - 1) * spacing <= side
    }

    /// Row-major positions of the first `node_count` nodes, starting at the origin.
    pub fn positions(&self, node_count: usize) -> Vec<Position> {
        let row_width = self.row_width as usize;
        let spacing = f64::from(self.spacing);
        (0..node_count)
            .map(|i| {
                let column = (i % row_width) as f64;
                let row = (i / row_width) as f64;
                Position::new(column * spacing, row * spacing)
            })
            .collect()
    }

    /// Center of the bounding square, where the access point sits by default
    pub fn center(&self) -> Position {
        let half = f64::from(self.grid_side) / 2.0;
        Position::new(half, half)
    }
}

fn row_width_for(grid_side: u32, spacing: u32) -> u32 {
    grid_side.div_ceil(spacing).max(1)
}

fn density_spacing(node_count: usize, area: f64, grid_side: u32) -> u32 {
    if node_count == 1 {
        return grid_side;
    }
    let spacing = (area / node_count as f64).sqrt().ceil();
    // Anything wider than the square collapses to a single column anyway.
    spacing.min(f64::from(grid_side)) as u32
}

/// Plan a grid for `node_count` nodes.
///
/// # Arguments
/// * `node_count` - Number of ordinary nodes (at least 1)
/// * `area` - Target area in square meters (density mode only)
/// * `grid_side` - Side of the bounding square in meters
/// * `mode` - Density-derived or fixed spacing
///
/// # Returns
/// A [`GridPlan`] whose row-major layout keeps every node inside
/// `[0, grid_side] x [0, grid_side]`.
///
/// # Examples
/// ```
/// use wpansim::layout::{plan_grid, SpacingMode};
///
/// let plan = plan_grid(5, 40_000.0, 200, &SpacingMode::Density).unwrap();
/// assert_eq!(plan.spacing, 90);
/// assert_eq!(plan.row_width, 3);
/// ```
pub fn plan_grid(
    node_count: usize,
    area: f64,
    grid_side: u32,
    mode: &SpacingMode,
) -> Result<GridPlan, LayoutError> {
    if node_count == 0 {
        return Err(LayoutError::NoNodes);
    }
    if grid_side == 0 {
        return Err(LayoutError::ZeroGridSide);
    }

    match mode {
        SpacingMode::Fixed { spacing, row_width } => {
            if *spacing == 0 || *row_width == 0 {
                return Err(LayoutError::ZeroFixedParameter {
                    spacing: *spacing,
                    row_width: *row_width,
                });
            }
            let plan = GridPlan {
                spacing: *spacing,
                row_width: *row_width,
                grid_side,
            };
            if !plan.fits(node_count) {
                return Err(LayoutError::DoesNotFit {
                    node_count,
                    spacing: *spacing,
                    row_width: *row_width,
                    grid_side,
                });
            }
            info!("Using fixed grid: {} m spacing, {} nodes per row", spacing, row_width);
            Ok(plan)
        }
        SpacingMode::Density => {
            if !(area.is_finite() && area > 0.0) {
                return Err(LayoutError::InvalidArea(area));
            }
            let initial = density_spacing(node_count, area, grid_side);
            let mut spacing = initial;
            loop {
                if spacing == 0 {
                    return Err(LayoutError::ZeroSpacing { node_count, grid_side });
                }
                let plan = GridPlan {
                    spacing,
                    row_width: row_width_for(grid_side, spacing),
                    grid_side,
                };
                if plan.fits(node_count) {
                    if spacing != initial {
                        warn!(
                            "Density spacing {} m overflows the {} m square for {} nodes, tightened to {} m",
                            initial, grid_side, node_count, spacing
                        );
                    }
                    info!(
                        "Density grid for {} nodes over {} m2: {} m spacing, {} nodes per row",
                        node_count, area, plan.spacing, plan.row_width
                    );
                    return Ok(plan);
                }
                debug!("Spacing {} m does not fit {} nodes, retrying", spacing, node_count);
                spacing -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn density(n: usize) -> Result<GridPlan, LayoutError> {
        plan_grid(n, DEFAULT_AREA_M2, DEFAULT_GRID_SIDE_M, &SpacingMode::Density)
    }

    #[test]
    fn test_five_nodes_density() {
        let plan = density(5).unwrap();
        assert_eq!(plan.spacing, 90);
        assert_eq!(plan.row_width, 3);

        let positions = plan.positions(5);
        assert_eq!(positions[0], Position::new(0.0, 0.0));
        assert_eq!(positions[2], Position::new(180.0, 0.0));
        assert_eq!(positions[3], Position::new(0.0, 90.0));
        assert_eq!(positions[4], Position::new(90.0, 90.0));
    }

    #[test]
    fn test_single_node_uses_full_side() {
        let plan = density(1).unwrap();
        assert_eq!(plan.spacing, 200);
        assert_eq!(plan.row_width, 1);
        assert_eq!(plan.positions(1), vec![Position::new(0.0, 0.0)]);

        // A larger area must not spill a lone node outside the square
        let plan = plan_grid(1, 1_000_000.0, 200, &SpacingMode::Density).unwrap();
        assert_eq!(plan.spacing, 200);
    }

    #[test]
    fn test_zero_nodes_rejected() {
        assert_eq!(density(0), Err(LayoutError::NoNodes));
    }

    #[test]
    fn test_overflowing_density_is_tightened() {
        // ceil(sqrt(800)) = 29 gives 7 per row and 8 rows, last row at 203 m
        let plan = density(50).unwrap();
        assert_eq!(plan.spacing, 28);
        assert_eq!(plan.row_width, 8);
        assert!(plan.fits(50));
    }

    #[test]
    fn test_every_position_inside_square() {
        for n in 1..=1000 {
            let plan = density(n).unwrap();
            assert!(plan.spacing >= 1, "spacing for n={}", n);
            assert!(plan.row_width >= 1, "row width for n={}", n);
            for p in plan.positions(n) {
                assert!(p.x >= 0.0 && p.x <= 200.0, "x={} for n={}", p.x, n);
                assert!(p.y >= 0.0 && p.y <= 200.0, "y={} for n={}", p.y, n);
                assert_eq!(p.z, 0.0);
            }
        }
    }

    #[test]
    fn test_spacing_underflow() {
        // 201 rows of 200 nodes at 1 m is the densest layout that fits
        assert!(density(200 * 201).is_ok());
        assert_eq!(
            density(200 * 201 + 1),
            Err(LayoutError::ZeroSpacing { node_count: 200 * 201 + 1, grid_side: 200 })
        );
    }

    #[test]
    fn test_fixed_spacing() {
        let mode = SpacingMode::Fixed { spacing: 10, row_width: 5 };
        let plan = plan_grid(12, DEFAULT_AREA_M2, 200, &mode).unwrap();
        assert_eq!(plan.spacing, 10);
        assert_eq!(plan.row_width, 5);
        assert_eq!(plan.positions(12)[11], Position::new(10.0, 20.0));

        let too_wide = SpacingMode::Fixed { spacing: 90, row_width: 4 };
        assert!(matches!(
            plan_grid(4, DEFAULT_AREA_M2, 200, &too_wide),
            Err(LayoutError::DoesNotFit { .. })
        ));

        let zero = SpacingMode::Fixed { spacing: 0, row_width: 3 };
        assert!(matches!(
            plan_grid(4, DEFAULT_AREA_M2, 200, &zero),
            Err(LayoutError::ZeroFixedParameter { .. })
        ));
    }

    #[test]
    fn test_invalid_area() {
        assert_eq!(
            plan_grid(4, 0.0, 200, &SpacingMode::Density),
            Err(LayoutError::InvalidArea(0.0))
        );
    }

    #[test]
    fn test_center() {
        assert_eq!(density(5).unwrap().center(), Position::new(100.0, 100.0));
    }

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(30.0, 40.0);
        assert_eq!(a.distance_to(&b), 50.0);
    }
}
