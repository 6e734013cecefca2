//! Flat-kernel mean-shift clustering of 3D points
//!
//! Every point seeds a mode search: the seed repeatedly moves to the mean of
//! all points within `bandwidth` until it moves less than `1e-3 * bandwidth`.
//! Modes are ranked by how many points surrounded them at convergence, modes
//! closer than `bandwidth` to a better ranked mode are dropped, and every point
//! joins its nearest surviving mode.

use crate::ClusterError;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// A point in array axis order `[axis0, axis1, axis2]`
pub type Point = [f64; 3];

/// Iteration cap for a single mode search
pub const MAX_ITERATIONS: usize = 300;

/// Cluster modes and point assignments
#[derive(Debug, Clone, PartialEq)]
pub struct MeanShiftResult {
    /// One mode per cluster, best ranked first
    pub centers: Vec<Point>,
    /// Cluster index of every input point, in input order
    pub labels: Vec<usize>,
}

impl MeanShiftResult {
    #[must_use]
    pub fn num_clusters(&self) -> usize {
        self.centers.len()
    }

    /// Number of points assigned to each cluster
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centers.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Mean-shift clustering with a flat kernel
#[derive(Debug, Clone, Copy)]
pub struct MeanShift {
    bandwidth: f64,
}

impl MeanShift {
    /// # Errors
    /// Returns [`ClusterError::InvalidConfig`] unless `bandwidth` is finite and positive.
    pub fn new(bandwidth: f64) -> Result<Self, ClusterError> {
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "mean-shift bandwidth must be positive, got {bandwidth}"
            )));
        }
        Ok(Self { bandwidth })
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Cluster `points`
    ///
    /// Mode searches run in parallel; results are gathered in seed order, so
    /// the output only depends on the input order and the bandwidth.
    #[must_use]
    pub fn fit(&self, points: &[Point]) -> MeanShiftResult {
        if points.is_empty() {
            return MeanShiftResult {
                centers: Vec::new(),
                labels: Vec::new(),
            };
        }

        let grid = NeighborGrid::new(points, self.bandwidth);
        let modes: Vec<(Point, usize)> = points
            .par_iter()
            .filter_map(|&seed| self.seek_mode(&grid, points, seed))
            .collect();

        // Identical modes collapse to one entry, the last seed's population wins
        let mut unique: HashMap<[u64; 3], (Point, usize)> = HashMap::with_capacity(modes.len());
        for (mode, population) in modes {
            unique.insert(mode.map(f64::to_bits), (mode, population));
        }
        let mut ranked: Vec<(Point, usize)> = unique.into_values().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| compare_points(&b.0, &a.0)));

        let bandwidth_sq = self.bandwidth * self.bandwidth;
        let mut centers: Vec<Point> = Vec::new();
        for (mode, _) in ranked {
            if centers
                .iter()
                .all(|kept| distance_sq(kept, &mode) > bandwidth_sq)
            {
                centers.push(mode);
            }
        }
        debug!(
            "Mean-shift: {} points, {} clusters (bandwidth {})",
            points.len(),
            centers.len(),
            self.bandwidth
        );

        let labels = points
            .par_iter()
            .map(|point| nearest(&centers, point))
            .collect();

        MeanShiftResult { centers, labels }
    }

    /// Follow the density gradient from `seed`; `None` if the neighbourhood empties
    fn seek_mode(&self, grid: &NeighborGrid, points: &[Point], seed: Point) -> Option<(Point, usize)> {
        let stop_threshold_sq = (1e-3 * self.bandwidth).powi(2);
        let mut mean = seed;
        let mut iterations = 0;

        loop {
            let (sum, count) = grid.sum_within(points, &mean, self.bandwidth);
            if count == 0 {
                return None;
            }

            let previous = mean;
            let n = count as f64;
            mean = [sum[0] / n, sum[1] / n, sum[2] / n];

            if distance_sq(&mean, &previous) <= stop_threshold_sq || iterations == MAX_ITERATIONS {
                return Some((mean, count));
            }
            iterations += 1;
        }
    }
}

/// Uniform grid over the points with cells one bandwidth wide
struct NeighborGrid {
    cell_size: f64,
    cells: HashMap<[i64; 3], Vec<usize>>,
}

impl NeighborGrid {
    fn new(points: &[Point], cell_size: f64) -> Self {
        let mut cells: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
        for (idx, point) in points.iter().enumerate() {
            cells
                .entry(cell_of(point, cell_size))
                .or_default()
                .push(idx);
        }
        Self { cell_size, cells }
    }

    /// Coordinate sum and count of points within `radius` of `query`
    ///
    /// `radius` must not exceed the cell size.
    fn sum_within(&self, points: &[Point], query: &Point, radius: f64) -> (Point, usize) {
        let radius_sq = radius * radius;
        let [c0, c1, c2] = cell_of(query, self.cell_size);
        let mut sum = [0.0; 3];
        let mut count = 0;

        for d0 in -1..=1 {
            for d1 in -1..=1 {
                for d2 in -1..=1 {
                    let Some(members) = self.cells.get(&[c0 + d0, c1 + d1, c2 + d2]) else {
                        continue;
                    };
                    for &idx in members {
                        let p = &points[idx];
                        if distance_sq(p, query) <= radius_sq {
                            sum[0] += p[0];
                            sum[1] += p[1];
                            sum[2] += p[2];
                            count += 1;
                        }
                    }
                }
            }
        }
        (sum, count)
    }
}

fn cell_of(point: &Point, cell_size: f64) -> [i64; 3] {
    point.map(|v| (v / cell_size).floor() as i64)
}

fn distance_sq(a: &Point, b: &Point) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

fn compare_points(a: &Point, b: &Point) -> Ordering {
    a[0].total_cmp(&b[0])
        .then_with(|| a[1].total_cmp(&b[1]))
        .then_with(|| a[2].total_cmp(&b[2]))
}

/// Index of the closest center, lowest index on ties
fn nearest(centers: &[Point], point: &Point) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, center) in centers.iter().enumerate() {
        let dist = distance_sq(center, point);
        if dist < best_dist {
            best = idx;
            best_dist = dist;
        }
    }
    best
}
