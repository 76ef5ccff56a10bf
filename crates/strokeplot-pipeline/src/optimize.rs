//! Tour optimization: reorder strokes to reduce pen-up travel.
//!
//! Greedy nearest-neighbor over stroke endpoints, O(N²). Starting with the
//! first stroke in input order, repeatedly schedule the unvisited stroke
//! whose first point is closest to the last point of the stroke scheduled
//! just before it. Ties go to the lowest input index.
//!
//! Strokes are never reversed, split, merged or dropped: the output is a
//! permutation of the input. This is a heuristic, not an optimal tour.

use crate::types::{Point, Stroke};

/// Compute the visiting order as indices into `strokes`.
///
/// The returned vector is a permutation of `0..strokes.len()`. An empty
/// stroke has no first point and is treated as infinitely far away; it
/// still appears exactly once.
#[must_use = "returns the tour order"]
pub fn tour_order(strokes: &[Stroke]) -> Vec<usize> {
    let n = strokes.len();
    if n == 0 {
        return Vec::new();
    }

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    visited[0] = true;
    order.push(0);
    let mut current_end: Option<Point> = strokes[0].path.last().copied();

    for _ in 1..n {
        let mut best: Option<usize> = None;
        let mut best_dist = f64::INFINITY;

        for (j, candidate) in strokes.iter().enumerate() {
            if visited[j] {
                continue;
            }

            let dist = match (current_end, candidate.path.first()) {
                (Some(end), Some(start)) => end.distance_squared(*start),
                (None, Some(_)) => 0.0,
                (_, None) => f64::INFINITY,
            };

            // Strict comparison keeps the lowest index on ties.
            if best.is_none() || dist < best_dist {
                best_dist = dist;
                best = Some(j);
            }
        }

        // At least one stroke is unvisited on every iteration.
        let Some(next) = best else {
            continue;
        };

        visited[next] = true;
        order.push(next);
        if let Some(end) = strokes[next].path.last() {
            current_end = Some(*end);
        }
    }

    order
}

/// Reorder strokes to reduce travel between consecutive strokes.
///
/// See [`tour_order`] for the ordering rule.
#[must_use = "returns the reordered strokes"]
pub fn optimize_stroke_order(strokes: Vec<Stroke>) -> Vec<Stroke> {
    let order = tour_order(&strokes);
    let mut slots: Vec<Option<Stroke>> = strokes.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect()
}

/// Total pen-up distance between consecutive strokes.
#[must_use]
pub fn travel_distance(strokes: &[Stroke]) -> f64 {
    strokes
        .windows(2)
        .filter_map(|pair| {
            let end = pair[0].path.last()?;
            let start = pair[1].path.first()?;
            Some(end.distance(*start))
        })
        .sum()
}
