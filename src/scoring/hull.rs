use std::cmp::Ordering;

use crate::party::Position;

fn lexicographic(a: &Position, b: &Position) -> Ordering {
    a.economic
        .total_cmp(&b.economic)
        .then_with(|| a.social.total_cmp(&b.social))
}

/// Z component of `(a - o) × (b - o)`; positive for a counter-clockwise turn.
pub fn cross(o: &Position, a: &Position, b: &Position) -> f64 {
    (a.economic - o.economic) * (b.social - o.social)
        - (a.social - o.social) * (b.economic - o.economic)
}

pub fn distinct_points(points: &[Position]) -> Vec<Position> {
    let mut sorted = points.to_vec();
    sorted.sort_by(lexicographic);
    sorted.dedup_by(|a, b| lexicographic(a, b) == Ordering::Equal);
    sorted
}

fn half_chain<'a>(points: impl Iterator<Item = &'a Position>) -> Vec<Position> {
    let mut chain: Vec<Position> = Vec::new();
    for p in points {
        while chain.len() >= 2 && cross(&chain[chain.len() - 2], &chain[chain.len() - 1], p) <= 0.0
        {
            chain.pop();
        }
        chain.push(*p);
    }
    chain
}

/// Monotone-chain hull in counter-clockwise order. Collinear points are
/// dropped, so a degenerate input collapses to its two extreme points.
pub fn convex_hull(points: &[Position]) -> Vec<Position> {
    let sorted = distinct_points(points);
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower = half_chain(sorted.iter());
    let mut upper = half_chain(sorted.iter().rev());
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

pub fn polygon_area(vertices: &[Position]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let doubled: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.economic * b.social - b.economic * a.social)
        .sum();
    doubled.abs() / 2.0
}
