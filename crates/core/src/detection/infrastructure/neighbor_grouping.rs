//! Neighbor-vote merging of raw cascade hits.
//!
//! A true face fires the cascade at many nearby positions and scales,
//! a false positive usually at only a few. Candidates are clustered by
//! a relative-distance predicate, each cluster is averaged into one box,
//! and the cluster size is the box's vote count.

use crate::detection::infrastructure::math;

/// Relative tolerance for two candidates to count as the same object.
pub const GROUP_EPS: f64 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupedRect {
    pub rect: Rect,
    pub votes: usize,
}

fn similar(a: &Rect, b: &Rect, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    ((a.x - b.x).abs() as f64) <= delta
        && ((a.y - b.y).abs() as f64) <= delta
        && ((a.x + a.width - b.x - b.width).abs() as f64) <= delta
        && ((a.y + a.height - b.y - b.height).abs() as f64) <= delta
}

/// Clusters `rects` and keeps clusters with more than `min_neighbors` members.
///
/// A surviving cluster is still dropped when it lies inside another
/// surviving cluster that out-votes it. With `min_neighbors == 0` the
/// input is returned as-is, one vote each.
pub fn group_rectangles(rects: &[Rect], min_neighbors: usize, eps: f64) -> Vec<GroupedRect> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects
            .iter()
            .map(|&rect| GroupedRect { rect, votes: 1 })
            .collect();
    }

    let (labels, classes) = math::partition(rects.len(), |i, j| similar(&rects[i], &rects[j], eps));

    let mut sums = vec![[0i64; 4]; classes];
    let mut votes = vec![0usize; classes];
    for (rect, &label) in rects.iter().zip(&labels) {
        let s = &mut sums[label];
        s[0] += rect.x as i64;
        s[1] += rect.y as i64;
        s[2] += rect.width as i64;
        s[3] += rect.height as i64;
        votes[label] += 1;
    }

    let averaged: Vec<Rect> = sums
        .iter()
        .zip(&votes)
        .map(|(s, &n)| {
            let scale = 1.0 / n as f64;
            Rect {
                x: (s[0] as f64 * scale).round() as i32,
                y: (s[1] as f64 * scale).round() as i32,
                width: (s[2] as f64 * scale).round() as i32,
                height: (s[3] as f64 * scale).round() as i32,
            }
        })
        .collect();

    let mut kept = Vec::new();
    for i in 0..classes {
        let n1 = votes[i];
        if n1 <= min_neighbors {
            continue;
        }
        let r1 = averaged[i];
        let swallowed = (0..classes).any(|j| {
            let n2 = votes[j];
            if j == i || n2 <= min_neighbors {
                return false;
            }
            let r2 = averaged[j];
            let dx = (r2.width as f64 * eps).round() as i32;
            let dy = (r2.height as f64 * eps).round() as i32;
            r1.x >= r2.x - dx
                && r1.y >= r2.y - dy
                && r1.x + r1.width <= r2.x + r2.width + dx
                && r1.y + r1.height <= r2.y + r2.height + dy
                && (n2 > n1.max(3) || n1 < 3)
        });
        if !swallowed {
            kept.push(GroupedRect {
                rect: r1,
                votes: n1,
            });
        }
    }
    kept
}
