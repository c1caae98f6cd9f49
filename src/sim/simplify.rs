//! Stroke simplification
//!
//! Raw pointer paths are dense and jittery. Before a stroke becomes a rigid
//! body it is reduced with Ramer-Douglas-Peucker so that every discarded
//! sample stays within `epsilon` of the simplified line.

use glam::Vec2;

/// Perpendicular distance from `p` to the line through `a` and `b`
///
/// Falls back to the point distance when the chord is degenerate (a == b),
/// which happens for closed loops where the stroke ends where it started.
pub fn perpendicular_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let chord = b - a;
    let len = chord.length();
    if len <= f32::EPSILON {
        return (p - a).length();
    }
    chord.perp_dot(p - a).abs() / len
}

/// Simplify a polyline, keeping the first and last point
///
/// Returns a subsequence of `points`. Inputs of one or two points are
/// returned unchanged. A negative `epsilon` is treated as zero.
pub fn simplify(points: &[Vec2], epsilon: f32) -> Vec<Vec2> {
    simplify_indices(points, epsilon)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Indices of the points [`simplify`] keeps, in ascending order
pub fn simplify_indices(points: &[Vec2], epsilon: f32) -> Vec<usize> {
    if points.len() <= 2 {
        return (0..points.len()).collect();
    }

    let epsilon = epsilon.max(0.0);
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    // Explicit stack of (start, end) spans so long strokes can't blow the call stack
    let mut spans = vec![(0usize, points.len() - 1)];
    while let Some((start, end)) = spans.pop() {
        if end <= start + 1 {
            continue;
        }

        let (a, b) = (points[start], points[end]);
        let mut max_dist = 0.0;
        let mut max_idx = start;
        for (i, &p) in points.iter().enumerate().take(end).skip(start + 1) {
            let d = perpendicular_distance(p, a, b);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > epsilon {
            keep[max_idx] = true;
            spans.push((max_idx, end));
            spans.push((start, max_idx));
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_inputs_unchanged() {
        let one = [Vec2::new(3.0, 4.0)];
        assert_eq!(simplify(&one, 4.0), one.to_vec());

        let two = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)];
        assert_eq!(simplify(&two, 4.0), two.to_vec());

        assert!(simplify(&[], 1.0).is_empty());
    }

    #[test]
    fn test_collinear_points_collapse() {
        let points: Vec<Vec2> = (0..10).map(|i| Vec2::new(i as f32 * 10.0, 0.0)).collect();
        let result = simplify(&points, 0.5);
        assert_eq!(result, vec![points[0], points[9]]);
    }

    #[test]
    fn test_corner_is_kept() {
        let points = [
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 130.0),
            Vec2::new(130.0, 160.0),
        ];
        let result = simplify(&points, 4.0);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_small_wiggle_removed() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 1.0),
            Vec2::new(20.0, -1.0),
            Vec2::new(30.0, 0.0),
        ];
        let result = simplify(&points, 4.0);
        assert_eq!(result, vec![points[0], points[3]]);
    }

    #[test]
    fn test_closed_loop_keeps_far_point() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(50.0, 0.0),
            Vec2::new(50.0, 50.0),
            Vec2::new(0.0, 0.0),
        ];
        let result = simplify(&points, 4.0);
        assert!(result.len() >= 3);
        assert_eq!(result[0], points[0]);
        assert_eq!(*result.last().unwrap(), points[3]);
    }

    #[test]
    fn test_perpendicular_distance() {
        let d = perpendicular_distance(Vec2::new(5.0, 3.0), Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!((d - 3.0).abs() < 1e-5);
        // Degenerate chord
        let d = perpendicular_distance(Vec2::new(3.0, 4.0), Vec2::ZERO, Vec2::ZERO);
        assert!((d - 5.0).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_simplify_within_epsilon(
            raw in prop::collection::vec((0.0f32..800.0, 0.0f32..600.0), 1..60),
            epsilon in 0.0f32..20.0,
        ) {
            let points: Vec<Vec2> = raw.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
            let kept = simplify_indices(&points, epsilon);

            prop_assert_eq!(kept[0], 0);
            prop_assert_eq!(*kept.last().unwrap(), points.len() - 1);

            for pair in kept.windows(2) {
                let (a, b) = (points[pair[0]], points[pair[1]]);
                for &p in &points[pair[0] + 1..pair[1]] {
                    let d = perpendicular_distance(p, a, b);
                    prop_assert!(d <= epsilon, "point {:?} deviates {} > {}", p, d, epsilon);
                }
            }

            let result = simplify(&points, epsilon);
            prop_assert_eq!(result.len(), kept.len());
            prop_assert_eq!(result[0], points[0]);
            prop_assert_eq!(*result.last().unwrap(), *points.last().unwrap());
        }
    }
}
