//! Top-K haversine candidate selection over a driver's polyline.

use crate::geo::{haversine_m, Coordinate};

/// Indices of the `k` points in `points` closest (by haversine distance) to
/// `target`, ordered nearest-first.
pub fn topk_by_haversine(points: &[Coordinate], target: Coordinate, k: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, haversine_m(*p, target)))
        .collect();
    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    scored.truncate(k);
    scored.into_iter().map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_closest_points_first() {
        let points = vec![
            Coordinate::new(0.0, 5.0),
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 2.0),
        ];
        let target = Coordinate::new(0.0, 0.0);
        let idx = topk_by_haversine(&points, target, 2);
        assert_eq!(idx, vec![1, 2]);
    }

    #[test]
    fn truncates_to_k_even_when_more_points_exist() {
        let points: Vec<Coordinate> = (0..20).map(|i| Coordinate::new(0.0, i as f64)).collect();
        let idx = topk_by_haversine(&points, Coordinate::new(0.0, 0.0), 3);
        assert_eq!(idx.len(), 3);
    }

    #[test]
    fn k_larger_than_points_returns_all() {
        let points = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)];
        let idx = topk_by_haversine(&points, Coordinate::new(0.0, 0.0), 10);
        assert_eq!(idx.len(), 2);
    }
}
