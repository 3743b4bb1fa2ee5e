//! Time-matrix builder: an (N+1)x(N+1) integer-minutes matrix over
//! {depot} ∪ expanded nodes.

use rayon::prelude::*;
use tracing::debug;

use crate::expand::ExpandedNode;
use crate::geo::{haversine_km, travel_time_minutes, GeoError, Point};

/// Square matrix of integer minutes. Index 0 is always the depot.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMatrix {
    pub size: usize,
    data: Vec<i64>,
}

impl TimeMatrix {
    pub fn get(&self, from: usize, to: usize) -> i64 {
        self.data[from * self.size + to]
    }

    #[cfg(test)]
    pub(crate) fn from_raw(size: usize, data: Vec<i64>) -> Self {
        Self { size, data }
    }
}

/// Build the travel-time matrix for a depot plus an ordered list of expanded
/// nodes, at a fixed average speed. Rows are computed in parallel. Fails if
/// `speed_kmph` is non-positive, since every off-diagonal entry depends on
/// it.
pub fn build_time_matrix(depot: Point, nodes: &[ExpandedNode], speed_kmph: f64) -> Result<TimeMatrix, GeoError> {
    let points: Vec<Point> = std::iter::once(depot).chain(nodes.iter().map(|n| n.location())).collect();
    let n = points.len();

    let start = std::time::Instant::now();
    let rows: Vec<Vec<i64>> = (0..n)
        .into_par_iter()
        .map(|i| -> Result<Vec<i64>, GeoError> {
            let from = points[i];
            (0..n)
                .map(|j| {
                    if i == j {
                        return Ok(0);
                    }
                    let to = points[j];
                    let km = haversine_km(from, to);
                    let minutes = travel_time_minutes(km, speed_kmph)?;
                    Ok(minutes.ceil() as i64)
                })
                .collect()
        })
        .collect::<Result<Vec<Vec<i64>>, GeoError>>()?;

    debug!(nodes = n, elapsed_ms = start.elapsed().as_millis() as u64, "built time matrix");

    let mut data = Vec::with_capacity(n * n);
    for row in rows {
        data.extend(row);
    }

    Ok(TimeMatrix { size: n, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::ExpandedNode;

    fn node(id: &str, lat: f64, lon: f64) -> ExpandedNode {
        ExpandedNode {
            node_id: id.to_string(),
            base_id: id.to_string(),
            lat,
            lon,
            stay_minutes: 0,
            required: true,
            tw_abs: (0, 1440),
        }
    }

    #[test]
    fn diagonal_is_zero() {
        let nodes = vec![node("a", 10.1, 123.1), node("b", 10.2, 123.2)];
        let m = build_time_matrix((10.0, 123.0), &nodes, 40.0).unwrap();
        for i in 0..m.size {
            assert_eq!(m.get(i, i), 0);
        }
    }

    #[test]
    fn symmetric_by_construction() {
        let nodes = vec![node("a", 10.1, 123.1), node("b", 10.2, 123.2)];
        let m = build_time_matrix((10.0, 123.0), &nodes, 40.0).unwrap();
        assert_eq!(m.get(0, 1), m.get(1, 0));
        assert_eq!(m.get(1, 2), m.get(2, 1));
    }

    #[test]
    fn depot_is_index_zero_and_size_is_n_plus_one() {
        let nodes = vec![node("a", 10.1, 123.1), node("b", 10.2, 123.2), node("c", 10.3, 123.3)];
        let m = build_time_matrix((10.0, 123.0), &nodes, 40.0).unwrap();
        assert_eq!(m.size, 4);
    }

    #[test]
    fn nonpositive_speed_fails() {
        let nodes = vec![node("a", 10.1, 123.1)];
        assert!(build_time_matrix((10.0, 123.0), &nodes, 0.0).is_err());
    }
}
