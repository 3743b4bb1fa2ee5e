//! Solution extractor: walks a vehicle's stop order into concrete
//! [`Stop`]/[`Route`] values.
//!
//! The same forward simulation is also used by the solver and the
//! re-sequencer to test whether a candidate stop order is feasible, so it
//! lives in one place.

use crate::expand::ExpandedNode;
use crate::matrix::TimeMatrix;
use crate::model::{Minutes, Route, Stop};

/// A (driver, date) pair modeled as one routing vehicle with absolute
/// start/end times.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub driver_id: String,
    pub date: String,
    pub day_idx: usize,
    pub abs_start: Minutes,
    pub abs_end: Minutes,
}

/// Result of simulating a stop order for one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSim {
    pub stops: Vec<Stop>,
    pub total_travel: f64,
    pub total_stay: f64,
    pub end_time: f64,
    pub return_travel: f64,
}

impl RouteSim {
    pub fn into_route(self, driver_id: String, abs_end: Minutes) -> Route {
        let overtime = (self.end_time - abs_end as f64).max(0.0);
        Route {
            driver_id,
            stops: self.stops,
            travel_minutes: self.total_travel,
            stay_minutes: self.total_stay,
            end_time: self.end_time,
            overtime_minutes: overtime,
            return_travel_minutes: self.return_travel,
        }
    }
}

/// Simulate visiting `order` (a sequence of 0-based indices into `nodes`)
/// for a vehicle starting at `abs_start`. Returns `None` if any stop's
/// absolute time window is violated, or if the route (with return-to-depot
/// leg) would end after `abs_end` — the vehicle's hard end-time upper bound.
///
/// The greedy sweeper and backfill repair build their routes with their own,
/// more permissive feasibility rules instead of calling this function.
pub fn simulate_route(
    order: &[usize],
    nodes: &[ExpandedNode],
    matrix: &TimeMatrix,
    abs_start: Minutes,
    abs_end: Minutes,
) -> Option<RouteSim> {
    let sim = simulate_unbounded(order, nodes, matrix, abs_start)?;
    if sim.end_time > abs_end as f64 {
        return None;
    }
    Some(sim)
}

/// Like [`simulate_route`] but does not enforce the vehicle end window;
/// used where overtime is tracked rather than rejected.
pub fn simulate_unbounded(order: &[usize], nodes: &[ExpandedNode], matrix: &TimeMatrix, abs_start: Minutes) -> Option<RouteSim> {
    let mut stops = Vec::with_capacity(order.len());
    let mut total_travel = 0.0;
    let mut total_stay = 0.0;
    let mut prev_matrix_idx = 0usize; // depot
    let mut prev_depart = abs_start as f64;

    for &node_idx in order {
        let node = &nodes[node_idx];
        let matrix_idx = node_idx + 1;
        let travel_matrix = matrix.get(prev_matrix_idx, matrix_idx) as f64;
        let earliest_arrival = prev_depart + travel_matrix;
        let arrival = earliest_arrival.max(node.tw_abs.0 as f64);
        if arrival > node.tw_abs.1 as f64 {
            return None;
        }
        let travel = (arrival - prev_depart).max(0.0);
        let depart = arrival + node.stay_minutes as f64;

        stops.push(Stop {
            target_id: node.base_id.clone(),
            arrival_min: arrival,
            depart_min: depart,
            travel_minutes: travel,
            stay_minutes: node.stay_minutes as f64,
        });

        total_travel += travel;
        total_stay += node.stay_minutes as f64;
        prev_matrix_idx = matrix_idx;
        prev_depart = depart;
    }

    let return_travel = (matrix.get(prev_matrix_idx, 0) as f64).max(0.0);
    let end_time = prev_depart + return_travel;
    total_travel += return_travel;

    Some(RouteSim {
        stops,
        total_travel,
        total_stay,
        end_time,
        return_travel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(base: &str, stay: i64, tw: (i64, i64)) -> ExpandedNode {
        ExpandedNode {
            node_id: base.to_string(),
            base_id: base.to_string(),
            lat: 10.0,
            lon: 123.0,
            stay_minutes: stay,
            required: true,
            tw_abs: tw,
        }
    }

    fn matrix(values: Vec<i64>, size: usize) -> TimeMatrix {
        assert_eq!(values.len(), size * size);
        TimeMatrix::from_raw(size, values)
    }

    #[test]
    fn arrival_waits_for_window_start() {
        let nodes = vec![node("A", 10, (100, 200))];
        let m = matrix(vec![0, 5, 5, 0], 2);
        let sim = simulate_unbounded(&[0], &nodes, &m, 0).unwrap();
        assert_eq!(sim.stops[0].arrival_min, 100.0);
        assert_eq!(sim.stops[0].travel_minutes, 100.0);
        assert_eq!(sim.stops[0].depart_min, 110.0);
    }

    #[test]
    fn late_arrival_past_window_end_is_infeasible() {
        let nodes = vec![node("A", 10, (0, 3))];
        let m = matrix(vec![0, 5, 5, 0], 2);
        assert!(simulate_unbounded(&[0], &nodes, &m, 0).is_none());
    }

    #[test]
    fn end_window_enforced_when_requested() {
        let nodes = vec![node("A", 10, (0, 100))];
        let m = matrix(vec![0, 5, 5, 0], 2);
        assert!(simulate_route(&[0], &nodes, &m, 0, 10).is_none());
        assert!(simulate_route(&[0], &nodes, &m, 0, 1000).is_some());
    }
}
