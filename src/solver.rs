//! Multi-day vehicle routing formulation: a constructive heuristic plus a
//! bounded local search over vehicles, disjunction groups, and a
//! travel-only arc cost paired with a travel-plus-service time dimension.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::expand::ExpandedNode;
use crate::extract::{simulate_route, Vehicle};
use crate::matrix::TimeMatrix;
use crate::model::{Driver, MINUTES_PER_DAY, PENALTY_OPTIONAL, PENALTY_REQUIRED};

/// Disjunction group: all clones sharing one `base_id`, at most one may be
/// visited.
struct Disjunction {
    base_id: String,
    required: bool,
    node_indices: Vec<usize>,
}

/// Output of the constructive + local-search solve.
pub struct SolveOutput {
    pub vehicles: Vec<Vehicle>,
    /// Per-vehicle ordered node indices (into the `nodes` slice passed to
    /// [`solve`]).
    pub assignments: Vec<Vec<usize>>,
    /// Base ids whose entire disjunction group was left unassigned.
    pub dropped_base_ids: Vec<String>,
}

/// Build one vehicle per (driver, date) pair, offsetting each driver's
/// workday by `day_idx * 1440`.
pub fn build_vehicles(dates: &[String], drivers_by_date: &HashMap<String, Vec<Driver>>) -> (Vec<Vehicle>, Vec<String>) {
    let mut vehicles = Vec::new();
    let mut warnings = Vec::new();

    for (day_idx, date) in dates.iter().enumerate() {
        let offset = day_idx as i64 * MINUTES_PER_DAY;
        match drivers_by_date.get(date) {
            Some(drivers) if !drivers.is_empty() => {
                for drv in drivers {
                    vehicles.push(Vehicle {
                        driver_id: drv.id.clone(),
                        date: date.clone(),
                        day_idx,
                        abs_start: offset + drv.start_time,
                        abs_end: offset + drv.end_time,
                    });
                }
            }
            _ => warnings.push(date.clone()),
        }
    }

    (vehicles, warnings)
}

fn build_disjunctions(nodes: &[ExpandedNode]) -> Vec<Disjunction> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Disjunction> = HashMap::new();

    for (idx, node) in nodes.iter().enumerate() {
        groups
            .entry(node.base_id.clone())
            .or_insert_with(|| {
                order.push(node.base_id.clone());
                Disjunction {
                    base_id: node.base_id.clone(),
                    required: node.required,
                    node_indices: Vec::new(),
                }
            })
            .node_indices
            .push(idx);
    }

    order.into_iter().map(|id| groups.remove(&id).unwrap()).collect()
}

/// Solve the multi-day assignment problem: construct a feasible solution via
/// cheapest insertion (required disjunctions before optional, input order
/// within a tier — mirrors OR-tools' parallel-cheapest-insertion first
/// solution strategy), then improve it with bounded 2-opt/relocate local
/// search (tabu-search-flavored: accept only strict improvements, stop when
/// no move improves or the wall clock runs out).
pub fn solve(vehicles: &[Vehicle], nodes: &[ExpandedNode], matrix: &TimeMatrix, max_stops_per_vehicle: usize, max_solve_seconds: u64) -> SolveOutput {
    let deadline = Instant::now() + Duration::from_secs(max_solve_seconds.max(1));
    let mut routes: Vec<Vec<usize>> = vec![Vec::new(); vehicles.len()];
    let mut assigned_base_ids: Vec<String> = Vec::new();

    let mut groups = build_disjunctions(nodes);
    // Required groups first, ties broken by original appearance order.
    groups.sort_by_key(|g| !g.required);

    let construct_start = Instant::now();
    for group in &groups {
        if let Some((vehicle_idx, position, node_idx)) = best_insertion(group, &routes, vehicles, nodes, matrix, max_stops_per_vehicle) {
            routes[vehicle_idx].insert(position, node_idx);
            assigned_base_ids.push(group.base_id.clone());
        }
    }
    debug!(
        assigned = assigned_base_ids.len(),
        groups = groups.len(),
        elapsed_ms = construct_start.elapsed().as_millis() as u64,
        "construction phase complete"
    );

    local_search(&mut routes, vehicles, nodes, matrix, max_stops_per_vehicle, deadline);

    let assigned: std::collections::HashSet<&str> = assigned_base_ids.iter().map(|s| s.as_str()).collect();
    let dropped: Vec<&Disjunction> = groups.iter().filter(|g| !assigned.contains(g.base_id.as_str())).collect();
    let dropped_base_ids: Vec<String> = dropped.iter().map(|g| g.base_id.clone()).collect();
    let dropped_penalty: i64 = dropped
        .iter()
        .map(|g| if g.required { PENALTY_REQUIRED } else { PENALTY_OPTIONAL })
        .sum();

    info!(
        vehicles = vehicles.len(),
        assigned = assigned_base_ids.len(),
        dropped = dropped_base_ids.len(),
        dropped_penalty,
        "solve complete"
    );

    SolveOutput {
        vehicles: vehicles.to_vec(),
        assignments: routes,
        dropped_base_ids,
    }
}

/// Find the cheapest (vehicle, position) to insert any one clone of `group`,
/// scored by marginal travel-only cost. Service time affects feasibility
/// through the time dimension but never the insertion cost itself.
fn best_insertion(
    group: &Disjunction,
    routes: &[Vec<usize>],
    vehicles: &[Vehicle],
    nodes: &[ExpandedNode],
    matrix: &TimeMatrix,
    max_stops_per_vehicle: usize,
) -> Option<(usize, usize, usize)> {
    let mut best: Option<(i64, usize, usize, usize)> = None;

    for &node_idx in &group.node_indices {
        for (vehicle_idx, vehicle) in vehicles.iter().enumerate() {
            if routes[vehicle_idx].len() >= max_stops_per_vehicle {
                continue;
            }
            for position in 0..=routes[vehicle_idx].len() {
                let mut candidate = routes[vehicle_idx].clone();
                candidate.insert(position, node_idx);
                if simulate_route(&candidate, nodes, matrix, vehicle.abs_start, vehicle.abs_end).is_some() {
                    let marginal_cost = marginal_travel_cost(&routes[vehicle_idx], position, node_idx, matrix);
                    if best.map(|(cost, ..)| marginal_cost < cost).unwrap_or(true) {
                        best = Some((marginal_cost, vehicle_idx, position, node_idx));
                    }
                }
            }
        }
    }

    best.map(|(_, v, p, n)| (v, p, n))
}

/// Travel-only marginal cost of inserting `node_idx` at `position` into
/// `order` (arc cost used to rank insertions and local-search moves).
fn marginal_travel_cost(order: &[usize], position: usize, node_idx: usize, matrix: &TimeMatrix) -> i64 {
    let prev_matrix_idx = if position == 0 { 0 } else { order[position - 1] + 1 };
    let next_matrix_idx = if position < order.len() { order[position] + 1 } else { 0 };
    let new_node_matrix_idx = node_idx + 1;

    let removed_arc = matrix.get(prev_matrix_idx, next_matrix_idx);
    let added = matrix.get(prev_matrix_idx, new_node_matrix_idx) + matrix.get(new_node_matrix_idx, next_matrix_idx);
    added - removed_arc
}

fn route_travel_cost(order: &[usize], matrix: &TimeMatrix) -> i64 {
    let mut prev = 0usize;
    let mut total = 0;
    for &node_idx in order {
        let idx = node_idx + 1;
        total += matrix.get(prev, idx);
        prev = idx;
    }
    total += matrix.get(prev, 0);
    total
}

/// 2-opt within a single vehicle's route plus relocate across vehicles,
/// looping until no move improves total travel-only cost or the wall clock
/// expires. Each move is accepted as soon as it strictly improves cost
/// while keeping every vehicle's absolute time window feasible.
fn local_search(routes: &mut [Vec<usize>], vehicles: &[Vehicle], nodes: &[ExpandedNode], matrix: &TimeMatrix, max_stops_per_vehicle: usize, deadline: Instant) {
    loop {
        if Instant::now() >= deadline {
            break;
        }
        let mut improved = false;

        for v in 0..routes.len() {
            if two_opt_pass(&mut routes[v], &vehicles[v], nodes, matrix) {
                improved = true;
            }
            if Instant::now() >= deadline {
                return;
            }
        }

        if relocate_pass(routes, vehicles, nodes, matrix, max_stops_per_vehicle) {
            improved = true;
        }

        if !improved {
            break;
        }
    }
}

fn two_opt_pass(order: &mut Vec<usize>, vehicle: &Vehicle, nodes: &[ExpandedNode], matrix: &TimeMatrix) -> bool {
    if order.len() < 3 {
        return false;
    }
    let current_cost = route_travel_cost(order, matrix);
    let n = order.len();

    for i in 0..n - 1 {
        for j in i + 2..n {
            let mut candidate = order.clone();
            candidate[i + 1..=j].reverse();
            let candidate_cost = route_travel_cost(&candidate, matrix);
            if candidate_cost < current_cost && simulate_route(&candidate, nodes, matrix, vehicle.abs_start, vehicle.abs_end).is_some() {
                *order = candidate;
                return true;
            }
        }
    }
    false
}

fn relocate_pass(routes: &mut [Vec<usize>], vehicles: &[Vehicle], nodes: &[ExpandedNode], matrix: &TimeMatrix, max_stops_per_vehicle: usize) -> bool {
    let total_cost: i64 = routes.iter().map(|r| route_travel_cost(r, matrix)).sum();

    for from in 0..routes.len() {
        for visit_idx in 0..routes[from].len() {
            let node_idx = routes[from][visit_idx];

            for to in 0..routes.len() {
                if to == from {
                    continue;
                }
                if routes[to].len() >= max_stops_per_vehicle {
                    continue;
                }

                for insert_pos in 0..=routes[to].len() {
                    let mut from_candidate = routes[from].clone();
                    from_candidate.remove(visit_idx);
                    let mut to_candidate = routes[to].clone();
                    to_candidate.insert(insert_pos, node_idx);

                    let from_sim = simulate_route(&from_candidate, nodes, matrix, vehicles[from].abs_start, vehicles[from].abs_end);
                    let to_sim = simulate_route(&to_candidate, nodes, matrix, vehicles[to].abs_start, vehicles[to].abs_end);

                    if from_sim.is_none() || to_sim.is_none() {
                        continue;
                    }

                    let other_cost: i64 = routes
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != from && *i != to)
                        .map(|(_, r)| route_travel_cost(r, matrix))
                        .sum();
                    let new_cost = route_travel_cost(&from_candidate, matrix) + route_travel_cost(&to_candidate, matrix) + other_cost;

                    if new_cost < total_cost {
                        routes[from] = from_candidate;
                        routes[to] = to_candidate;
                        return true;
                    }
                }
            }
        }
    }

    false
}
