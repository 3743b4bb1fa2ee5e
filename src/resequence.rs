//! Route re-sequencer: exact Held-Karp DP for small routes, 2-opt otherwise.
//! Only applied to routes with no time-windowed stop, since re-ordering is
//! feasibility-preserving only in that case.

use std::collections::HashMap;

use tracing::debug;

use crate::geo::{haversine_km, travel_time_minutes};
use crate::model::{Minutes, Route, Stop, Target, HELD_KARP_MAX_STOPS, TWO_OPT_MAX_ROUNDS};

/// Whether `route` is eligible for re-sequencing: at least 3 stops and none
/// of its stops' base targets carry a time window.
pub fn is_eligible(route: &Route, targets_by_id: &HashMap<&str, &Target>) -> bool {
    if route.stops.len() < 3 {
        return false;
    }
    route.stops.iter().all(|stop| {
        targets_by_id
            .get(stop.target_id.as_str())
            .map(|t| t.time_window.is_none() && t.datetime_window.is_none())
            .unwrap_or(true)
    })
}

/// Re-sequence `route` in place. No-op if `is_eligible` would return false
/// for it (callers are expected to check first; this is also safe to call
/// unconditionally).
pub fn resequence_route(route: &mut Route, depot: (f64, f64), targets_by_id: &HashMap<&str, &Target>, speed_kmph: f64, abs_start: Minutes, abs_end: Minutes) {
    if !is_eligible(route, targets_by_id) {
        return;
    }

    let m = route.stops.len();
    let mut points = Vec::with_capacity(m + 2);
    points.push(depot);
    for stop in &route.stops {
        let t = targets_by_id[stop.target_id.as_str()];
        points.push((t.lat, t.lon));
    }
    points.push(depot);

    let n = points.len();
    let mut dist = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let km = haversine_km(points[i], points[j]);
                dist[i][j] = travel_time_minutes(km, speed_kmph).unwrap_or(0.0);
            }
        }
    }

    let order: Vec<usize> = if m <= HELD_KARP_MAX_STOPS {
        debug!(stops = m, "re-sequencing via Held-Karp DP");
        held_karp_order(&dist, m)
    } else {
        debug!(stops = m, "re-sequencing via 2-opt");
        two_opt_order(&dist, m)
    };

    let stay_by_original_pos: Vec<f64> = route.stops.iter().map(|s| s.stay_minutes).collect();
    let target_id_by_original_pos: Vec<String> = route.stops.iter().map(|s| s.target_id.clone()).collect();

    let mut new_stops = Vec::with_capacity(m);
    let mut prev_depart = abs_start as f64;
    let mut total_travel = 0.0;
    let mut total_stay = 0.0;
    let mut prev_point_idx = 0usize; // depot in `points`/`dist`

    for &stop_pos in &order {
        let point_idx = stop_pos + 1; // points[0] is depot
        let travel = dist[prev_point_idx][point_idx];
        let arrival = prev_depart + travel;
        let stay = stay_by_original_pos[stop_pos];
        let depart = arrival + stay;

        new_stops.push(Stop {
            target_id: target_id_by_original_pos[stop_pos].clone(),
            arrival_min: arrival,
            depart_min: depart,
            travel_minutes: travel,
            stay_minutes: stay,
        });

        total_travel += travel;
        total_stay += stay;
        prev_depart = depart;
        prev_point_idx = point_idx;
    }

    let return_travel = dist[prev_point_idx][n - 1];
    let end_time = prev_depart + return_travel;
    total_travel += return_travel;

    route.stops = new_stops;
    route.travel_minutes = total_travel;
    route.stay_minutes = total_stay;
    route.end_time = end_time;
    route.return_travel_minutes = return_travel;
    route.overtime_minutes = (end_time - abs_end as f64).max(0.0);
}

/// Exact TSP via Held-Karp bitmask DP: depot fixed at position 0 and `n-1`
/// in `dist` (an (m+2)x(m+2) matrix), stops are indices `0..m` within
/// `dist`'s `1..=m` range. Returns the optimal visiting order as 0-based
/// stop indices.
fn held_karp_order(dist: &[Vec<f64>], m: usize) -> Vec<usize> {
    if m == 0 {
        return Vec::new();
    }
    if m == 1 {
        return vec![0];
    }

    let full_mask = 1usize << m;
    let depot = 0usize;
    let point = |stop: usize| stop + 1;

    // dp[mask][last] = cheapest cost to have visited `mask` (bitset over
    // stops) ending at stop `last`, starting from the depot.
    let mut dp = vec![vec![f64::INFINITY; m]; full_mask];
    let mut parent = vec![vec![usize::MAX; m]; full_mask];

    for s in 0..m {
        dp[1 << s][s] = dist[depot][point(s)];
    }

    for mask in 1..full_mask {
        for last in 0..m {
            if mask & (1 << last) == 0 || !dp[mask][last].is_finite() {
                continue;
            }
            let base_cost = dp[mask][last];
            for next in 0..m {
                if mask & (1 << next) != 0 {
                    continue;
                }
                let next_mask = mask | (1 << next);
                let candidate = base_cost + dist[point(last)][point(next)];
                if candidate < dp[next_mask][next] {
                    dp[next_mask][next] = candidate;
                    parent[next_mask][next] = last;
                }
            }
        }
    }

    let full = full_mask - 1;
    let last_point_idx = m + 1;
    let mut best_last = 0;
    let mut best_cost = f64::INFINITY;
    for last in 0..m {
        let cost = dp[full][last] + dist[point(last)][last_point_idx];
        if cost < best_cost {
            best_cost = cost;
            best_last = last;
        }
    }

    let mut order = Vec::with_capacity(m);
    let mut mask = full;
    let mut cur = best_last;
    loop {
        order.push(cur);
        let prev = parent[mask][cur];
        mask &= !(1 << cur);
        if prev == usize::MAX {
            break;
        }
        cur = prev;
    }
    order.reverse();
    order
}

/// Up to [`TWO_OPT_MAX_ROUNDS`] outer passes of 2-opt over the stop
/// permutation, depot fixed at both ends, inner loop runs until no
/// improving swap remains.
fn two_opt_order(dist: &[Vec<f64>], m: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..m).collect();
    let point = |stop: usize| stop + 1;
    let depot = 0usize;
    let last_point_idx = m + 1;

    let tour_cost = |order: &[usize]| -> f64 {
        let mut cost = dist[depot][point(order[0])];
        for w in order.windows(2) {
            cost += dist[point(w[0])][point(w[1])];
        }
        cost + dist[point(*order.last().unwrap())][last_point_idx]
    };

    for _ in 0..TWO_OPT_MAX_ROUNDS {
        let mut improved_this_round = false;
        loop {
            let current_cost = tour_cost(&order);
            let mut found = false;
            'search: for i in 0..m.saturating_sub(1) {
                for j in i + 1..m {
                    let mut candidate = order.clone();
                    candidate[i..=j].reverse();
                    if tour_cost(&candidate) < current_cost {
                        order = candidate;
                        found = true;
                        improved_this_round = true;
                        break 'search;
                    }
                }
            }
            if !found {
                break;
            }
        }
        if !improved_this_round {
            break;
        }
    }

    order
}
