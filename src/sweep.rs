//! Greedy sweeper: deterministic fallback that assigns any targets the
//! solver dropped under its wall-clock limit.

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::geo::{haversine_km, travel_time_minutes};
use crate::model::{Driver, Minutes, Route, Stop, Target, MINUTES_PER_DAY};

/// Greedily append any still-unassigned base targets onto routes, one route
/// per (date, driver) that has room, walking dates/drivers in input order.
/// Returns the routes to append, keyed by date, plus the base ids it picked
/// up (for bookkeeping by the caller).
pub fn sweep(
    dates: &[String],
    drivers_by_date: &HashMap<String, Vec<Driver>>,
    targets: &[Target],
    assigned_ids: &HashSet<String>,
    depot: (f64, f64),
    speed_kmph: f64,
    max_stops_per_vehicle: usize,
) -> HashMap<String, Vec<Route>> {
    let mut remaining: Vec<&Target> = targets.iter().filter(|t| !assigned_ids.contains(&t.id)).collect();
    remaining.sort_by(|a, b| a.id.cmp(&b.id));

    let mut routes_by_date: HashMap<String, Vec<Route>> = HashMap::new();
    let mut picked_up = 0usize;

    for (day_idx, date) in dates.iter().enumerate() {
        if remaining.is_empty() {
            break;
        }
        let offset = day_idx as Minutes * MINUTES_PER_DAY;
        let Some(drivers) = drivers_by_date.get(date) else {
            continue;
        };

        for driver in drivers {
            if remaining.is_empty() {
                break;
            }
            if let Some(route) = build_sweep_route(&mut remaining, offset, driver, depot, speed_kmph, max_stops_per_vehicle) {
                picked_up += route.stops.len();
                routes_by_date.entry(date.clone()).or_default().push(route);
            }
        }
    }

    if picked_up > 0 {
        info!(picked_up, remaining = remaining.len(), "greedy sweeper assigned dropped targets");
    }

    routes_by_date
}

fn build_sweep_route(remaining: &mut Vec<&Target>, offset: Minutes, driver: &Driver, depot: (f64, f64), speed_kmph: f64, max_stops_per_vehicle: usize) -> Option<Route> {
    let abs_start = offset + driver.start_time;
    let abs_end = offset + driver.end_time;

    let mut stops = Vec::new();
    let mut current = abs_start as f64;
    let mut prev_location = depot;
    let mut total_travel = 0.0;
    let mut total_stay = 0.0;

    while !remaining.is_empty() && stops.len() < max_stops_per_vehicle {
        let target = remaining[0];
        let travel = travel_time_minutes(haversine_km(prev_location, target.location()), speed_kmph).unwrap_or(0.0);
        let stay = target.stay_minutes as f64;

        if current + travel + stay > abs_end as f64 {
            break;
        }

        remaining.remove(0);
        let arrival = current + travel;
        let depart = arrival + stay;

        stops.push(Stop {
            target_id: target.id.clone(),
            arrival_min: arrival,
            depart_min: depart,
            travel_minutes: travel,
            stay_minutes: stay,
        });

        total_travel += travel;
        total_stay += stay;
        current = depart;
        prev_location = target.location();
    }

    if stops.is_empty() {
        return None;
    }

    let return_travel = travel_time_minutes(haversine_km(prev_location, depot), speed_kmph).unwrap_or(0.0);
    let end_time = current + return_travel;
    total_travel += return_travel;

    Some(Route {
        driver_id: driver.id.clone(),
        stops,
        travel_minutes: total_travel,
        stay_minutes: total_stay,
        end_time,
        overtime_minutes: (end_time - abs_end as f64).max(0.0),
        return_travel_minutes: return_travel,
    })
}
