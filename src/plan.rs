//! Top-level orchestration: wires the expander, matrix builder, solver,
//! extractor, sweeper, backfill repair and re-sequencer into one call.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::backfill::backfill;
use crate::expand::expand_targets;
use crate::extract::simulate_route;
use crate::matrix::build_time_matrix;
use crate::model::{Driver, Plan, PlanStatus, PlannerConfig, Schedule, Target};
use crate::resequence::resequence_route;
use crate::solver::{build_vehicles, solve};
use crate::sweep::sweep;

/// Plan every target onto the given drivers across `dates`, starting and
/// ending every route at `branch`.
///
/// A non-positive `config.speed_kmph` is not reported through the returned
/// `Plan` — it panics, the same way an invalid speed surfaces as an
/// uncaught failure in the underlying distance-to-time conversion (see
/// [`crate::geo::travel_time_minutes`]). Only "no dates" and "no drivers
/// anywhere" are reported as `PlanStatus::Error`.
pub fn build_global_plan(dates: Vec<String>, branch: (f64, f64), drivers_by_date: HashMap<String, Vec<Driver>>, targets: Vec<Target>, config: PlannerConfig) -> Plan {
    if dates.is_empty() {
        return Plan::error("No dates provided");
    }
    let any_drivers = dates.iter().any(|d| drivers_by_date.get(d).map(|v| !v.is_empty()).unwrap_or(false));
    if !any_drivers {
        return Plan::error("No drivers provided for given dates");
    }

    let all_target_ids: Vec<String> = targets.iter().map(|t| t.id.clone()).collect();

    let nodes = expand_targets(&dates, &targets, &drivers_by_date);
    let matrix = build_time_matrix(branch, &nodes, config.speed_kmph).expect("speed_kmph must be positive");
    let (vehicles, mut warnings) = build_vehicles(&dates, &drivers_by_date);

    if vehicles.is_empty() {
        return Plan::no_solution(dates, all_target_ids, warnings);
    }

    let solve_output = solve(&vehicles, &nodes, &matrix, config.max_stops_per_vehicle, config.max_solve_seconds);

    let mut schedules: Vec<Schedule> = dates
        .iter()
        .map(|date| Schedule {
            date: date.clone(),
            status: "success".to_string(),
            routes: Vec::new(),
            unassigned: Vec::new(),
        })
        .collect();

    for (vehicle, order) in solve_output.vehicles.iter().zip(solve_output.assignments.iter()) {
        let Some(sim) = simulate_route(order, &nodes, &matrix, vehicle.abs_start, vehicle.abs_end) else {
            continue;
        };
        let route = sim.into_route(vehicle.driver_id.clone(), vehicle.abs_end);
        schedules[vehicle.day_idx].routes.push(route);
    }

    let mut assigned_ids: HashSet<String> = schedules.iter().flat_map(|s| s.routes.iter()).flat_map(|r| r.stops.iter()).map(|s| s.target_id.clone()).collect();

    let swept = sweep(&dates, &drivers_by_date, &targets, &assigned_ids, branch, config.speed_kmph, config.max_stops_per_vehicle);
    for (date, routes) in swept {
        if let Some(day_idx) = dates.iter().position(|d| d == &date) {
            for route in routes {
                assigned_ids.extend(route.stops.iter().map(|s| s.target_id.clone()));
                schedules[day_idx].routes.push(route);
            }
        }
    }

    backfill(&mut schedules, &dates, &drivers_by_date);

    let targets_by_id: HashMap<&str, &Target> = targets.iter().map(|t| (t.id.as_str(), t)).collect();
    for (day_idx, date) in dates.iter().enumerate() {
        let offset = day_idx as i64 * crate::model::MINUTES_PER_DAY;
        let Some(drivers) = drivers_by_date.get(date) else {
            continue;
        };
        for route in schedules[day_idx].routes.iter_mut() {
            let Some(driver) = drivers.iter().find(|d| d.id == route.driver_id) else {
                continue;
            };
            resequence_route(route, branch, &targets_by_id, config.speed_kmph, offset + driver.start_time, offset + driver.end_time);
        }
    }

    let final_assigned: HashSet<String> = schedules.iter().flat_map(|s| s.routes.iter()).flat_map(|r| r.stops.iter()).map(|s| s.target_id.clone()).collect();

    let mut unassigned: Vec<String> = all_target_ids.iter().filter(|id| !final_assigned.contains(*id)).cloned().collect();
    unassigned.sort();

    if !unassigned.is_empty() {
        warn!(count = unassigned.len(), "targets left unassigned after sweeper and backfill");
    }
    warnings.sort();
    info!(
        dates = dates.len(),
        dropped_by_solver = solve_output.dropped_base_ids.len(),
        final_unassigned = unassigned.len(),
        "global plan complete"
    );

    Plan {
        status: PlanStatus::Success,
        message: None,
        dates,
        schedules,
        unassigned,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DatetimeWindow;

    fn driver(id: &str, start: i64, end: i64) -> Driver {
        Driver {
            id: id.to_string(),
            start_time: start,
            end_time: end,
        }
    }

    fn target(id: &str, lat: f64, lon: f64, stay: i64) -> Target {
        Target {
            id: id.to_string(),
            lat,
            lon,
            stay_minutes: stay,
            required: true,
            time_window: None,
            datetime_window: None,
        }
    }

    #[test]
    fn empty_dates_is_error() {
        let plan = build_global_plan(Vec::new(), (10.0, 123.0), HashMap::new(), Vec::new(), PlannerConfig::default());
        assert_eq!(plan.status, PlanStatus::Error);
        assert_eq!(plan.message.as_deref(), Some("No dates provided"));
    }

    #[test]
    fn no_drivers_anywhere_is_error() {
        let dates = vec!["2026-07-28".to_string()];
        let targets = vec![target("T1", 10.1, 123.1, 10)];
        let plan = build_global_plan(dates, (10.0, 123.0), HashMap::new(), targets, PlannerConfig::default());
        assert_eq!(plan.status, PlanStatus::Error);
        assert_eq!(plan.message.as_deref(), Some("No drivers provided for given dates"));
    }

    #[test]
    fn single_driver_two_targets_one_day_assigns_both() {
        let dates = vec!["2026-07-28".to_string()];
        let mut drivers_by_date = HashMap::new();
        drivers_by_date.insert("2026-07-28".to_string(), vec![driver("A", 480, 1140)]);
        let targets = vec![target("T1", 10.05, 123.05, 10), target("T2", 10.06, 123.06, 10)];

        let plan = build_global_plan(dates, (10.0, 123.0), drivers_by_date, targets, PlannerConfig::default());

        assert_eq!(plan.status, PlanStatus::Success);
        assert!(plan.unassigned.is_empty());
        let total_stops: usize = plan.schedules.iter().map(|s| s.routes.iter().map(|r| r.stops.len()).sum::<usize>()).sum();
        assert_eq!(total_stops, 2);
    }

    #[test]
    fn datetime_window_outside_dates_remains_unassigned() {
        let dates = vec!["2026-07-28".to_string()];
        let mut drivers_by_date = HashMap::new();
        drivers_by_date.insert("2026-07-28".to_string(), vec![driver("A", 480, 1140)]);
        let mut t = target("T1", 10.05, 123.05, 10);
        t.datetime_window = Some(DatetimeWindow {
            date: "2099-01-01".to_string(),
            start: "08:00".to_string(),
            end: "09:00".to_string(),
        });
        let targets = vec![t];

        let plan = build_global_plan(dates, (10.0, 123.0), drivers_by_date, targets, PlannerConfig::default());
        assert_eq!(plan.status, PlanStatus::Success);
        assert_eq!(plan.unassigned, vec!["T1".to_string()]);
    }

    #[test]
    #[should_panic(expected = "speed_kmph must be positive")]
    fn invalid_speed_panics_instead_of_returning_an_error_status() {
        let dates = vec!["2026-07-28".to_string()];
        let mut drivers_by_date = HashMap::new();
        drivers_by_date.insert("2026-07-28".to_string(), vec![driver("A", 480, 1140)]);
        let targets = vec![target("T1", 10.05, 123.05, 10)];
        let mut config = PlannerConfig::default();
        config.speed_kmph = 0.0;
        build_global_plan(dates, (10.0, 123.0), drivers_by_date, targets, config);
    }
}
