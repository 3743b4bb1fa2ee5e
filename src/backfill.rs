//! Driver-backfill repair: redistribute stops so all available drivers on
//! the earliest used day appear in the schedule. A load-leveling fairness
//! pass, not an optimization — it leaves donor route totals stale (stay
//! decremented, travel untouched), relying on the re-sequencer to tidy the
//! recipient afterward.

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::model::{Driver, Minutes, Route, Schedule, Stop, MINUTES_PER_DAY};

/// Repair `schedules` (one per date, in `dates` order) in place.
pub fn backfill(schedules: &mut [Schedule], dates: &[String], drivers_by_date: &HashMap<String, Vec<Driver>>) {
    let used_days: Vec<usize> = dates
        .iter()
        .enumerate()
        .filter(|(idx, _)| schedules[*idx].routes.iter().any(|r| !r.is_empty()))
        .map(|(idx, _)| idx)
        .collect();

    let Some(&first_day_idx) = used_days.first() else {
        return;
    };
    let first_day = &dates[first_day_idx];

    let available_first: HashSet<&str> = drivers_by_date.get(first_day).map(|ds| ds.iter().map(|d| d.id.as_str()).collect()).unwrap_or_default();
    let present_first: HashSet<&str> = schedules[first_day_idx].routes.iter().filter(|r| !r.is_empty()).map(|r| r.driver_id.as_str()).collect();
    let mut missing: Vec<&str> = available_first.difference(&present_first).copied().collect();
    missing.sort();

    if missing.is_empty() {
        return;
    }

    // Build the donor pool: (date_idx, route_idx) pairs in priority order.
    let mut donors: Vec<(usize, usize)> = Vec::new();
    if used_days.len() >= 2 {
        for &day_idx in &used_days[1..] {
            for (route_idx, route) in schedules[day_idx].routes.iter().enumerate() {
                if !route.is_empty() {
                    donors.push((day_idx, route_idx));
                }
            }
        }
        for (route_idx, route) in schedules[first_day_idx].routes.iter().enumerate() {
            if route.stops.len() > 1 {
                donors.push((first_day_idx, route_idx));
            }
        }
    } else {
        for (route_idx, route) in schedules[first_day_idx].routes.iter().enumerate() {
            if route.stops.len() > 1 {
                donors.push((first_day_idx, route_idx));
            }
        }
    }

    let offset = first_day_idx as Minutes * MINUTES_PER_DAY;
    let first_day_drivers = drivers_by_date.get(first_day).cloned().unwrap_or_default();

    let mut donor_cursor = 0usize;
    let mut backfilled = 0usize;
    let mut donated_stops = 0usize;

    for drv_id in missing {
        let Some(driver) = first_day_drivers.iter().find(|d| d.id == drv_id) else {
            continue;
        };

        let mut donated: Option<Stop> = None;
        while donor_cursor < donors.len() {
            let (day_idx, route_idx) = donors[donor_cursor];
            donor_cursor += 1;
            let route = &mut schedules[day_idx].routes[route_idx];
            if route.stops.is_empty() {
                continue;
            }
            let stop = route.stops.pop().unwrap();
            route.stay_minutes = (route.stay_minutes - stop.stay_minutes).max(0.0);
            donated = Some(stop);
            break;
        }

        let Some(stop) = donated else {
            break;
        };

        let arrival = (offset + driver.start_time) as f64;
        let depart = ((offset + driver.end_time) as f64).min(arrival + stop.stay_minutes);

        schedules[first_day_idx].routes.push(Route {
            driver_id: driver.id.clone(),
            stops: vec![Stop {
                target_id: stop.target_id,
                arrival_min: arrival,
                depart_min: depart,
                travel_minutes: 0.0,
                stay_minutes: stop.stay_minutes,
            }],
            travel_minutes: 0.0,
            stay_minutes: stop.stay_minutes,
            end_time: depart,
            overtime_minutes: 0.0,
            return_travel_minutes: 0.0,
        });

        backfilled += 1;
        donated_stops += 1;
    }

    if backfilled > 0 {
        info!(backfilled, donated_stops, first_day = %first_day, "driver backfill repaired schedule");
    }
}
