//! Core data model: plain structures in, a plain plan out.
//!
//! Nothing here depends on how a caller obtained these values (HTTP, a CLI,
//! a test fixture) — that wiring is explicitly out of scope for this crate.

use serde::{Deserialize, Serialize};

/// One minute expressed as minutes-from-midnight of some reference day.
pub type Minutes = i64;

/// A floating time window (minutes-from-midnight), applicable on whichever
/// date a target ends up scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Minutes,
    pub end: Minutes,
}

/// An absolute time window bound to one specific calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatetimeWindow {
    /// ISO date, e.g. "2026-07-28".
    pub date: String,
    /// "HH:MM" local start.
    pub start: String,
    /// "HH:MM" local end.
    pub end: String,
}

/// A target (stop) the fleet may visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub stay_minutes: Minutes,
    pub required: bool,
    pub time_window: Option<TimeWindow>,
    pub datetime_window: Option<DatetimeWindow>,
}

impl Target {
    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

/// A driver available on some set of dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub start_time: Minutes,
    pub end_time: Minutes,
}

/// One stop within a route. Times are absolute minutes from the start of
/// date index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Base target id (no `@date` suffix).
    pub target_id: String,
    pub arrival_min: f64,
    pub depart_min: f64,
    pub travel_minutes: f64,
    pub stay_minutes: f64,
}

/// A single vehicle's (driver, date) route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub driver_id: String,
    pub stops: Vec<Stop>,
    pub travel_minutes: f64,
    pub stay_minutes: f64,
    pub end_time: f64,
    pub overtime_minutes: f64,
    pub return_travel_minutes: f64,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

/// All routes produced for a single date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: String,
    pub status: String,
    pub routes: Vec<Route>,
    pub unassigned: Vec<String>,
}

/// Top-level plan status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Success,
    NoSolution,
    Error,
}

/// Result of [`crate::plan::build_global_plan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub status: PlanStatus,
    pub message: Option<String>,
    pub dates: Vec<String>,
    pub schedules: Vec<Schedule>,
    pub unassigned: Vec<String>,
    pub warnings: Vec<String>,
}

impl Plan {
    pub(crate) fn error(message: impl Into<String>) -> Self {
        Plan {
            status: PlanStatus::Error,
            message: Some(message.into()),
            dates: Vec::new(),
            schedules: Vec::new(),
            unassigned: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn no_solution(dates: Vec<String>, all_target_ids: Vec<String>, warnings: Vec<String>) -> Self {
        Plan {
            status: PlanStatus::NoSolution,
            message: Some("No feasible solution found within time limit".to_string()),
            dates,
            schedules: Vec::new(),
            unassigned: all_target_ids,
            warnings,
        }
    }
}

/// Tunable knobs for [`crate::plan::build_global_plan`], following the
/// options-struct-with-sensible-defaults convention used throughout this
/// crate's planning pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Assumed average driving speed, used to turn great-circle distance
    /// into travel time.
    pub speed_kmph: f64,
    /// Wall-clock budget for the constructive + local-search solve phase.
    pub max_solve_seconds: u64,
    /// Hard cap on stops per (driver, date) vehicle.
    pub max_stops_per_vehicle: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            speed_kmph: 40.0,
            max_solve_seconds: 60,
            max_stops_per_vehicle: 15,
        }
    }
}

/// Disjunction miss-penalty for a required target. Dominates any plausible
/// travel sum so the solver maximizes visit count before minimizing travel.
pub(crate) const PENALTY_REQUIRED: i64 = 1_000_000_000;
/// Disjunction miss-penalty for an optional target.
pub(crate) const PENALTY_OPTIONAL: i64 = 500_000_000;

/// Held-Karp is exact and cheap up to this many non-depot stops; larger
/// routes fall back to 2-opt.
pub(crate) const HELD_KARP_MAX_STOPS: usize = 20;

/// Outer rounds for the 2-opt fallback in the re-sequencer.
pub(crate) const TWO_OPT_MAX_ROUNDS: usize = 3;

/// Minutes in a day, used to offset per-date absolute time windows.
pub(crate) const MINUTES_PER_DAY: Minutes = 1440;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_status_serializes_as_a_bare_string_not_a_nested_object() {
        assert_eq!(serde_json::to_string(&PlanStatus::Success).unwrap(), "\"success\"");
        assert_eq!(serde_json::to_string(&PlanStatus::NoSolution).unwrap(), "\"no_solution\"");
        assert_eq!(serde_json::to_string(&PlanStatus::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn plan_status_field_is_flat_in_the_serialized_plan() {
        let plan = Plan {
            status: PlanStatus::Success,
            message: None,
            dates: vec!["2026-07-28".to_string()],
            schedules: Vec::new(),
            unassigned: Vec::new(),
            warnings: Vec::new(),
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["status"], serde_json::json!("success"));
    }
}
