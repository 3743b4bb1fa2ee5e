//! Target expander: turns base targets into per-date node clones with
//! absolute time windows.

use std::collections::HashMap;

use crate::model::{Driver, Minutes, Target, MINUTES_PER_DAY};

/// A single (target, date) clone with an absolute time window.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedNode {
    /// `"{base_id}@{date}"` when more than one clone of a base exists,
    /// otherwise just `base_id`.
    pub node_id: String,
    pub base_id: String,
    pub lat: f64,
    pub lon: f64,
    pub stay_minutes: Minutes,
    pub required: bool,
    /// Absolute (start, end) in minutes from the start of date index 0.
    pub tw_abs: (Minutes, Minutes),
}

impl ExpandedNode {
    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

fn adjusted_end(start: Minutes, end: Minutes, stay: Minutes) -> Minutes {
    (start + 1).max(end - stay)
}

fn parse_hhmm(s: &str) -> Option<Minutes> {
    let (h, m) = s.split_once(':')?;
    let h: Minutes = h.parse().ok()?;
    let m: Minutes = m.parse().ok()?;
    Some(h * 60 + m)
}

/// Expand `targets` across `dates`, producing one or more [`ExpandedNode`]s
/// per base target. `drivers_by_date` is used only to compute each date's
/// fallback work window (min start / max end across that date's drivers,
/// falling back to (0, 1440) when a date has no drivers).
pub fn expand_targets(
    dates: &[String],
    targets: &[Target],
    drivers_by_date: &HashMap<String, Vec<Driver>>,
) -> Vec<ExpandedNode> {
    let date_offset: HashMap<&str, Minutes> = dates
        .iter()
        .enumerate()
        .map(|(idx, d)| (d.as_str(), idx as Minutes * MINUTES_PER_DAY))
        .collect();

    let day_work_window: HashMap<&str, (Minutes, Minutes)> = dates
        .iter()
        .map(|d| {
            let window = match drivers_by_date.get(d) {
                Some(drivers) if !drivers.is_empty() => (
                    drivers.iter().map(|drv| drv.start_time).min().unwrap(),
                    drivers.iter().map(|drv| drv.end_time).max().unwrap(),
                ),
                _ => (0, MINUTES_PER_DAY),
            };
            (d.as_str(), window)
        })
        .collect();

    let mut out = Vec::new();

    for target in targets {
        if let Some(dtw) = &target.datetime_window {
            if let Some(&offset) = date_offset.get(dtw.date.as_str()) {
                if let (Some(start_hhmm), Some(end_hhmm)) = (parse_hhmm(&dtw.start), parse_hhmm(&dtw.end)) {
                    let start = offset + start_hhmm;
                    let end = adjusted_end(start, offset + end_hhmm, target.stay_minutes);
                    out.push(ExpandedNode {
                        node_id: target.id.clone(),
                        base_id: target.id.clone(),
                        lat: target.lat,
                        lon: target.lon,
                        stay_minutes: target.stay_minutes,
                        required: target.required,
                        tw_abs: (start, end),
                    });
                    continue;
                }
            }
            // Date not in the plan's date list (or unparsable HH:MM): the
            // target simply produces no clone and surfaces in `unassigned`.
            continue;
        }

        if let Some(tw) = &target.time_window {
            for date in dates {
                let offset = date_offset[date.as_str()];
                let start = offset + tw.start;
                let end = adjusted_end(start, offset + tw.end, target.stay_minutes);
                out.push(ExpandedNode {
                    node_id: format!("{}@{}", target.id, date),
                    base_id: target.id.clone(),
                    lat: target.lat,
                    lon: target.lon,
                    stay_minutes: target.stay_minutes,
                    required: target.required,
                    tw_abs: (start, end),
                });
            }
            continue;
        }

        for date in dates {
            let offset = date_offset[date.as_str()];
            let (day_start, day_end) = day_work_window[date.as_str()];
            let start = offset + day_start;
            let end = adjusted_end(start, offset + day_end, target.stay_minutes);
            out.push(ExpandedNode {
                node_id: format!("{}@{}", target.id, date),
                base_id: target.id.clone(),
                lat: target.lat,
                lon: target.lon,
                stay_minutes: target.stay_minutes,
                required: target.required,
                tw_abs: (start, end),
            });
        }
    }

    out
}
