//! Test fixtures for vrptw-core integration tests.
//!
//! Builder-pattern constructors for [`Target`]/[`Driver`] so scenario tests
//! read as a short list of assertions instead of struct-literal noise.

use vrptw_core::{DatetimeWindow, Driver, Target, TimeWindow};

pub struct TargetBuilder {
    id: String,
    lat: f64,
    lon: f64,
    stay_minutes: i64,
    required: bool,
    time_window: Option<TimeWindow>,
    datetime_window: Option<DatetimeWindow>,
}

impl TargetBuilder {
    pub fn new(id: &str, lat: f64, lon: f64) -> Self {
        Self {
            id: id.to_string(),
            lat,
            lon,
            stay_minutes: 10,
            required: true,
            time_window: None,
            datetime_window: None,
        }
    }

    pub fn stay_minutes(mut self, minutes: i64) -> Self {
        self.stay_minutes = minutes;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn time_window(mut self, start: i64, end: i64) -> Self {
        self.time_window = Some(TimeWindow { start, end });
        self
    }

    pub fn datetime_window(mut self, date: &str, start: &str, end: &str) -> Self {
        self.datetime_window = Some(DatetimeWindow {
            date: date.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        });
        self
    }

    pub fn build(self) -> Target {
        Target {
            id: self.id,
            lat: self.lat,
            lon: self.lon,
            stay_minutes: self.stay_minutes,
            required: self.required,
            time_window: self.time_window,
            datetime_window: self.datetime_window,
        }
    }
}

pub struct DriverBuilder {
    id: String,
    start_time: i64,
    end_time: i64,
}

impl DriverBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            start_time: 480,
            end_time: 1140,
        }
    }

    pub fn hours(mut self, start_time: i64, end_time: i64) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    pub fn build(self) -> Driver {
        Driver {
            id: self.id,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Targets on a regular grid anchored at `origin`, spaced `step_deg` apart,
/// `rows` x `cols` of them, ids `"G{row}{col}"`.
pub fn grid_targets(origin: (f64, f64), step_deg: f64, rows: usize, cols: usize, stay_minutes: i64) -> Vec<Target> {
    let mut out = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let id = format!("G{r}{c}");
            let lat = origin.0 + r as f64 * step_deg;
            let lon = origin.1 + c as f64 * step_deg;
            out.push(TargetBuilder::new(&id, lat, lon).stay_minutes(stay_minutes).build());
        }
    }
    out
}
