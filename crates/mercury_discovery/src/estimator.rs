use mercury_core::Calibration;
use serde::Serialize;

const WINDOW_BUFFER: i64 = 1000;

/// A half-open story id range `[start_id, end_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdWindow {
    pub estimated_old_id: i64,
    pub start_id: i64,
    pub end_id: i64,
}

impl IdWindow {
    /// Ids in the window that are multiples of `step`, ascending.
    pub fn sample(&self, step: i64, limit: Option<usize>) -> Vec<i64> {
        if step <= 0 || self.start_id >= self.end_id {
            return Vec::new();
        }
        let first = self.start_id + (step - self.start_id.rem_euclid(step)) % step;
        let ids = (first..self.end_id).step_by(step as usize);
        match limit {
            Some(limit) => ids.take(limit).collect(),
            None => ids.collect(),
        }
    }
}

/// Linear publication-rate estimate of where stories from `days_back` days
/// ago live, padded on both sides.
pub fn estimate_window(calibration: &Calibration, days_back: u32) -> IdWindow {
    let published_since = (calibration.daily_rate * f64::from(days_back)) as i64;
    let estimated_old_id = calibration.current_max_id.saturating_sub(published_since);
    IdWindow {
        estimated_old_id,
        start_id: estimated_old_id
            .saturating_sub(WINDOW_BUFFER)
            .max(calibration.absolute_floor),
        end_id: estimated_old_id.saturating_add(WINDOW_BUFFER),
    }
}

/// The `span` ids just below the current maximum.
pub fn recent_window(calibration: &Calibration, span: i64) -> IdWindow {
    IdWindow {
        estimated_old_id: calibration.current_max_id,
        start_id: calibration.current_max_id.saturating_sub(span),
        end_id: calibration.current_max_id,
    }
}
