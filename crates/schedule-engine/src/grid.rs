//! Grid position mapping -- places a block inside a fixed-hour day column.
//!
//! The week view shows hours `[first_hour, first_hour + visible_hours)` with a
//! fixed pixel height per hour. A block's vertical offset comes from its start
//! time of day and its height from its duration; both are real-valued so that
//! partial minutes still produce proportional geometry.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::block::BlockSpan;
use crate::error::{EngineError, Result};

/// Fixed configuration of the calendar's day columns, supplied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Earliest visible hour (H0).
    pub first_hour: u32,
    /// Number of hours shown in a column.
    pub visible_hours: u32,
    /// Pixel height of one hour (P).
    pub hour_height: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            first_hour: 7,
            visible_hours: 16,
            hour_height: 80.0,
        }
    }
}

impl GridConfig {
    /// Check that the window lies inside one day and the hour height is usable.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidGrid` describing the first violated bound.
    pub fn validate(&self) -> Result<()> {
        if self.first_hour > 23 {
            return Err(EngineError::InvalidGrid(format!(
                "first_hour must be 0-23, got {}",
                self.first_hour
            )));
        }
        if self.visible_hours == 0 {
            return Err(EngineError::InvalidGrid(
                "visible_hours must be at least 1".to_string(),
            ));
        }
        if self.visible_hours > 24 - self.first_hour {
            return Err(EngineError::InvalidGrid(format!(
                "window {}+{} hours runs past midnight",
                self.first_hour, self.visible_hours
            )));
        }
        if !self.hour_height.is_finite() || self.hour_height <= 0.0 {
            return Err(EngineError::InvalidGrid(format!(
                "hour_height must be a positive number, got {}",
                self.hour_height
            )));
        }
        Ok(())
    }

    /// Total pixel height of one day column.
    pub fn column_height(&self) -> f64 {
        f64::from(self.visible_hours) * self.hour_height
    }

    /// Whether the block's start hour falls inside the visible window.
    ///
    /// [`grid_position`] never clips; renderers use this to decide what to draw.
    pub fn is_visible(&self, span: &BlockSpan) -> bool {
        let hour = span.start.hour();
        hour >= self.first_hour && hour - self.first_hour < self.visible_hours
    }
}

/// Pixel geometry of a block within its day column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPosition {
    /// Offset from the top of the column.
    pub top: f64,
    pub height: f64,
}

/// Map a block to its offset and height in a day column.
///
/// - `top = (startHour - H0) * P + (startMinute / 60) * P` (seconds, including
///   any fraction, add `(startSecond / 3600) * P`, keeping the mapping
///   continuous)
/// - `height = (durationMinutes / 60) * P`
///
/// Blocks outside the visible window get negative or oversized offsets; they
/// are not clipped.
pub fn grid_position(span: &BlockSpan, config: &GridConfig) -> GridPosition {
    let p = config.hour_height;
    let hour_offset = f64::from(span.start.hour()) - f64::from(config.first_hour);
    let minutes = f64::from(span.start.minute());
    let seconds =
        f64::from(span.start.second()) + f64::from(span.start.nanosecond()) / 1_000_000_000.0;

    let top = hour_offset * p + (minutes / 60.0) * p + (seconds / 3600.0) * p;
    let height = (span.duration_minutes() / 60.0) * p;

    GridPosition { top, height }
}
