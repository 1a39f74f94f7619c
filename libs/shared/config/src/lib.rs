use std::env;
use tracing::warn;

/// Scheduling knobs shared by every cell. Values come from the environment
/// with sensible clinic defaults so the engine works out of the box.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Length of one bookable slot, in minutes.
    pub slot_duration_minutes: i64,
    /// Hour of the day (0-23) that is never bookable.
    pub lunch_break_hour: u32,
    /// How far ahead appointments may be booked.
    pub max_advance_booking_days: i64,
}

const DEFAULT_SLOT_DURATION_MINUTES: i64 = 30;
const DEFAULT_LUNCH_BREAK_HOUR: u32 = 13;
const DEFAULT_MAX_ADVANCE_BOOKING_DAYS: i64 = 90;

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            slot_duration_minutes: env::var("SLOT_DURATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("SLOT_DURATION_MINUTES not set, using default");
                    DEFAULT_SLOT_DURATION_MINUTES
                }),
            lunch_break_hour: env::var("LUNCH_BREAK_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("LUNCH_BREAK_HOUR not set, using default");
                    DEFAULT_LUNCH_BREAK_HOUR
                }),
            max_advance_booking_days: env::var("MAX_ADVANCE_BOOKING_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("MAX_ADVANCE_BOOKING_DAYS not set, using default");
                    DEFAULT_MAX_ADVANCE_BOOKING_DAYS
                }),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.slot_duration_minutes > 0
            && self.lunch_break_hour < 24
            && self.max_advance_booking_days > 0
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            lunch_break_hour: DEFAULT_LUNCH_BREAK_HOUR,
            max_advance_booking_days: DEFAULT_MAX_ADVANCE_BOOKING_DAYS,
        }
    }
}
