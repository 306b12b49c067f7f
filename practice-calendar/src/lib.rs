mod envelope;
mod error;
mod layout;
mod memo;
mod structs;
mod window;

#[cfg(feature = "ics")]
mod ics;

pub use envelope::{unwrap_envelope, unwrap_value};
pub use error::{EnvelopeError, ViewModeError};
pub use layout::{layout_day, layout_day_with, layout_window, LayoutOptions, ROW_HEIGHT_PIXELS};
pub use memo::{fingerprint, ChangeDetector};
pub use structs::{
    from_epoch_millis, parse_timestamp, parse_timestamp_in, CalendarEvent, DayColumn, LayoutRect,
    DEFAULT_COLOR, PRACTICE_TIME_ZONE,
};
pub use window::{navigate, DayRange, ViewMode, ViewWindow};

#[cfg(feature = "ics")]
pub use crate::ics::to_ics;
