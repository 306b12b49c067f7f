use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::{CalendarEvent, DayColumn, LayoutRect, ViewWindow};

/// Height of one hour row in the time grid.
pub const ROW_HEIGHT_PIXELS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub row_height_pixels: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            row_height_pixels: ROW_HEIGHT_PIXELS,
        }
    }
}

impl LayoutOptions {
    #[must_use]
    pub fn pixels_per_minute(&self) -> f64 {
        self.row_height_pixels / 60.0
    }
}

/// Lays out the events of a single day column with the default row height.
#[must_use]
pub fn layout_day(events: &[CalendarEvent], view_date: NaiveDate) -> Vec<LayoutRect> {
    layout_day_with(events, view_date, &LayoutOptions::default())
}

/// Lays out the events starting on `view_date`.
///
/// Only events starting in the very same minute are stacked; an event at 09:30
/// next to one running 09:00-10:00 gets its own, overlapping rectangle. A stacked
/// group shares the rectangle of its first member, split evenly in input order.
///
/// Invalid timestamps are not rejected: they surface as `NaN` in the geometry.
#[must_use]
pub fn layout_day_with(
    events: &[CalendarEvent],
    view_date: NaiveDate,
    options: &LayoutOptions,
) -> Vec<LayoutRect> {
    let mut groups: BTreeMap<NaiveDateTime, Vec<&CalendarEvent>> = BTreeMap::new();

    for event in events {
        let Some(start) = event.start.filter(|start| start.date() == view_date) else {
            continue;
        };

        groups
            .entry(truncate_to_minute(start))
            .or_default()
            .push(event);
    }

    let pixels_per_minute = options.pixels_per_minute();
    let mut rects = Vec::with_capacity(events.len());

    for members in groups.values() {
        let leader = members[0];
        let top = leader.minutes_from_midnight() * pixels_per_minute;
        let height = leader.duration_minutes() * pixels_per_minute;

        let stack_count = members.len();
        let slice = height / stack_count as f64;

        for (stack_index, event) in members.iter().enumerate() {
            // The first member sits at the slot's own top, even when the
            // slice height is NaN.
            let top = match stack_index {
                0 => top,
                _ => top + stack_index as f64 * slice,
            };

            rects.push(LayoutRect {
                event_id: event.id.clone(),
                top,
                height: slice,
                stack_index,
                stack_count,
            });
        }
    }

    rects
}

/// Lays out every day of `window`. Day, week and month views all go through
/// the same per-day algorithm.
#[must_use]
pub fn layout_window(
    events: &[CalendarEvent],
    window: &ViewWindow,
    options: &LayoutOptions,
) -> Vec<DayColumn> {
    window
        .days()
        .map(|date| DayColumn {
            date,
            rects: layout_day_with(events, date, options),
        })
        .collect()
}

fn truncate_to_minute(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .with_second(0)
        .and_then(|timestamp| timestamp.with_nanosecond(0))
        .unwrap_or(timestamp)
}
