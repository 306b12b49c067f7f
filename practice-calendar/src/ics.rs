use ics::{
    properties::{Description, DtEnd, DtStart, Location, RRule, Summary, TzName},
    Daylight, ICalendar, Standard, TimeZone,
};

use crate::{CalendarEvent, PRACTICE_TIME_ZONE};

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Exports `events` as an iCalendar feed in the practice's local time.
///
/// Events with an invalid start or end are left out.
pub fn to_ics<'a, I>(name: &'a str, events: I) -> ICalendar<'a>
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    let mut icalendar = ICalendar::new("2.0", name);
    icalendar.add_timezone(vienna());

    for event in events.into_iter().filter_map(CalendarEvent::to_ics) {
        icalendar.add_event(event);
    }

    icalendar
}

fn vienna() -> TimeZone<'static> {
    let mut cet_standard = Standard::new("19701025T030000", "+0200", "+0100");
    cet_standard.push(TzName::new("CET"));
    cet_standard.push(RRule::new("FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU"));

    let mut cest_daylight = Daylight::new("19700329T020000", "+0100", "+0200");
    cest_daylight.push(TzName::new("CEST"));
    cest_daylight.push(RRule::new("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"));

    let mut timezone = TimeZone::daylight(PRACTICE_TIME_ZONE.name(), cest_daylight);
    timezone.add_standard(cet_standard);
    timezone
}

impl CalendarEvent {
    #[must_use]
    pub fn to_ics(&self) -> Option<ics::Event<'_>> {
        let start = self.start?.format(TIMESTAMP_FORMAT).to_string();
        let end = self.end?.format(TIMESTAMP_FORMAT).to_string();

        let mut ics_event = ics::Event::new(self.id.as_str(), start.clone());

        ics_event.push(DtStart::new(start));
        ics_event.push(DtEnd::new(end));
        ics_event.push(Summary::new(self.title.as_str()));

        if let Some(room) = &self.room_name {
            ics_event.push(Location::new(room.as_str()));
        }

        if !self.staff_name.is_empty() {
            ics_event.push(Description::new(self.staff_name.as_str()));
        }

        Some(ics_event)
    }
}
