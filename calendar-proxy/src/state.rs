use std::sync::Arc;

use chrono::{Local, NaiveDate};
use practice_calendar::{
    fingerprint, layout_window, CalendarEvent, ChangeDetector, DayColumn, LayoutOptions,
    ViewWindow,
};
use quick_cache::sync::Cache;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::{BookingClient, ClientError};

/// What a request wants to see: a window, optionally narrowed to one staff
/// member and/or one room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub window: ViewWindow,
    pub staff: Option<String>,
    pub room: Option<String>,
}

impl Selection {
    pub fn new(window: ViewWindow) -> Self {
        Self {
            window,
            staff: None,
            room: None,
        }
    }

    fn select(&self, events: &[CalendarEvent]) -> Vec<CalendarEvent> {
        self.window
            .filter(events)
            .filter(|event| self.staff.as_ref().map_or(true, |staff| &event.staff_id == staff))
            .filter(|event| {
                self.room
                    .as_ref()
                    .map_or(true, |room| event.room_id.as_ref() == Some(room))
            })
            .cloned()
            .collect()
    }
}

/// Bookings of the horizon window as of the last refresh that changed anything.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub window: ViewWindow,
    pub events: Arc<Vec<CalendarEvent>>,
    pub version: u64,
}

#[derive(Default)]
struct Current {
    detector: ChangeDetector,
    snapshot: Option<Snapshot>,
}

type LayoutKey = (u64, Selection);

pub struct AppState {
    client: BookingClient,
    options: LayoutOptions,
    horizon_weeks: u32,
    current: RwLock<Current>,
    layouts: Cache<LayoutKey, Arc<Vec<DayColumn>>>,
}

impl AppState {
    pub fn new(
        client: BookingClient,
        options: LayoutOptions,
        horizon_weeks: u32,
        cache_capacity: usize,
    ) -> Self {
        Self {
            client,
            options,
            horizon_weeks,
            current: RwLock::new(Current::default()),
            layouts: Cache::new(cache_capacity.max(1)),
        }
    }

    pub async fn refresh(&self) -> Result<bool, ClientError> {
        self.refresh_around(Local::now().date_naive()).await
    }

    /// Re-fetches the horizon around `center`. The snapshot is only replaced,
    /// and its version bumped, when the bookings actually changed.
    pub async fn refresh_around(&self, center: NaiveDate) -> Result<bool, ClientError> {
        let Some(window) = ViewWindow::around(center, self.horizon_weeks) else {
            warn!(%center, "horizon window is out of range, skipping refresh");
            return Ok(false);
        };

        let events = self.client.fetch(&window).await?;
        let content = fingerprint(&events);

        let mut current = self.current.write().await;

        if !current.detector.observe(content) {
            if let Some(snapshot) = current.snapshot.as_mut() {
                snapshot.window = window;
            }
            debug!("bookings unchanged");
            return Ok(false);
        }

        let version = current.detector.version();
        info!(version, events = events.len(), "bookings updated");

        current.snapshot = Some(Snapshot {
            window,
            events: Arc::new(events),
            version,
        });

        Ok(true)
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.current.read().await.snapshot.clone()
    }

    /// Events for `selection`, served from the snapshot when it covers the
    /// window and fetched on demand otherwise.
    pub async fn events(&self, selection: &Selection) -> Result<Vec<CalendarEvent>, ClientError> {
        let (_, events) = self.source(&selection.window).await?;
        Ok(selection.select(&events))
    }

    /// Day columns for `selection`. Layouts computed from the snapshot are
    /// memoized per snapshot version; on-demand fetches are not.
    pub async fn layout(&self, selection: &Selection) -> Result<Arc<Vec<DayColumn>>, ClientError> {
        let (version, events) = self.source(&selection.window).await?;

        let key = version.map(|version| (version, selection.clone()));

        if let Some(columns) = key.as_ref().and_then(|key| self.layouts.get(key)) {
            debug!("layout cache hit");
            return Ok(columns);
        }

        let selected = selection.select(&events);
        let columns = Arc::new(layout_window(&selected, &selection.window, &self.options));

        if let Some(key) = key {
            self.layouts.insert(key, Arc::clone(&columns));
        }

        Ok(columns)
    }

    async fn source(
        &self,
        window: &ViewWindow,
    ) -> Result<(Option<u64>, Arc<Vec<CalendarEvent>>), ClientError> {
        if let Some(snapshot) = self
            .current
            .read()
            .await
            .snapshot
            .as_ref()
            .filter(|snapshot| snapshot.window.covers(window))
        {
            return Ok((Some(snapshot.version), Arc::clone(&snapshot.events)));
        }

        debug!(start = %window.start, end = %window.end, "window outside snapshot, fetching");
        let events = self.client.fetch(window).await?;
        Ok((None, Arc::new(events)))
    }
}
