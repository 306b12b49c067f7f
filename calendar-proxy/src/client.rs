use practice_calendar::{unwrap_envelope, CalendarEvent, EnvelopeError, ViewWindow};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("booking backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Reads bookings from the practice backend.
#[derive(Clone)]
pub struct BookingClient {
    http: reqwest::Client,
    base_url: String,
}

impl BookingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetches every booking in `window`. The envelope is unwrapped here and
    /// nowhere else. Records that do not decode are logged and skipped.
    pub async fn fetch(&self, window: &ViewWindow) -> Result<Vec<CalendarEvent>, ClientError> {
        let start = window.start.format("%Y-%m-%d").to_string();
        let end = window.end.format("%Y-%m-%d").to_string();

        debug!(%start, %end, "fetching bookings");

        let body = self
            .http
            .get(format!("{}/bookings", self.base_url))
            .query(&[("start", start), ("end", end)])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let records: Vec<Value> = unwrap_envelope(&body)?;
        let total = records.len();

        let events: Vec<CalendarEvent> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!(index, "skipping malformed booking: {err}");
                    None
                }
            })
            .collect();

        if events.len() < total {
            debug!(kept = events.len(), total, "dropped malformed bookings");
        }

        Ok(events)
    }
}
