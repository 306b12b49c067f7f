use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use practice_calendar::{to_ics, ViewMode, ViewWindow};
use serde::Deserialize;
use tracing::error;

use crate::client::ClientError;
use crate::state::{AppState, Selection};

const FEED_NAME: &str = "practice-calendar";

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/calendar/layout", get(handle_layout))
        .route("/calendar/events", get(handle_events))
        .route("/calendar.ics", get(handle_ics))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub view: ViewMode,
    pub staff: Option<String>,
    pub room: Option<String>,
}

impl CalendarQuery {
    fn selection(self) -> Result<Selection, ApiError> {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());

        let window = ViewWindow::new(date, self.view).ok_or_else(|| {
            ApiError::BadRequest(format!("no {} view available around {date}", self.view))
        })?;

        Ok(Selection {
            window,
            staff: self.staff,
            room: self.room,
        })
    }
}

pub enum ApiError {
    BadRequest(String),
    Upstream(ClientError),
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        Self::Upstream(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Upstream(err) => {
                error!("{err}");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Failed to load bookings: {err}"),
                )
                    .into_response()
            }
        }
    }
}

async fn handle_layout(
    State(state): State<SharedState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, ApiError> {
    let columns = state.layout(&query.selection()?).await?;
    Ok(Json(columns.as_slice()).into_response())
}

async fn handle_events(
    State(state): State<SharedState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, ApiError> {
    let events = state.events(&query.selection()?).await?;
    Ok(Json(events).into_response())
}

async fn handle_ics(
    State(state): State<SharedState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, ApiError> {
    let events = state.events(&query.selection()?).await?;

    Ok((
        [("content-type", "text/calendar")],
        to_ics(FEED_NAME, &events).to_string(),
    )
        .into_response())
}
