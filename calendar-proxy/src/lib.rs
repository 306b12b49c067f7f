pub mod cli;
pub mod client;
pub mod periodic;
pub mod server;
pub mod state;

pub use client::{BookingClient, ClientError};
pub use periodic::PeriodicTask;
pub use server::router;
pub use state::{AppState, Selection, Snapshot};
