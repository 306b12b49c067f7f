use std::net::SocketAddr;
use std::process;

use getopts::{Matches, Options};
use tokio::time::Duration;

pub struct Args {
    pub address: SocketAddr,
    pub backend: String,
    pub refresh: Duration,
    pub horizon_weeks: u32,
    pub row_height: f64,
    pub cache_capacity: usize,
}

pub enum Command {
    Run(Args),
    Help(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Getopts(#[from] getopts::Fail),
    #[error("Provided value for option '{option}' is invalid: {reason}")]
    Invalid { option: &'static str, reason: String },
    #[error("Missing required option '--backend'")]
    MissingBackend,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "b",
        "backend",
        "Base URL of the booking backend [Required]",
        "URL",
    );
    opts.optopt(
        "r",
        "refresh",
        "Seconds between booking refreshes [Default: 60]",
        "SECONDS",
    );
    opts.optopt(
        "w",
        "horizon",
        "Weeks of bookings kept around today [Default: 15]",
        "WEEKS",
    );
    opts.optopt(
        "",
        "row-height",
        "Pixel height of one hour in the time grid [Default: 60]",
        "PIXELS",
    );
    opts.optopt(
        "c",
        "cache-capacity",
        "Number of laid-out windows to memoize [Default: 256]",
        "ENTRIES",
    );
    opts
}

pub fn try_parse<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let opts = opts();
    let matches = opts.parse(args)?;

    if matches.opt_present("help") {
        return Ok(Command::Help(
            opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))),
        ));
    }

    let address = get_or(&matches, "address", SocketAddr::from(([127, 0, 0, 1], 8080)))?;

    let backend = matches
        .opt_str("backend")
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .ok_or(CliError::MissingBackend)?;

    let refresh_secs: u64 = get_or(&matches, "refresh", 60)?;
    if refresh_secs == 0 {
        return Err(invalid("refresh", "must be at least one second"));
    }

    let horizon_weeks = get_or(&matches, "horizon", 15)?;

    let row_height: f64 = get_or(&matches, "row-height", 60.0)?;
    if !row_height.is_finite() || row_height <= 0.0 {
        return Err(invalid("row-height", "must be a positive number"));
    }

    let cache_capacity = get_or(&matches, "cache-capacity", 256)?;

    Ok(Command::Run(Args {
        address,
        backend,
        refresh: Duration::from_secs(refresh_secs),
        horizon_weeks,
        row_height,
        cache_capacity,
    }))
}

pub fn parse(args: Vec<String>) -> Args {
    match try_parse(args) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help(usage)) => {
            println!("{usage}");
            process::exit(0);
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}

fn get_or<T>(matches: &Matches, option: &'static str, default: T) -> Result<T, CliError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    matches
        .opt_get_default(option, default)
        .map_err(|err| invalid(option, err.to_string()))
}

fn invalid(option: &'static str, reason: impl Into<String>) -> CliError {
    CliError::Invalid {
        option,
        reason: reason.into(),
    }
}
