//! Pipeline entry points for the dashboard.
//!
//! - `run_fetch`: One fetch-and-normalize pass into a fresh view
//! - `Poller`: Periodic polling with a countdown and manual refresh

pub mod countdown;
mod fetch;
mod poll;

pub use countdown::{Countdown, format_remaining};
pub use fetch::{poll_once, run_fetch};
pub use poll::{DashboardSnapshot, PollSettings, Poller};
