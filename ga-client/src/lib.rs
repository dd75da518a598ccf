//! Google Analytics Data Export Client
//!
//! A blocking client for the legacy Google Analytics feeds: log in with
//! ClientLogin credentials, list the profiles an account can see, and fetch
//! date-ranged reports flattened into simple `name -> value` rows.
//!
//! # Features
//!
//! - Credential login with the auth token kept in zeroizing memory
//! - Profile id and date range validation before any request is sent
//! - Report and account feeds parsed into plain Rust types
//! - Injectable endpoints and timeouts for testing against mock servers
//! - Secure TLS using rustls (no OpenSSL dependencies)
//! - Well-typed errors using thiserror
//!
//! # Example
//!
//! ```no_run
//! use ga_client::AnalyticsClient;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = AnalyticsClient::new("me@example.com", "secret")?;
//!
//! client.set_profile("ga:12345")?;
//! client.set_date_range("2023-01-01", "2023-01-31")?;
//!
//! let rows = client.get_report([
//!     ("dimensions", "ga:date"),
//!     ("metrics", "ga:visits,ga:pageviews"),
//!     ("sort", "ga:date"),
//! ])?;
//! for row in &rows {
//!     println!("{:?} visits on {:?}", row.get("ga:visits"), row.get("ga:date"));
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod parser;
mod scope;

pub use client::{
    ACCOUNTS_URL, AnalyticsClient, AnalyticsClientBuilder, DEFAULT_SOURCE, DEFAULT_TIMEOUT,
    LOGIN_URL, REPORT_URL,
};
pub use error::AnalyticsError;
pub use parser::{Profile, ReportRow};
