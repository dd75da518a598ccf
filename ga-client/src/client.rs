//! Analytics HTTP client implementation

use crate::error::AnalyticsError;
use crate::parser::{self, Profile, ReportRow};
use crate::scope::ReportScope;
use chrono::NaiveDate;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

/// ClientLogin endpoint that exchanges credentials for an auth token
pub const LOGIN_URL: &str = "https://www.google.com/accounts/ClientLogin";

/// Accounts feed listing the profiles visible to the user
pub const ACCOUNTS_URL: &str = "https://www.google.com/analytics/feeds/accounts/default";

/// Data feed that serves reports
pub const REPORT_URL: &str = "https://www.google.com/analytics/feeds/data";

/// Application identifier sent as `source` during login
pub const DEFAULT_SOURCE: &str = concat!("ga-client-", env!("CARGO_PKG_VERSION"));

/// Per-request timeout applied when no custom HTTP client builder is given
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
struct Endpoints {
    login: Url,
    accounts: Url,
    report: Url,
}

/// Authenticated client for the analytics data export feeds
///
/// Construction performs the login exchange, so every instance holds a
/// valid auth token. Each call issues at most one blocking request and
/// nothing is retried.
///
/// # Example
///
/// ```no_run
/// use ga_client::AnalyticsClient;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = AnalyticsClient::new("me@example.com", "secret")?;
///
/// for profile in client.get_website_profiles()? {
///     println!("{} ({:?})", profile.title, profile.profile_id);
/// }
///
/// client.set_profile("ga:12345")?;
/// client.set_date_range("2023-01-01", "2023-01-31")?;
/// let rows = client.get_report([("dimensions", "ga:date"), ("metrics", "ga:visits")])?;
/// for row in rows {
///     println!("{:?}", row);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AnalyticsClient {
    client: reqwest::blocking::Client,
    endpoints: Endpoints,
    auth_token: Zeroizing<String>,
    scope: ReportScope,
}

impl AnalyticsClient {
    /// Log in against the default endpoints
    ///
    /// The report range defaults to the month ending today.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Authentication` if the login exchange does not
    /// yield a token.
    pub fn new(email: &str, password: &str) -> Result<Self, AnalyticsError> {
        Self::builder().login(email, password)
    }

    /// Create a builder for configuring endpoints and HTTP behavior
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ga_client::AnalyticsClient;
    /// use std::time::Duration;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = AnalyticsClient::builder()
    ///     .login_url("http://localhost:1234/accounts/ClientLogin")?
    ///     .timeout(Duration::from_secs(5))
    ///     .login("me@example.com", "secret")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> AnalyticsClientBuilder {
        AnalyticsClientBuilder::new()
    }

    /// Select the profile that reports are fetched for
    ///
    /// `id` must start with `ga:` followed by one to ten digits.
    pub fn set_profile(&mut self, id: &str) -> Result<(), AnalyticsError> {
        self.scope.set_profile(id)
    }

    /// Set the report date range from two `YYYY-MM-DD` strings
    pub fn set_date_range(&mut self, start: &str, end: &str) -> Result<(), AnalyticsError> {
        self.scope.set_date_range(start, end)
    }

    /// Currently selected profile id
    pub fn profile_id(&self) -> Option<&str> {
        self.scope.profile_id()
    }

    /// Inclusive report date range
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        self.scope.date_range()
    }

    /// Fetch a report for the selected profile and date range
    ///
    /// `properties` are extra query parameters such as `metrics`, `dimensions`,
    /// `sort` or `filters`. The `ids`, `start-date` and `end-date` parameters are
    /// always taken from the client's scope.
    ///
    /// # Returns
    ///
    /// One row per feed entry, in document order.
    ///
    /// # Errors
    ///
    /// * `AnalyticsError::Validation` - No properties given or no profile selected
    /// * `AnalyticsError::Api` - Request failed or returned no content
    /// * `AnalyticsError::Parse` - Response is not well-formed XML
    pub fn get_report<I, K, V>(&self, properties: I) -> Result<Vec<ReportRow>, AnalyticsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params: Vec<(String, String)> = Vec::new();
        for (key, value) in properties {
            upsert(&mut params, key.into(), value.into());
        }
        if params.is_empty() {
            return Err(AnalyticsError::Validation(
                "get_report requires at least one query parameter".to_string(),
            ));
        }
        for (key, value) in self.scope.query_params()? {
            upsert(&mut params, key.to_string(), value);
        }

        let mut url = self.endpoints.report.clone();
        url.query_pairs_mut().extend_pairs(params.iter());

        let xml = self.get_authenticated(url)?;
        let rows = parser::parse_report(&xml)?;
        info!(rows = rows.len(), "Fetched report");
        Ok(rows)
    }

    /// List the profiles visible to the logged-in user
    ///
    /// # Errors
    ///
    /// * `AnalyticsError::Api` - Request failed or returned no content
    /// * `AnalyticsError::Parse` - Response is not well-formed XML
    pub fn get_website_profiles(&self) -> Result<Vec<Profile>, AnalyticsError> {
        let xml = self.get_authenticated(self.endpoints.accounts.clone())?;
        let profiles = parser::parse_profiles(&xml)?;
        info!(profiles = profiles.len(), "Fetched website profiles");
        Ok(profiles)
    }

    /// Build the `Authorization` header, marked sensitive
    fn authorization_header(&self) -> Result<HeaderValue, AnalyticsError> {
        let mut header_string = format!("GoogleLogin auth={}", self.auth_token.as_str());
        let header_value = HeaderValue::from_str(&header_string);
        header_string.zeroize();

        let mut header_value = header_value
            .map_err(|_| AnalyticsError::api("auth token is not a valid header value"))?;
        header_value.set_sensitive(true);
        Ok(header_value)
    }

    /// Issue an authenticated GET and return the non-empty response body
    fn get_authenticated(&self, url: Url) -> Result<String, AnalyticsError> {
        let authorization = self.authorization_header()?;
        debug!(url = %url, "Sending authenticated request");

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .map_err(|e| AnalyticsError::Api {
                reason: "request failed".to_string(),
                source: Some(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyticsError::api(format!("unexpected HTTP status {status}")));
        }

        let body = response.text().map_err(|e| AnalyticsError::Api {
            reason: "failed to read response body".to_string(),
            source: Some(e),
        })?;
        if body.is_empty() {
            return Err(AnalyticsError::api("response body was empty"));
        }
        Ok(body)
    }
}

impl fmt::Debug for AnalyticsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsClient")
            .field("endpoints", &self.endpoints)
            .field("auth_token", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Set `key` to `value`, keeping the position of an existing entry
fn upsert(params: &mut Vec<(String, String)>, key: String, value: String) {
    match params.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => params.push((key, value)),
    }
}

/// Perform the ClientLogin exchange and return the auth token
fn login(
    client: &reqwest::blocking::Client,
    url: Url,
    source: &str,
    email: &str,
    password: &str,
) -> Result<Zeroizing<String>, AnalyticsError> {
    debug!(url = %url, "Requesting auth token");

    let form = [
        ("accountType", "GOOGLE"),
        ("Email", email),
        ("Passwd", password),
        ("service", "analytics"),
        ("source", source),
    ];

    let response = client
        .post(url)
        .form(&form)
        .send()
        .map_err(|e| AnalyticsError::Authentication {
            reason: "login request failed".to_string(),
            source: Some(e),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AnalyticsError::authentication(format!(
            "login endpoint returned HTTP status {status}; check email and password"
        )));
    }

    let body = Zeroizing::new(response.text().map_err(|e| {
        AnalyticsError::Authentication {
            reason: "failed to read login response".to_string(),
            source: Some(e),
        }
    })?);
    if body.is_empty() {
        return Err(AnalyticsError::authentication(
            "login endpoint returned an empty response",
        ));
    }

    let token = parser::extract_auth_token(&body).ok_or_else(|| {
        AnalyticsError::authentication("login response did not contain an Auth token")
    })?;

    info!("Authenticated with analytics service");
    Ok(Zeroizing::new(token.to_string()))
}

/// Builder for configuring an analytics client
///
/// Endpoint overrides exist so tests can point the client at a mock server.
///
/// # Example
///
/// ```no_run
/// use ga_client::AnalyticsClient;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Mock endpoints
/// let client = AnalyticsClient::builder()
///     .login_url("http://localhost:1234/login")?
///     .accounts_url("http://localhost:1234/accounts")?
///     .report_url("http://localhost:1234/data")?
///     .login("me@example.com", "secret")?;
///
/// // Custom HTTP client
/// let client = AnalyticsClient::builder()
///     .client_builder(
///         reqwest::blocking::Client::builder()
///             .timeout(Duration::from_secs(10))
///             .use_rustls_tls()
///     )
///     .source("my-dashboard-v2")
///     .login("me@example.com", "secret")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AnalyticsClientBuilder {
    login_url: Option<Url>,
    accounts_url: Option<Url>,
    report_url: Option<Url>,
    source: Option<String>,
    timeout: Option<Duration>,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl AnalyticsClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            login_url: None,
            accounts_url: None,
            report_url: None,
            source: None,
            timeout: None,
            client_builder: None,
        }
    }

    /// Override the login endpoint
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::ClientInit` if the URL cannot be parsed.
    pub fn login_url(mut self, url: impl reqwest::IntoUrl) -> Result<Self, AnalyticsError> {
        self.login_url = Some(parse_url(url)?);
        Ok(self)
    }

    /// Override the accounts feed endpoint
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::ClientInit` if the URL cannot be parsed.
    pub fn accounts_url(mut self, url: impl reqwest::IntoUrl) -> Result<Self, AnalyticsError> {
        self.accounts_url = Some(parse_url(url)?);
        Ok(self)
    }

    /// Override the report data feed endpoint
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::ClientInit` if the URL cannot be parsed.
    pub fn report_url(mut self, url: impl reqwest::IntoUrl) -> Result<Self, AnalyticsError> {
        self.report_url = Some(parse_url(url)?);
        Ok(self)
    }

    /// Application identifier sent with the login request
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Bound every request, including login, by `timeout`
    ///
    /// Overrides any timeout set on a custom client builder.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom HTTP client builder
    ///
    /// `DEFAULT_TIMEOUT` is not applied to a custom builder; use
    /// [`timeout`](Self::timeout) or configure it on the builder itself.
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the HTTP client and log in
    ///
    /// # Errors
    ///
    /// * `AnalyticsError::ClientInit` - The HTTP client cannot be initialized
    /// * `AnalyticsError::Authentication` - Login did not yield a token
    pub fn login(self, email: &str, password: &str) -> Result<AnalyticsClient, AnalyticsError> {
        let endpoints = Endpoints {
            login: or_default_url(self.login_url, LOGIN_URL)?,
            accounts: or_default_url(self.accounts_url, ACCOUNTS_URL)?,
            report: or_default_url(self.report_url, REPORT_URL)?,
        };

        let builder = self.client_builder.unwrap_or_else(|| {
            reqwest::blocking::Client::builder()
                .use_rustls_tls()
                .timeout(DEFAULT_TIMEOUT)
        });
        let builder = match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };
        let client = builder
            .build()
            .map_err(|e| AnalyticsError::ClientInit(e.to_string()))?;

        let source = self.source.as_deref().unwrap_or(DEFAULT_SOURCE);
        let auth_token = login(&client, endpoints.login.clone(), source, email, password)?;

        Ok(AnalyticsClient {
            client,
            endpoints,
            auth_token,
            scope: ReportScope::default(),
        })
    }
}

impl Default for AnalyticsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_url(url: impl reqwest::IntoUrl) -> Result<Url, AnalyticsError> {
    url.into_url()
        .map_err(|e| AnalyticsError::ClientInit(format!("invalid endpoint URL: {e}")))
}

fn or_default_url(url: Option<Url>, default: &str) -> Result<Url, AnalyticsError> {
    match url {
        Some(url) => Ok(url),
        None => parse_url(default),
    }
}
