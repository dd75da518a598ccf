//! Basic usage example for the analytics client
//!
//! This example demonstrates how to:
//! - Log in with account credentials
//! - List the website profiles visible to the account
//! - Fetch a daily visits report for the first profile
//!
//! Credentials are read from `GA_EMAIL` and `GA_PASSWORD`. Set `RUST_LOG=debug`
//! to see each request.

use ga_client::AnalyticsClient;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let email = std::env::var("GA_EMAIL").expect("GA_EMAIL environment variable not set");
    let password =
        std::env::var("GA_PASSWORD").expect("GA_PASSWORD environment variable not set");

    println!("=== Logging in ===");
    let mut client = AnalyticsClient::builder()
        .timeout(Duration::from_secs(20))
        .login(&email, &password)?;
    let (start, end) = client.date_range();
    println!("✓ Logged in, default range {} to {}", start, end);

    println!("\n=== Website profiles ===");
    let profiles = client.get_website_profiles()?;
    for profile in &profiles {
        println!(
            "{} [{}] account={} web property={}",
            profile.title,
            profile.profile_id.as_deref().unwrap_or("?"),
            profile.account_name.as_deref().unwrap_or("?"),
            profile.web_profile_id.as_deref().unwrap_or("?"),
        );
    }

    let Some(profile_id) = profiles.iter().find_map(|p| p.profile_id.clone()) else {
        println!("No profiles available");
        return Ok(());
    };
    // Older feeds report bare numbers
    let profile_id = if profile_id.starts_with("ga:") {
        profile_id
    } else {
        format!("ga:{}", profile_id)
    };

    println!("\n=== Daily visits for {} ===", profile_id);
    client.set_profile(&profile_id)?;
    let rows = client.get_report([
        ("dimensions", "ga:date"),
        ("metrics", "ga:visits"),
        ("sort", "ga:date"),
    ])?;
    for row in &rows {
        println!(
            "{}: {}",
            row.get("ga:date").map(String::as_str).unwrap_or("?"),
            row.get("ga:visits").map(String::as_str).unwrap_or("0"),
        );
    }

    Ok(())
}
