//! Login and feed response parsing

use crate::error::AnalyticsError;
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::HashMap;
use tracing::warn;

/// One report entry flattened into `field name -> value`
///
/// Dimensions and metrics share the same key space.
pub type ReportRow = HashMap<String, String>;

/// A reporting profile listed by the accounts feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// Human readable profile title
    pub title: String,
    /// Feed entry id
    pub id: String,
    /// `ga:accountId` property
    pub account_id: Option<String>,
    /// `ga:accountName` property
    pub account_name: Option<String>,
    /// `ga:profileId` property
    pub profile_id: Option<String>,
    /// `ga:webPropertyId` property
    pub web_profile_id: Option<String>,
}

/// Extract the token from a line-oriented login response
///
/// Returns the remainder of the first line that starts with `Auth=`, or
/// `None` if there is no such line or the token is empty.
pub(crate) fn extract_auth_token(body: &str) -> Option<&str> {
    body.lines()
        .find_map(|line| line.strip_prefix("Auth="))
        .map(str::trim_end)
        .filter(|token| !token.is_empty())
}

/// Parse a data feed into one row per `<entry>`, in document order
pub(crate) fn parse_report(xml: &str) -> Result<Vec<ReportRow>, AnalyticsError> {
    let document = parse_document(xml)?;

    let rows = elements(document.root(), "entry")
        .map(|entry| {
            let mut row = ReportRow::new();
            // Metrics go second so they win on a name clash
            for tag in ["dimension", "metric"] {
                for node in elements(entry, tag) {
                    row.insert(attribute(node, "name"), attribute(node, "value"));
                }
            }
            row
        })
        .collect();

    Ok(rows)
}

/// Parse an accounts feed into one profile per `<entry>`, in document order
pub(crate) fn parse_profiles(xml: &str) -> Result<Vec<Profile>, AnalyticsError> {
    let document = parse_document(xml)?;
    Ok(elements(document.root(), "entry").map(parse_profile).collect())
}

/// Parse a feed, accepting a DOCTYPE declaration
fn parse_document(xml: &str) -> Result<Document<'_>, AnalyticsError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(xml, options)?)
}

fn parse_profile(entry: Node<'_, '_>) -> Profile {
    let properties: HashMap<&str, &str> = elements(entry, "property")
        .map(|p| (p.attribute("name").unwrap_or(""), p.attribute("value").unwrap_or("")))
        .collect();
    let property = |name: &str| properties.get(name).map(|v| v.to_string());

    Profile {
        title: first_text(entry, "title"),
        id: first_text(entry, "id"),
        account_id: property("ga:accountId"),
        account_name: property("ga:accountName"),
        profile_id: property("ga:profileId"),
        web_profile_id: property("ga:webPropertyId"),
    }
}

/// Descendant elements with the given local name, ignoring namespace prefixes
fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

fn attribute(node: Node<'_, '_>, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_string()
}

/// Text content of the first descendant element named `tag`, or empty if absent
fn first_text(entry: Node<'_, '_>, tag: &'static str) -> String {
    match elements(entry, tag).next() {
        Some(node) => node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect(),
        None => {
            warn!(tag, "Profile entry has no element, using empty value");
            String::new()
        }
    }
}
