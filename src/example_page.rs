//! Behaviour of the sample page bundled by the `home` entry.
//!
//! Nothing here runs on load: callers invoke [`load_people`] explicitly and supply the HTTP
//! capability through [`JsonFetcher`].

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use tracing::info;

/// Endpoint queried by the sample page.
pub const PEOPLE_ENDPOINT: &str = "https://swapi.dev/api/people/?page=1";

const DEFAULT_D: &str = "delta";

/// Injected capability performing a GET request and decoding the JSON body.
pub trait JsonFetcher {
    /// Fetch `url` and return its decoded body.
    fn fetch_json(&self, url: &str) -> Result<Value>;
}

impl<F> JsonFetcher for F
where
    F: Fn(&str) -> Result<Value>,
{
    fn fetch_json(&self, url: &str) -> Result<Value> {
        self(url)
    }
}

/// Build the sample component: a base object spread into a new one with extra keys.
///
/// Keys inserted after the spread override keys from the base.
pub fn compose_component(d: Option<&str>) -> Map<String, Value> {
    let base = [("a", "alpha"), ("b", "bravo")];
    let mut component: Map<String, Value> = base
        .into_iter()
        .map(|(key, value)| (key.to_string(), json!(value)))
        .collect();
    component.insert("c".into(), json!("charlie"));
    component.insert("d".into(), json!(d.unwrap_or(DEFAULT_D)));
    component
}

/// Request the first page of people and return every response received.
pub fn load_people<F: JsonFetcher + ?Sized>(fetcher: &F) -> Result<Vec<Value>> {
    let response = fetcher
        .fetch_json(PEOPLE_ENDPOINT)
        .with_context(|| format!("failed to fetch {PEOPLE_ENDPOINT}"))?;
    let responses = vec![response];
    info!(responses = ?responses, "loaded people");
    Ok(responses)
}
