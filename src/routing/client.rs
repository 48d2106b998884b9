//! Blocking HTTP client for an OSRM-compatible routing service, feature-gated
//! behind `osrm` since it is the only dependency in this crate that reaches
//! the network.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;

use crate::geo::Coordinate;
use crate::route::Profile;

use super::error::RoutingError;
use super::parser::{parse_full_response, parse_summary_response};
use super::response::{OsrmResponse, RouteResponse, SummaryResponse};
use super::RoutingBackend;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 2;

fn profile_path(profile: Profile) -> &'static str {
    match profile {
        Profile::Driving => "driving",
        Profile::Walking => "walking",
    }
}

/// Thin HTTP client for an OSRM-compatible `/route/v1/{profile}/...` service.
///
/// Separate base URLs per profile, since driving and walking routes come
/// from distinct upstream OSRM deployments.
#[derive(Debug, Clone)]
pub struct OsrmRoutingClient {
    client: Client,
    driving_endpoint: String,
    walking_endpoint: String,
}

impl OsrmRoutingClient {
    /// Create a client pointed at the given per-profile OSRM endpoints
    /// (e.g. `http://localhost:5000`, `http://localhost:5001`).
    pub fn new(driving_endpoint: &str, walking_endpoint: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build routing http client");
        Self {
            client,
            driving_endpoint: driving_endpoint.trim_end_matches('/').to_string(),
            walking_endpoint: walking_endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint_for(&self, profile: Profile) -> &str {
        match profile {
            Profile::Driving => &self.driving_endpoint,
            Profile::Walking => &self.walking_endpoint,
        }
    }

    fn build_url(&self, start: Coordinate, dest: Coordinate, profile: Profile, full: bool) -> Result<Url, RoutingError> {
        let base = format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.endpoint_for(profile),
            profile_path(profile),
            start.lon,
            start.lat,
            dest.lon,
            dest.lat,
        );
        let mut url = Url::parse(&base)
            .map_err(|err| RoutingError::MalformedResponse(format!("bad routing URL: {err}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("overview", if full { "full" } else { "false" });
            pairs.append_pair("steps", "false");
            if full {
                pairs.append_pair("geometries", "geojson");
                pairs.append_pair("annotations", "true");
            }
        }
        Ok(url)
    }

    fn get_with_retry(&self, url: Url) -> Result<OsrmResponse, RoutingError> {
        let mut attempts = 0;
        loop {
            match self.client.get(url.clone()).send().and_then(|r| r.json::<OsrmResponse>()) {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    attempts += 1;
                    if attempts > MAX_RETRIES {
                        return Err(RoutingError::from(err));
                    }
                }
            }
        }
    }
}

impl RoutingBackend for OsrmRoutingClient {
    fn fetch(&self, start: Coordinate, dest: Coordinate, profile: Profile) -> Result<RouteResponse, RoutingError> {
        let url = self.build_url(start, dest, profile, true)?;
        let resp = self.get_with_retry(url)?;
        parse_full_response(resp)
    }

    fn fetch_summary(&self, start: Coordinate, dest: Coordinate, profile: Profile) -> Result<SummaryResponse, RoutingError> {
        let url = self.build_url(start, dest, profile, false)?;
        let resp = self.get_with_retry(url)?;
        parse_summary_response(resp)
    }
}
