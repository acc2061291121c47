use foundation::math::LatLng;
use reqwest::Client;
use serde::Deserialize;

use crate::lookup::{BoxFuture, ElevationLookup, LookupError};

/// Open Topo Data style elevation API.
///
/// `GET {api_url}?locations=lat,lng|lat,lng|...` answering
/// `{ "status": "OK", "results": [{ "elevation": 123.4 }, ...] }`.
#[derive(Debug, Clone)]
pub struct HttpElevationLookup {
    http: Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    status: String,
    #[serde(default)]
    results: Vec<ElevationResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    elevation: Option<f64>,
}

impl HttpElevationLookup {
    pub fn new(http: Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    async fn request(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>, LookupError> {
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[("locations", format_locations(points))])
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(LookupError::Status(status.to_string()));
        }
        parse_response(&body, points.len())
    }
}

impl ElevationLookup for HttpElevationLookup {
    fn lookup<'a>(
        &'a self,
        points: &'a [LatLng],
    ) -> BoxFuture<'a, Result<Vec<Option<f64>>, LookupError>> {
        Box::pin(self.request(points))
    }
}

/// `lat,lng` pairs with six decimals, joined by `|`.
pub fn format_locations(points: &[LatLng]) -> String {
    points
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lat_deg, p.lng_deg))
        .collect::<Vec<_>>()
        .join("|")
}

fn parse_response(body: &str, expected: usize) -> Result<Vec<Option<f64>>, LookupError> {
    let response: ElevationResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    if response.status != "OK" {
        let detail = response.error.unwrap_or_default();
        return Err(LookupError::Status(
            format!("{} {detail}", response.status).trim().to_string(),
        ));
    }
    if response.results.len() != expected {
        return Err(LookupError::Malformed(format!(
            "expected {expected} results, got {}",
            response.results.len()
        )));
    }
    Ok(response.results.into_iter().map(|r| r.elevation).collect())
}

#[cfg(test)]
mod tests {
    use super::{format_locations, parse_response};
    use crate::lookup::LookupError;
    use foundation::math::LatLng;

    #[test]
    fn locations_use_six_decimals_and_pipes() {
        let points = [LatLng::new(47.1, 8.123_456_78), LatLng::new(-1.0, -70.5)];
        assert_eq!(
            format_locations(&points),
            "47.100000,8.123457|-1.000000,-70.500000"
        );
    }

    #[test]
    fn parses_ok_response_with_nulls() {
        let body = r#"{"status":"OK","results":[{"elevation":412.5},{"elevation":null}]}"#;
        assert_eq!(parse_response(body, 2), Ok(vec![Some(412.5), None]));
    }

    #[test]
    fn non_ok_status_is_an_error() {
        let body = r#"{"status":"INVALID_REQUEST","error":"Too many locations"}"#;
        assert_eq!(
            parse_response(body, 1),
            Err(LookupError::Status(
                "INVALID_REQUEST Too many locations".to_string()
            ))
        );
    }

    #[test]
    fn wrong_count_and_garbage_are_malformed() {
        let body = r#"{"status":"OK","results":[{"elevation":1.0}]}"#;
        assert!(matches!(
            parse_response(body, 2),
            Err(LookupError::Malformed(_))
        ));
        assert!(matches!(
            parse_response("<html>", 1),
            Err(LookupError::Malformed(_))
        ));
    }
}
