use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::AnalysisError;
use crate::http::{build_http_client, error_chain_text, response_json_or_error};

/// The parts of a listing the pipeline uses.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSummary {
    pub property_id: String,
    pub area_m2: f64,
    pub rooms: u32,
    pub bathrooms: u32,
    /// `(localizedName, url)` in listing order.
    pub images: Vec<(String, String)>,
}

impl ListingSummary {
    /// Reads a `propertydetails` payload. Missing fields become zero or empty and are
    /// reported back as [`AnalysisError::MissingData`].
    pub fn from_payload(property_id: &str, payload: &Value) -> (Self, Vec<AnalysisError>) {
        let mut missing = Vec::new();
        let characteristics = payload.get("moreCharacteristics");
        let mut number = |key: &str| -> f64 {
            match characteristics.and_then(|section| section.get(key)).and_then(value_to_f64) {
                Some(value) => value,
                None => {
                    missing.push(AnalysisError::MissingData(format!(
                        "moreCharacteristics.{key}"
                    )));
                    0.0
                }
            }
        };
        let area_m2 = number("constructedArea").max(0.0);
        let rooms = number("roomNumber").max(0.0) as u32;
        let bathrooms = number("bathNumber").max(0.0) as u32;

        let mut images = Vec::new();
        match payload
            .get("multimedia")
            .and_then(|section| section.get("images"))
            .and_then(Value::as_array)
        {
            Some(rows) => {
                for (idx, row) in rows.iter().enumerate() {
                    let Some(url) = row
                        .get("url")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|url| !url.is_empty())
                    else {
                        missing.push(AnalysisError::MissingData(format!(
                            "multimedia.images[{idx}].url"
                        )));
                        continue;
                    };
                    let label = row
                        .get("localizedName")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    images.push((label.to_string(), url.to_string()));
                }
            }
            None => missing.push(AnalysisError::MissingData("multimedia.images".to_string())),
        }

        (
            Self {
                property_id: property_id.to_string(),
                area_m2,
                rooms,
                bathrooms,
                images,
            },
            missing,
        )
    }
}

pub trait ListingSource {
    fn fetch_listing(&self, property_id: &str) -> Result<ListingSummary, AnalysisError>;
}

/// RapidAPI client for the idealista `propertydetails` endpoint.
pub struct ListingClient {
    api_base: String,
    api_host: String,
    api_key: String,
    location: String,
    language: String,
    http: HttpClient,
}

impl ListingClient {
    pub fn new(
        api_base: &str,
        api_host: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_host: api_host.into(),
            api_key: api_key.into(),
            location: "es".to_string(),
            language: "es".to_string(),
            http: build_http_client(timeout)?,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> reqwest::Result<Self> {
        let mut client = Self::new(
            &config.listing_api_base,
            config.listing_api_host.clone(),
            config.rapidapi_key.trim(),
            config.http_timeout,
        )?;
        client.location = config.listing_location.clone();
        client.language = config.listing_language.clone();
        Ok(client)
    }
}

impl ListingSource for ListingClient {
    fn fetch_listing(&self, property_id: &str) -> Result<ListingSummary, AnalysisError> {
        let endpoint = format!("{}/propertydetails", self.api_base);
        let response = self
            .http
            .get(&endpoint)
            .query(&[
                ("propertyId", property_id),
                ("location", self.location.as_str()),
                ("language", self.language.as_str()),
            ])
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.api_host)
            .send()
            .map_err(|err| AnalysisError::ListingUnavailable(error_chain_text(&err)))?;
        let payload = response_json_or_error("idealista", response)
            .map_err(AnalysisError::ListingUnavailable)?;
        if !payload.is_object() {
            return Err(AnalysisError::ListingUnavailable(
                "idealista returned a non-object payload".to_string(),
            ));
        }

        let (summary, missing) = ListingSummary::from_payload(property_id, &payload);
        for err in &missing {
            warn!(property_id, error = %err, "listing field missing; using default");
        }
        info!(
            property_id,
            area_m2 = summary.area_m2,
            rooms = summary.rooms,
            bathrooms = summary.bathrooms,
            images = summary.images.len(),
            "listing fetched"
        );
        Ok(summary)
    }
}

/// Accepts a bare id or a listing URL such as
/// `https://www.idealista.com/inmueble/107442883/`.
pub fn property_id_from_input(input: &str) -> Result<String, AnalysisError> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        return Ok(trimmed.to_string());
    }
    let invalid = || AnalysisError::InvalidProperty(trimmed.to_string());

    let listing_path = Regex::new(r"/inmueble/(\d+)").map_err(|_| invalid())?;
    if let Some(id) = listing_path
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
    {
        return Ok(id.as_str().to_string());
    }

    let digit_run = Regex::new(r"\d{5,}").map_err(|_| invalid())?;
    digit_run
        .find_iter(trimmed)
        .max_by_key(|found| found.as_str().len())
        .map(|found| found.as_str().to_string())
        .ok_or_else(invalid)
}

fn value_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}
