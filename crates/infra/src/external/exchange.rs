//! Currency exchange rates (`/latest/<BASE>`).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use trackers_core::{FetchError, TrackerResult};
use trackers_shopping::ExchangeRates;

use super::{HttpClient, RateSource};
use crate::config::ApiEndpoint;

const OPERATION: &str = "exchange rates";

#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    http: HttpClient,
    endpoint: ApiEndpoint,
}

impl ExchangeRateClient {
    pub fn new(http: HttpClient, endpoint: ApiEndpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn latest(&self, base: &str) -> TrackerResult<ExchangeRates> {
        let base = base.trim().to_ascii_uppercase();
        let url = HttpClient::url(
            OPERATION,
            &self.endpoint.base_url,
            &format!("latest/{base}"),
            &[],
        )?;
        let body: RatesResponse = self.http.get_json(OPERATION, url, &[]).await?;
        Ok(body.into_rates(&base)?)
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

impl RatesResponse {
    fn into_rates(self, requested: &str) -> Result<ExchangeRates, FetchError> {
        if self.result.as_deref().is_some_and(|r| r != "success") {
            let reason = self.error_type.unwrap_or_else(|| "unknown error".into());
            return Err(FetchError::network(OPERATION, reason));
        }
        if self.rates.is_empty() {
            return Err(FetchError::parse(OPERATION, "no rates in response"));
        }
        let base = self.base_code.unwrap_or_else(|| requested.to_string());
        Ok(ExchangeRates::new(&base, self.rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rates() {
        let body: RatesResponse = serde_json::from_str(
            r#"{"result":"success","base_code":"USD","rates":{"USD":1,"EUR":0.92,"gbp":0.79}}"#,
        )
        .unwrap();
        let rates = body.into_rates("USD").unwrap();
        assert_eq!(rates.base, "USD");
        assert_eq!(rates.rate("eur"), Some(0.92));
        assert_eq!(rates.rate("GBP"), Some(0.79));
    }

    #[test]
    fn api_error_is_reported() {
        let body: RatesResponse =
            serde_json::from_str(r#"{"result":"error","error-type":"unsupported-code"}"#).unwrap();
        let err = body.into_rates("XYZ").unwrap_err();
        assert!(err.message.contains("unsupported-code"));
    }
}
