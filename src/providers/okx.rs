use crate::core::error::FetchError;
use crate::core::rate::{HistorySample, Instrument, RateSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const LENDING_INFO_PATH: &str = "/priapi/v2/financial/market-lending-info";
const LENDING_HISTORY_PATH: &str = "/priapi/v2/financial/market-lending-history";

/// The endpoints reject clients without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0";

/// Reads lending rates from OKX's public market-lending endpoints.
pub struct OkxSource {
    base_url: String,
    client: reqwest::Client,
}

impl OkxSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(OkxSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch_list(&self, url: &str) -> Result<Vec<Value>, FetchError> {
        debug!("Requesting lending data from {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let text = response.text().await?;
        let envelope: Value = serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse lending response");
            FetchError::Malformed(format!("invalid JSON: {e}"))
        })?;
        extract_list(envelope)
    }
}

/// Pulls `data.list` out of the envelope. A single object stands for a
/// one-element list.
fn extract_list(envelope: Value) -> Result<Vec<Value>, FetchError> {
    let list = match envelope {
        Value::Object(mut root) => match root.remove("data") {
            Some(Value::Object(mut data)) => data.remove("list"),
            _ => None,
        },
        _ => None,
    };

    match list {
        Some(Value::Array(items)) => Ok(items),
        Some(item @ Value::Object(_)) => Ok(vec![item]),
        Some(_) => Err(FetchError::Malformed("data.list is not a list".to_string())),
        None => Err(FetchError::Malformed("missing data.list".to_string())),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Rates come as numbers or strings. Anything else counts as zero so one bad
/// record does not sink the batch.
fn lenient_rate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(as_f64)
        .filter(|rate| rate.is_finite())
        .unwrap_or(0.0))
}

fn lenient_millis<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(as_f64)
        .and_then(|ms| DateTime::from_timestamp_millis(ms as i64)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LendingInfoRecord {
    #[serde(default)]
    currency_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_rate")]
    pre_rate: f64,
    #[serde(default, deserialize_with = "lenient_rate")]
    estimated_rate: f64,
    #[serde(default, deserialize_with = "lenient_millis")]
    date_hour: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LendingHistoryRecord {
    #[serde(default, deserialize_with = "lenient_rate")]
    rate: f64,
    #[serde(default, deserialize_with = "lenient_millis")]
    date_hour: Option<DateTime<Utc>>,
}

fn to_instrument(record: Value) -> Option<Instrument> {
    let record: LendingInfoRecord = serde_json::from_value(record)
        .map_err(|e| warn!(error = %e, "Skipping unreadable lending record"))
        .ok()?;
    let symbol = record
        .currency_name
        .map(|name| name.trim().to_uppercase())
        .filter(|name| !name.is_empty());
    let Some(symbol) = symbol else {
        warn!("Skipping lending record without currencyName");
        return None;
    };

    Some(Instrument {
        symbol,
        current_rate: record.pre_rate,
        predicted_rate: record.estimated_rate,
        as_of: record.date_hour,
    })
}

fn to_sample(instrument_id: u64, record: Value) -> Option<HistorySample> {
    let record: LendingHistoryRecord = serde_json::from_value(record)
        .map_err(|e| warn!(error = %e, "Skipping unreadable history record"))
        .ok()?;
    let Some(observed_at) = record.date_hour else {
        warn!(instrument_id, "Skipping history record without dateHour");
        return None;
    };

    Some(HistorySample {
        instrument_id,
        rate: record.rate,
        observed_at,
    })
}

#[async_trait]
impl RateSource for OkxSource {
    #[instrument(name = "OkxInstrumentsFetch", skip(self))]
    async fn fetch_instruments(&self) -> Result<Vec<Instrument>, FetchError> {
        let url = format!(
            "{}{}?pageSize=2000&pageIndex=1",
            self.base_url, LENDING_INFO_PATH
        );
        let records = self.fetch_list(&url).await?;
        let instruments: Vec<Instrument> = records.into_iter().filter_map(to_instrument).collect();
        debug!(count = instruments.len(), "Received lending list");
        Ok(instruments)
    }

    #[instrument(name = "OkxHistoryFetch", skip(self))]
    async fn fetch_history(&self, instrument_id: u64) -> Result<Vec<HistorySample>, FetchError> {
        let url = format!(
            "{}{}?currencyId={}&pageSize=300&pageIndex=1",
            self.base_url, LENDING_HISTORY_PATH, instrument_id
        );
        let records = self.fetch_list(&url).await?;
        let samples: Vec<HistorySample> = records
            .into_iter()
            .filter_map(|record| to_sample(instrument_id, record))
            .collect();
        debug!(count = samples.len(), "Received lending history");
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(
        request_path: &str,
        response: ResponseTemplate,
    ) -> wiremock::MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn source(mock_server: &MockServer) -> OkxSource {
        OkxSource::new(&mock_server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_successful_instruments_fetch() {
        let mock_response = r#"{
            "code": 0,
            "data": {
                "list": [
                    {"currencyName": "ton", "preRate": "0.1234", "estimatedRate": 0.15, "dateHour": 1760788800000},
                    {"currencyName": "USDT", "preRate": 0.05, "estimatedRate": "n/a"},
                    {"currencyName": "DOT"},
                    {"preRate": 0.9}
                ]
            }
        }"#;
        let mock_server = create_mock_server(
            LENDING_INFO_PATH,
            ResponseTemplate::new(200).set_body_string(mock_response),
        )
        .await;

        let instruments = source(&mock_server).fetch_instruments().await.unwrap();

        assert_eq!(instruments.len(), 3);
        assert_eq!(instruments[0].symbol, "TON");
        assert_eq!(instruments[0].current_rate, 0.1234);
        assert_eq!(instruments[0].predicted_rate, 0.15);
        assert_eq!(
            instruments[0].as_of,
            Some(Utc.with_ymd_and_hms(2025, 10, 18, 12, 0, 0).unwrap())
        );
        assert_eq!(instruments[1].predicted_rate, 0.0);
        assert!(instruments[1].as_of.is_none());
        assert_eq!(instruments[2].current_rate, 0.0);
    }

    #[tokio::test]
    async fn test_single_object_list() {
        let mock_response = r#"{"data": {"list": {"currencyName": "TON", "preRate": 0.1}}}"#;
        let mock_server = create_mock_server(
            LENDING_INFO_PATH,
            ResponseTemplate::new(200).set_body_string(mock_response),
        )
        .await;

        let instruments = source(&mock_server).fetch_instruments().await.unwrap();
        assert_eq!(instruments.len(), 1);
        assert_eq!(instruments[0].symbol, "TON");
    }

    #[tokio::test]
    async fn test_successful_history_fetch() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "data": {
                "list": [
                    {"rate": "0.02", "dateHour": 1760788800000},
                    {"rate": 0.01, "dateHour": "1760785200000"},
                    {"rate": 0.5}
                ]
            }
        }"#;
        Mock::given(method("GET"))
            .and(path(LENDING_HISTORY_PATH))
            .and(query_param("currencyId", "2054"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let samples = source(&mock_server).fetch_history(2054).await.unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].instrument_id, 2054);
        assert_eq!(samples[0].rate, 0.02);
        assert_eq!(
            samples[1].observed_at,
            Utc.with_ymd_and_hms(2025, 10, 18, 11, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_list_is_malformed() {
        let mock_server = create_mock_server(
            LENDING_INFO_PATH,
            ResponseTemplate::new(200).set_body_string(r#"{"code": 50011, "msg": "Too Many Requests"}"#),
        )
        .await;

        let result = source(&mock_server).fetch_instruments().await;
        assert_eq!(
            result,
            Err(FetchError::Malformed("missing data.list".to_string()))
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let mock_server = create_mock_server(
            LENDING_INFO_PATH,
            ResponseTemplate::new(200).set_body_string("<html>blocked</html>"),
        )
        .await;

        let result = source(&mock_server).fetch_instruments().await;
        assert!(matches!(result, Err(FetchError::Malformed(msg)) if msg.starts_with("invalid JSON")));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mock_server =
            create_mock_server(LENDING_HISTORY_PATH, ResponseTemplate::new(500)).await;

        let result = source(&mock_server).fetch_history(7).await;
        assert_eq!(result, Err(FetchError::Status(500)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "unexpected HTTP status: 500"
        );
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let mock_server = create_mock_server(
            LENDING_INFO_PATH,
            ResponseTemplate::new(200)
                .set_body_string(r#"{"data": {"list": []}}"#)
                .set_delay(Duration::from_millis(500)),
        )
        .await;

        let okx = OkxSource::new(&mock_server.uri(), Duration::from_millis(50)).unwrap();
        assert_eq!(okx.fetch_instruments().await, Err(FetchError::Timeout));
    }
}
