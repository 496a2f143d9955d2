//! Market-data API client.
//!
//! Thin typed client over a Polygon-style aggregates API. The upstream owns
//! the response shapes; this module only maps them into the quote and OHLC
//! history types the handlers serve.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Time windows a client can request history for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "5D")]
    FiveDays,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "MAX")]
    Max,
}

impl std::str::FromStr for TimeRange {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1D" => Ok(Self::OneDay),
            "5D" => Ok(Self::FiveDays),
            "1M" => Ok(Self::OneMonth),
            "3M" => Ok(Self::ThreeMonths),
            "6M" => Ok(Self::SixMonths),
            "1Y" => Ok(Self::OneYear),
            "MAX" => Ok(Self::Max),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Timespan {
    Minute,
    Day,
}

impl Timespan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Day => "day",
        }
    }
}

impl TimeRange {
    /// Days of history to request.
    pub fn days_back(&self) -> i64 {
        match self {
            Self::OneDay => 1,
            Self::FiveDays => 5,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
            // 20 years, well past the data we can access
            Self::Max => 7300,
        }
    }

    /// Bar size: intraday ranges use minute bars, everything else daily.
    pub fn timespan(&self) -> Timespan {
        match self {
            Self::OneDay | Self::FiveDays => Timespan::Minute,
            _ => Timespan::Day,
        }
    }

    /// Multiplier applied to the timespan (e.g. 5-minute bars for 1D).
    pub fn multiplier(&self) -> u32 {
        match self {
            Self::OneDay => 5,
            Self::FiveDays => 30,
            _ => 1,
        }
    }
}

/// One aggregate bar from the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct AggBar {
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    /// Bar start, Unix milliseconds.
    pub t: i64,
}

#[derive(Debug, Deserialize)]
struct AggsResponse {
    ticker: Option<String>,
    results: Option<Vec<AggBar>>,
}

/// Previous-day quote derived from the upstream's prev-close aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct StockQuote {
    pub symbol: String,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub price_change: f64,
    pub percent_change: f64,
}

/// One OHLC data point, timestamp in RFC 3339.
#[derive(Debug, Clone, Serialize)]
pub struct OhlcPoint {
    pub t: String,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
}

/// OHLC history for a symbol, points in ascending time order.
#[derive(Debug, Clone, Serialize)]
pub struct StockHistory {
    pub symbol: String,
    pub timespan: Timespan,
    pub ohlc: Vec<OhlcPoint>,
}

/// Client for the market-data provider.
pub struct MarketClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl MarketClient {
    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Whether an API key is configured. Handlers answer 503 when it isn't.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Make an authenticated GET request to the market-data API.
    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Market data API key is not configured")?;

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("User-Agent", "Stockdeck")
            .send()
            .await
            .context("Failed to reach market data API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Market data API error: {} - {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse market data API response")
    }

    /// Previous trading day's quote for a symbol.
    pub async fn previous_close(&self, symbol: &str) -> Result<StockQuote> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/prev?adjusted=true",
            self.base_url, symbol
        );
        let response: AggsResponse = self.get(&url).await?;

        let quote = match response.results.as_deref().and_then(|r| r.first()) {
            Some(bar) => {
                let price_change = bar.c - bar.o;
                StockQuote {
                    symbol: response.ticker.unwrap_or_else(|| symbol.to_string()),
                    open: Some(bar.o),
                    close: Some(bar.c),
                    price_change,
                    percent_change: (price_change / bar.o) * 100.0,
                }
            }
            // No data for the symbol: report a flat quote rather than erroring.
            None => StockQuote {
                symbol: response.ticker.unwrap_or_else(|| symbol.to_string()),
                open: None,
                close: None,
                price_change: 0.0,
                percent_change: 0.0,
            },
        };

        Ok(quote)
    }

    /// OHLC aggregate history for a symbol over a time range.
    pub async fn aggregates(&self, symbol: &str, range: TimeRange) -> Result<StockHistory> {
        let now = Utc::now();
        let start = now - Duration::days(range.days_back());

        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}?adjusted=true&sort=asc&limit=50000",
            self.base_url,
            symbol,
            range.multiplier(),
            range.timespan().as_str(),
            start.timestamp_millis(),
            now.timestamp_millis(),
        );
        let response: AggsResponse = self.get(&url).await?;

        let ohlc = response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|bar| OhlcPoint {
                t: DateTime::from_timestamp_millis(bar.t)
                    .unwrap_or_default()
                    .to_rfc3339(),
                o: bar.o,
                h: bar.h,
                l: bar.l,
                c: bar.c,
            })
            .collect();

        Ok(StockHistory {
            symbol: response.ticker.unwrap_or_else(|| symbol.to_string()),
            timespan: range.timespan(),
            ohlc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_mapping() {
        assert_eq!(TimeRange::OneDay.timespan(), Timespan::Minute);
        assert_eq!(TimeRange::OneDay.multiplier(), 5);
        assert_eq!(TimeRange::FiveDays.timespan(), Timespan::Minute);
        assert_eq!(TimeRange::FiveDays.multiplier(), 30);
        assert_eq!(TimeRange::OneMonth.timespan(), Timespan::Day);
        assert_eq!(TimeRange::OneMonth.multiplier(), 1);
        assert_eq!(TimeRange::Max.days_back(), 7300);
    }

    #[test]
    fn test_time_range_deserializes_from_wire_names() {
        let range: TimeRange = serde_json::from_str("\"1D\"").unwrap();
        assert_eq!(range, TimeRange::OneDay);
        let range: TimeRange = serde_json::from_str("\"MAX\"").unwrap();
        assert_eq!(range, TimeRange::Max);

        assert!(serde_json::from_str::<TimeRange>("\"2D\"").is_err());
    }

    #[test]
    fn test_time_range_from_str() {
        assert_eq!("5D".parse::<TimeRange>(), Ok(TimeRange::FiveDays));
        assert_eq!("1Y".parse::<TimeRange>(), Ok(TimeRange::OneYear));
        assert!("max".parse::<TimeRange>().is_err());
        assert!("".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_aggs_response_parsing() {
        let body = r#"{
            "ticker": "AAPL",
            "queryCount": 1,
            "resultsCount": 1,
            "adjusted": true,
            "results": [
                {"v": 70790813, "vw": 131.6292, "o": 130.465, "c": 130.15, "h": 133.41, "l": 129.89, "t": 1673251200000, "n": 645365}
            ],
            "status": "OK",
            "request_id": "abc",
            "count": 1
        }"#;

        let parsed: AggsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.ticker.as_deref(), Some("AAPL"));
        let bars = parsed.results.unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].o, 130.465);
        assert_eq!(bars[0].t, 1673251200000);
    }

    #[test]
    fn test_aggs_response_without_results() {
        let body = r#"{"ticker": "NOPE", "status": "OK"}"#;
        let parsed: AggsResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.results.is_none());
    }

    #[test]
    fn test_unconfigured_client_errors() {
        let client = MarketClient::new(None, "http://localhost:1".to_string());
        assert!(!client.is_configured());

        let err = tokio_test::block_on(client.previous_close("AAPL")).unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
