//! KRW→USD conversion rates.
//!
//! Listing prices are quoted in KRW; the dashboard shows USD alongside.
//! The provider keeps one rate in a TTL cache and refreshes it from a
//! configured endpoint whose body looks like:
//!
//! ```text
//! { "rates": { "KRW": 1342.18 } }
//! ```
//!
//! [`RateProvider::conversion_rate`] never fails: with no endpoint
//! configured it returns the fixed fallback, and when a refresh fails it
//! serves the last known rate (or the fallback if none was ever
//! fetched). An import must not break because an FX service is down.

use std::time::{Duration, Instant};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::EncarError;

const FETCH_TIMEOUT_SECS: u64 = 10;

/// Converts a KRW amount to USD at `rate` (KRW per USD), rounded to
/// cents with the half-away-from-zero rule.
///
/// `rate` must be positive; [`RateProvider`] only hands out positive
/// rates.
#[must_use]
pub fn convert_krw_to_usd(price_krw: i64, rate: Decimal) -> Decimal {
    (Decimal::from(price_krw) / rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone)]
pub struct RateProviderConfig {
    /// FX endpoint URL; `None` pins the provider to the fallback rate.
    pub endpoint: Option<String>,
    /// Rate served when no live rate is available. Must be positive.
    pub fallback_rate: Decimal,
    /// How long a fetched rate stays fresh.
    pub refresh_secs: u64,
}

impl RateProviderConfig {
    #[must_use]
    pub fn from_app_config(config: &carbridge_core::AppConfig) -> Self {
        Self {
            endpoint: config.fx_endpoint.clone(),
            fallback_rate: config.fx_fallback_rate,
            refresh_secs: config.fx_refresh_secs,
        }
    }
}

struct CachedRate {
    rate: Decimal,
    fetched_at: Instant,
}

pub struct RateProvider {
    client: reqwest::Client,
    endpoint: Option<String>,
    fallback_rate: Decimal,
    refresh: Duration,
    cache: RwLock<Option<CachedRate>>,
}

#[derive(Debug, Deserialize)]
struct FxRatesBody {
    rates: FxRates,
}

#[derive(Debug, Deserialize)]
struct FxRates {
    #[serde(rename = "KRW")]
    krw: f64,
}

impl RateProvider {
    /// Builds the provider. Rejects a non-positive fallback rate up
    /// front so the conversion path can divide without checking.
    pub fn new(config: RateProviderConfig) -> Result<Self, EncarError> {
        if config.fallback_rate <= Decimal::ZERO {
            return Err(EncarError::InvalidRate {
                reason: format!("fallback rate {} must be positive", config.fallback_rate),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            fallback_rate: config.fallback_rate,
            refresh: Duration::from_secs(config.refresh_secs),
            cache: RwLock::new(None),
        })
    }

    /// Current KRW-per-USD rate. Infallible by contract; see the module
    /// docs for the fallback order.
    pub async fn conversion_rate(&self) -> Decimal {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return self.fallback_rate;
        };

        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.fetched_at.elapsed() < self.refresh {
                return cached.rate;
            }
        }

        let mut guard = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = guard.as_ref() {
            if cached.fetched_at.elapsed() < self.refresh {
                return cached.rate;
            }
        }

        match self.fetch_live_rate(endpoint).await {
            Ok(rate) => {
                tracing::debug!(%rate, "refreshed KRW/USD conversion rate");
                *guard = Some(CachedRate {
                    rate,
                    fetched_at: Instant::now(),
                });
                rate
            }
            Err(error) => {
                let rate = guard
                    .as_ref()
                    .map_or(self.fallback_rate, |cached| cached.rate);
                tracing::warn!(
                    error = %error,
                    %rate,
                    "FX rate refresh failed, serving last known rate"
                );
                rate
            }
        }
    }

    async fn fetch_live_rate(&self, endpoint: &str) -> Result<Decimal, EncarError> {
        let response = self.client.get(endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EncarError::UnexpectedStatus {
                status: status.as_u16(),
                url: endpoint.to_string(),
            });
        }
        let body = response.text().await?;
        let parsed: FxRatesBody =
            serde_json::from_str(&body).map_err(|source| EncarError::Deserialize {
                context: format!("FX rates from {endpoint}"),
                source,
            })?;

        let krw = parsed.rates.krw;
        if !krw.is_finite() || krw <= 0.0 {
            return Err(EncarError::InvalidRate {
                reason: format!("live KRW rate {krw} is not a positive number"),
            });
        }
        Decimal::from_f64(krw).ok_or_else(|| EncarError::InvalidRate {
            reason: format!("live KRW rate {krw} does not fit a decimal"),
        })
    }
}
