//! Fulfillment-messages availability provider
//!
//! Queries the vendor's `fulfillment-messages` endpoint the way a
//! browser on the product page would, then maps the answer into the
//! crate's normalized [`StoreAvailability`] entries.
//!
//! # Response decode
//!
//! The payload of interest lives under
//! `body.content.pickupMessage.stores[]`, with one `partsAvailability`
//! map per store keyed by product reference. Field names drift between
//! vendor revisions (`storeNumber` vs `storeId`, `pickupDisplay` vs
//! `pickupType`, the quote buried under `messageTypes`), so the decode
//! is deliberately lenient: every recognized spelling maps onto one
//! fixed internal shape and anything missing or oddly typed becomes
//! absent. Only a body that fails JSON parsing outright is an error.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{AvailabilityProvider, ProviderError, ProviderResult};
use crate::models::StoreAvailability;

/// Display values the vendor uses for a store that can hand the item over
const AVAILABLE_SYNONYMS: &[&str] = &["available", "available_today", "in_stock"];

// ============================================================================
// Configuration
// ============================================================================

/// Fulfillment provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Endpoint URL of the fulfillment-messages API
    pub base_url: String,

    /// Request timeout in seconds; a slower answer becomes a probe error
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent presented to the vendor
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    String::from(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36",
    )
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://www.apple.com/in/shop/fulfillment-messages"),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ProviderConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| format!("Provider base URL is invalid: {e}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err("Provider base URL must use http or https".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Provider timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Availability provider backed by the fulfillment-messages endpoint
pub struct FulfillmentProvider {
    config: ProviderConfig,
    client: Client,
}

impl FulfillmentProvider {
    /// Create a provider with a dedicated HTTP client
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://www.apple.com/"));
        if let Ok(ua) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, ua);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .gzip(true)
            .build()?;

        Ok(Self { config, client })
    }

    fn map_send_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                secs: self.config.timeout_secs,
            }
        } else {
            ProviderError::Transport(err)
        }
    }
}

#[async_trait]
impl AvailabilityProvider for FulfillmentProvider {
    fn name(&self) -> &str {
        "fulfillment-messages"
    }

    async fn probe(
        &self,
        external_ref: &str,
        location: &str,
    ) -> ProviderResult<Vec<StoreAvailability>> {
        let response = self
            .client
            .get(self.config.base_url.as_str())
            .query(&[
                ("searchNearby", "true"),
                ("location", location),
                ("pl", "true"),
                ("mt", "compact"),
                ("parts.0", external_ref),
            ])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let envelope: FulfillmentEnvelope =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(flatten_stores(envelope, external_ref))
    }
}

// ============================================================================
// Wire Types
// ============================================================================

// Envelope levels default to empty so a response missing any layer
// decodes to "no stores reported" instead of failing.

#[derive(Debug, Default, Deserialize)]
struct FulfillmentEnvelope {
    #[serde(default)]
    body: EnvelopeBody,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeBody {
    #[serde(default)]
    content: EnvelopeContent,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeContent {
    #[serde(default, rename = "pickupMessage")]
    pickup_message: PickupMessage,
}

#[derive(Debug, Default, Deserialize)]
struct PickupMessage {
    #[serde(default)]
    stores: Vec<RawStore>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStore {
    #[serde(
        default,
        alias = "storeNumber",
        alias = "storeId",
        deserialize_with = "lenient_string"
    )]
    store_number: Option<String>,

    #[serde(
        default,
        alias = "storeName",
        alias = "name",
        deserialize_with = "lenient_string"
    )]
    store_name: Option<String>,

    #[serde(default, alias = "storeCity", deserialize_with = "lenient_string")]
    city: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    distance: Option<f64>,

    #[serde(default, rename = "retailStore")]
    retail_store: RawRetailStore,

    #[serde(default, rename = "partsAvailability")]
    parts_availability: HashMap<String, RawPart>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRetailStore {
    #[serde(default, deserialize_with = "lenient_f64")]
    distance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPart {
    #[serde(
        default,
        alias = "pickupDisplay",
        alias = "pickupType",
        deserialize_with = "lenient_string"
    )]
    pickup_display: Option<String>,

    #[serde(
        default,
        rename = "pickupSearchQuote",
        deserialize_with = "lenient_string"
    )]
    pickup_search_quote: Option<String>,

    #[serde(default, rename = "messageTypes")]
    message_types: RawMessageTypes,
}

#[derive(Debug, Default, Deserialize)]
struct RawMessageTypes {
    #[serde(default)]
    availability: RawAvailabilityMessage,
}

#[derive(Debug, Default, Deserialize)]
struct RawAvailabilityMessage {
    #[serde(
        default,
        rename = "storeSelectionEnabledMessage",
        deserialize_with = "lenient_string"
    )]
    store_selection_enabled_message: Option<String>,
}

/// Accept strings and numbers; anything else is absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept numbers and numeric strings; anything else is absent
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

// ============================================================================
// Normalization
// ============================================================================

/// Whether a vendor display value means "pickup is possible"
fn is_available_display(display: Option<&str>) -> bool {
    display
        .map(|d| AVAILABLE_SYNONYMS.contains(&d.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Flatten the decoded envelope into per-store entries for one reference
fn flatten_stores(envelope: FulfillmentEnvelope, external_ref: &str) -> Vec<StoreAvailability> {
    let mut results = Vec::new();

    for store in envelope.body.content.pickup_message.stores {
        let label = match (&store.store_name, &store.store_number) {
            (Some(name), Some(number)) => Some(format!("{name} ({number})")),
            (Some(name), None) => Some(name.clone()),
            (None, Some(number)) => Some(number.clone()),
            (None, None) => None,
        };
        let distance = store.retail_store.distance.or(store.distance);

        for (sku, part) in &store.parts_availability {
            if sku != external_ref {
                continue;
            }
            let detail = part.pickup_search_quote.clone().or_else(|| {
                part.message_types
                    .availability
                    .store_selection_enabled_message
                    .clone()
            });
            results.push(StoreAvailability {
                store: label.clone(),
                city: store.city.clone(),
                distance,
                available: is_available_display(part.pickup_display.as_deref()),
                detail,
            });
        }
    }

    results
}
