//! Thin asynchronous client for the list-backed data store.
//!
//! - Reads the ferry catalog list, writes/deletes saved calculations.
//! - Maintains a 60-minute in-memory cache of the ferry list with a stale
//!   fallback when the remote fetch fails.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use reqwest::{header, Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{Calculation, RawFerryRecord};

const DEFAULT_FERRY_LIST: &str = "FerryOverview";
const DEFAULT_CALCULATIONS_LIST: &str = "TransportCalculations";
const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
const USER_AGENT: &str = "freight-cost-estimator/1.0";
const ODATA_JSON: &str = "application/json;odata=nometadata";

#[derive(Debug, Error)]
pub enum ListClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("list api error: {0}")]
    Api(String),
}

#[derive(Default)]
struct ListCache {
    ferries: Option<Cached<Vec<RawFerryRecord>>>,
}

/// Client for the site hosting the ferry and calculation lists.
#[derive(Clone)]
pub struct ListClient {
    http: Client,
    site_url: Url,
    ferry_list: String,
    calculations_list: String,
    cache: Arc<Mutex<ListCache>>,
    ttl: Duration,
}

impl ListClient {
    pub fn new(site_url: &str) -> Result<Self, ListClientError> {
        let site_url = Url::parse(site_url)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            site_url,
            ferry_list: DEFAULT_FERRY_LIST.to_string(),
            calculations_list: DEFAULT_CALCULATIONS_LIST.to_string(),
            cache: Arc::new(Mutex::new(ListCache::default())),
            ttl: DEFAULT_TTL,
        })
    }

    pub fn with_list_names(mut self, ferries: &str, calculations: &str) -> Self {
        self.ferry_list = ferries.to_string();
        self.calculations_list = calculations.to_string();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Fetches the raw ferry list. Serves the in-memory cache while fresh;
    /// on a failed fetch, falls back to stale cached data if any exists.
    pub async fn fetch_ferries(&self) -> Result<Vec<RawFerryRecord>, ListClientError> {
        {
            let cache = self.cache.lock().await;
            if let Some(records) = cache.ferries.as_ref().and_then(|c| c.if_fresh(self.ttl)) {
                println!("[lists] Serving cached ferry list ({} records)", records.len());
                return Ok(records);
            }
        }

        let mut url = self.items_url(&self.ferry_list)?;
        url.query_pairs_mut().append_pair(
            "$select",
            "Title,DepartureTerminal,ArrivalTerminal,Price,PricePerKm,MinimumPrice,\
             DepartureLat,DepartureLng,ArrivalLat,ArrivalLng",
        );

        match self.fetch_items::<FerryItemDto>(url).await {
            Ok(items) => {
                let records: Vec<RawFerryRecord> =
                    items.into_iter().map(RawFerryRecord::from).collect();
                let mut cache = self.cache.lock().await;
                cache.ferries = Some(Cached::new(records.clone(), SystemTime::now()));
                Ok(records)
            }
            Err(error) => {
                let cache = self.cache.lock().await;
                if let Some(stale) = cache.ferries.as_ref().map(Cached::stale) {
                    println!("[lists] Ferry fetch failed ({error}); serving stale cache");
                    return Ok(stale);
                }
                Err(error)
            }
        }
    }

    /// Writes a committed calculation to the remote list and returns the
    /// stored item id. Callers treat failure as non-fatal.
    pub async fn save_calculation(&self, calculation: &Calculation) -> Result<i64, ListClientError> {
        let url = self.items_url(&self.calculations_list)?;
        let response = self
            .http
            .post(url)
            .header(header::ACCEPT, ODATA_JSON)
            .header(header::CONTENT_TYPE, ODATA_JSON)
            .json(&CalculationItemDto::from(calculation))
            .send()
            .await?
            .error_for_status()?;

        let stored: StoredItemDto = response.json().await?;
        stored
            .id
            .ok_or_else(|| ListClientError::Api("stored item response missing Id".into()))
    }

    /// Deletes a previously stored calculation item.
    pub async fn delete_calculation(&self, stored_id: i64) -> Result<(), ListClientError> {
        let url = self.item_url(&self.calculations_list, stored_id)?;
        self.http
            .post(url)
            .header(header::ACCEPT, ODATA_JSON)
            .header("X-HTTP-Method", "DELETE")
            .header(header::IF_MATCH, "*")
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.ferries = None;
    }

    async fn fetch_items<T>(&self, url: Url) -> Result<Vec<T>, ListClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, ODATA_JSON)
            .send()
            .await?
            .error_for_status()?;

        let envelope: ItemsEnvelope<T> = response.json().await?;
        Ok(envelope.value)
    }

    fn items_url(&self, list: &str) -> Result<Url, url::ParseError> {
        self.site_url
            .join(&format!("_api/web/lists/getbytitle('{list}')/items"))
    }

    fn item_url(&self, list: &str, id: i64) -> Result<Url, url::ParseError> {
        self.site_url
            .join(&format!("_api/web/lists/getbytitle('{list}')/items({id})"))
    }
}

struct Cached<T> {
    value: T,
    fetched_at: SystemTime,
}

impl<T: Clone> Cached<T> {
    fn new(value: T, fetched_at: SystemTime) -> Self {
        Self { value, fetched_at }
    }

    fn if_fresh(&self, ttl: Duration) -> Option<T> {
        self.fetched_at
            .elapsed()
            .map(|elapsed| elapsed <= ttl)
            .unwrap_or(false)
            .then(|| self.value.clone())
    }

    fn stale(&self) -> T {
        self.value.clone()
    }
}

#[derive(Debug, Deserialize)]
struct ItemsEnvelope<T> {
    // An explicit default fn keeps the derive from demanding `T: Default`.
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct FerryItemDto {
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "DepartureTerminal", default)]
    departure_terminal: Option<String>,
    #[serde(rename = "ArrivalTerminal", default)]
    arrival_terminal: Option<String>,
    #[serde(rename = "Price", default)]
    price: Option<f64>,
    #[serde(rename = "PricePerKm", default)]
    price_per_km: Option<f64>,
    #[serde(rename = "MinimumPrice", default)]
    minimum_price: Option<f64>,
    #[serde(rename = "DepartureLat", default)]
    departure_lat: Option<f64>,
    #[serde(rename = "DepartureLng", default)]
    departure_lng: Option<f64>,
    #[serde(rename = "ArrivalLat", default)]
    arrival_lat: Option<f64>,
    #[serde(rename = "ArrivalLng", default)]
    arrival_lng: Option<f64>,
}

impl From<FerryItemDto> for RawFerryRecord {
    fn from(dto: FerryItemDto) -> Self {
        Self {
            title: dto.title,
            departure_terminal: dto.departure_terminal,
            arrival_terminal: dto.arrival_terminal,
            price: dto.price,
            price_per_km: dto.price_per_km,
            minimum_price: dto.minimum_price,
            departure_lat: dto.departure_lat,
            departure_lng: dto.departure_lng,
            arrival_lat: dto.arrival_lat,
            arrival_lng: dto.arrival_lng,
        }
    }
}

#[derive(Debug, Serialize)]
struct CalculationItemDto {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "CollectionCost")]
    collection_cost: f64,
    #[serde(rename = "DeliveryCost")]
    delivery_cost: f64,
    #[serde(rename = "FerryCost")]
    ferry_cost: f64,
    #[serde(rename = "MarginAmount")]
    margin_amount: f64,
    #[serde(rename = "Total")]
    total: f64,
    #[serde(rename = "CalculatedAt")]
    calculated_at: String,
}

impl From<&Calculation> for CalculationItemDto {
    fn from(calculation: &Calculation) -> Self {
        Self {
            title: format!("Calculation #{}", calculation.id),
            collection_cost: calculation.collection_cost,
            delivery_cost: calculation.delivery_cost,
            ferry_cost: calculation.ferry_cost,
            margin_amount: calculation.margin_amount,
            total: calculation.total,
            calculated_at: calculation.timestamp.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoredItemDto {
    #[serde(rename = "Id", alias = "ID", default)]
    id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ferry_items_parse_from_an_odata_envelope() {
        let payload = r#"{
            "value": [
                {
                    "Title": "Channel",
                    "DepartureTerminal": "Calais",
                    "ArrivalTerminal": "Dover",
                    "Price": 500,
                    "PricePerKm": 2.5,
                    "MinimumPrice": 450,
                    "DepartureLat": 50.96,
                    "DepartureLng": 1.85,
                    "ArrivalLat": 51.12,
                    "ArrivalLng": 1.31
                },
                { "Title": "Broken row" }
            ]
        }"#;

        let envelope: ItemsEnvelope<FerryItemDto> = serde_json::from_str(payload).unwrap();
        let records: Vec<RawFerryRecord> =
            envelope.value.into_iter().map(RawFerryRecord::from).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].departure_terminal.as_deref(), Some("Calais"));
        assert_eq!(records[0].price, Some(500.0));
        assert_eq!(records[1].price, None);
    }

    #[test]
    fn envelope_without_value_yields_no_items() {
        let envelope: ItemsEnvelope<FerryItemDto> = serde_json::from_str("{}").unwrap();
        assert!(envelope.value.is_empty());
    }

    #[test]
    fn stored_item_id_parses_with_either_casing() {
        let lower: StoredItemDto = serde_json::from_str(r#"{"Id": 12}"#).unwrap();
        let upper: StoredItemDto = serde_json::from_str(r#"{"ID": 13}"#).unwrap();
        assert_eq!(lower.id, Some(12));
        assert_eq!(upper.id, Some(13));
    }

    #[test]
    fn calculation_payload_uses_list_column_names() {
        let calculation = Calculation {
            id: 4,
            collection_cost: 450.0,
            delivery_cost: 360.0,
            ferry_cost: 500.0,
            margin_amount: 131.0,
            total: 1441.0,
            timestamp: "2026-08-30T12:00:00Z".into(),
        };
        let json = serde_json::to_value(CalculationItemDto::from(&calculation)).unwrap();

        assert_eq!(json["Title"], "Calculation #4");
        assert_eq!(json["Total"], 1441.0);
        assert_eq!(json["CalculatedAt"], "2026-08-30T12:00:00Z");
    }
}
