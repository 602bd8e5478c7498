//! Session coordinator: owns the selection workflow, the ledger, and the
//! ferry catalog, and drives the external clients for a front end.
//!
//! All remote persistence is best-effort: a failed list write or delete is
//! logged and never blocks the local mutation it mirrors.

use std::collections::HashMap;

use crate::domain::{
    Applied, Calculation, CalculationLedger, DistanceRequest, FerryCatalog, FerryRoute, GeoPoint,
    GrandTotal, LedgerError, PricingConfig, Quote, RouteLeg, Selection, SelectionError,
    SelectionMode, SelectionStep,
};
use crate::infra::cache::{load_catalog_cache, save_catalog_cache, CatalogCache};
use crate::infra::geocode::GeocodeClient;
use crate::infra::routing::{RoutingClient, RoutingError};
use crate::infra::sharepoint::{ListClient, ListClientError};
use crate::util::persistence::{load_persisted_state, save_persisted_state, PersistedState};

pub struct Session {
    selection: Selection,
    ledger: CalculationLedger,
    catalog: FerryCatalog,
    pricing: PricingConfig,
    lists: ListClient,
    routing: RoutingClient,
    geocode: GeocodeClient,
    /// Remote item ids for committed calculations, so a local removal can
    /// mirror the delete.
    stored_ids: HashMap<u64, i64>,
}

impl Session {
    pub fn new(lists: ListClient, routing: RoutingClient, geocode: GeocodeClient) -> Self {
        let pricing = PricingConfig::default();
        Self {
            selection: Selection::new(pricing),
            ledger: CalculationLedger::new(),
            catalog: FerryCatalog::new(pricing.collection),
            pricing,
            lists,
            routing,
            geocode,
            stored_ids: HashMap::new(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn ledger(&self) -> &CalculationLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &FerryCatalog {
        &self.catalog
    }

    pub fn quote(&self) -> Quote {
        self.selection.quote()
    }

    pub fn grand_total(&self) -> GrandTotal {
        self.ledger.grand_total()
    }

    /// Populates the ferry catalog: disk cache while fresh, otherwise the
    /// remote list (writing the cache back on success).
    pub async fn load_ferries(&mut self) -> Result<usize, ListClientError> {
        if let Some(cached) = load_catalog_cache() {
            return Ok(self.catalog.load(cached.records));
        }

        let records = self.lists.fetch_ferries().await?;
        if let Err(e) = save_catalog_cache(&CatalogCache::new(records.clone())) {
            println!("[session] Failed to save ferry cache: {e}");
        }
        Ok(self.catalog.load(records))
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.selection.set_mode(mode);
    }

    pub fn set_margin(&mut self, percent: i32) {
        self.selection.set_margin(percent);
    }

    /// Candidate points for an address query, for address-search mode.
    pub async fn search_address(&self, query: &str) -> Vec<GeoPoint> {
        match self.geocode.search(query).await {
            Ok(points) => points,
            Err(e) => {
                println!("[session] Address search failed: {e}");
                Vec::new()
            }
        }
    }

    /// Handles a map click: names the point via reverse geocoding (raw
    /// coordinates on failure) and feeds it to whichever point step is
    /// active. Distance resolution runs to completion for the delivery
    /// step.
    pub async fn click_point(&mut self, lat: f64, lng: f64) -> Result<(), SelectionError> {
        let point = match self.geocode.reverse(crate::domain::Coordinate::new(lat, lng)).await {
            Ok(name) => GeoPoint::new(lat, lng, name),
            Err(e) => {
                println!("[session] Reverse geocoding failed ({e}); using raw coordinates");
                GeoPoint::unnamed(lat, lng)
            }
        };
        self.choose_point(point).await
    }

    /// Feeds an already-named point (e.g. an address-search hit) to the
    /// active point step.
    pub async fn choose_point(&mut self, point: GeoPoint) -> Result<(), SelectionError> {
        match self.selection.step() {
            SelectionStep::AwaitingDelivery => {
                let requests = self.selection.choose_delivery_point(point)?;
                self.resolve_distances(requests).await;
                Ok(())
            }
            _ => self.selection.choose_collection_point(point),
        }
    }

    pub fn choose_ferry(&mut self, route: FerryRoute) -> Result<(), SelectionError> {
        self.selection.choose_ferry(&self.catalog, route)
    }

    /// Re-requests the distance for a failed leg.
    pub async fn retry_leg(&mut self, leg: RouteLeg) {
        if let Some(request) = self.selection.retry_leg(leg) {
            self.resolve_distances(vec![request]).await;
        }
    }

    async fn resolve_distances(&mut self, requests: Vec<DistanceRequest>) {
        for request in requests {
            let outcome = match self
                .routing
                .road_distance_km(request.origin, request.destination)
                .await
            {
                Ok(distance_km) => Ok(distance_km),
                Err(RoutingError::NoRoute) => Err("no road route found".to_string()),
                Err(e) => Err(e.to_string()),
            };

            match self
                .selection
                .apply_distance(request.generation, request.leg, outcome)
            {
                Applied::Priced => {}
                Applied::LegFailed => {
                    println!("[session] {} leg failed; retry available", request.leg.label());
                }
                Applied::Stale => {}
            }
        }
    }

    /// Commits the current selection into the ledger, mirrors the record to
    /// the remote list, and persists local state. Only the ledger commit
    /// can fail.
    pub async fn commit_calculation(&mut self) -> Result<Calculation, LedgerError> {
        let calculation = self.ledger.commit(&self.selection)?;

        match self.lists.save_calculation(&calculation).await {
            Ok(stored_id) => {
                self.stored_ids.insert(calculation.id, stored_id);
            }
            Err(e) => println!("[session] Remote calculation save failed: {e}"),
        }

        self.persist();
        Ok(calculation)
    }

    /// Removes a calculation locally and best-effort remotely. Idempotent.
    pub async fn remove_calculation(&mut self, id: u64) {
        self.ledger.remove(id);

        if let Some(stored_id) = self.stored_ids.remove(&id) {
            if let Err(e) = self.lists.delete_calculation(stored_id).await {
                println!("[session] Remote calculation delete failed: {e}");
            }
        }

        self.persist();
    }

    /// Clears the in-progress selection back to the first step. Committed
    /// calculations are untouched; collaborators clear their own map/route
    /// artifacts.
    pub fn reset_selection(&mut self) {
        self.selection.reset(self.pricing);
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            margin_percent: self.selection.margin_percent(),
            calculations: self.ledger.calculations().to_vec(),
        }
    }

    /// Restores margin and committed calculations from the last run, if a
    /// saved state exists.
    pub fn restore_saved_state(&mut self) {
        if let Some(saved) = load_persisted_state() {
            self.apply_persisted(saved);
        }
    }

    pub fn apply_persisted(&mut self, persisted: PersistedState) {
        self.selection.set_margin(persisted.margin_percent);
        self.ledger.restore(persisted.calculations);
    }

    fn persist(&self) {
        if let Err(e) = save_persisted_state(&self.to_persisted()) {
            println!("[session] Failed to persist session state: {e}");
        }
    }
}
