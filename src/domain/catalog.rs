//! In-memory ferry catalog: routes plus the terminal coordinate table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::entities::{Coordinate, FerryRoute, LegTariff};

/// One row of the external ferry list, before validation. Everything is
/// optional at this boundary; `FerryCatalog::load` decides what is usable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFerryRecord {
    pub title: Option<String>,
    pub departure_terminal: Option<String>,
    pub arrival_terminal: Option<String>,
    pub price: Option<f64>,
    pub price_per_km: Option<f64>,
    pub minimum_price: Option<f64>,
    pub departure_lat: Option<f64>,
    pub departure_lng: Option<f64>,
    pub arrival_lat: Option<f64>,
    pub arrival_lng: Option<f64>,
}

/// Ferry routes and terminal coordinates, populated once from the external
/// list. Read-only after load.
#[derive(Clone, Debug)]
pub struct FerryCatalog {
    routes: Vec<FerryRoute>,
    terminals: HashMap<String, Coordinate>,
    /// Fallback tariff for records that omit their own rate.
    default_tariff: LegTariff,
}

impl Default for FerryCatalog {
    fn default() -> Self {
        Self::new(super::entities::PricingConfig::default().collection)
    }
}

impl FerryCatalog {
    pub fn new(default_tariff: LegTariff) -> Self {
        Self {
            routes: Vec::new(),
            terminals: HashMap::new(),
            default_tariff,
        }
    }

    /// Replaces catalog content from raw list records. Records missing a
    /// terminal name or a crossing price are skipped and logged, never
    /// fatal. Returns how many routes were loaded.
    pub fn load<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = RawFerryRecord>,
    {
        self.routes.clear();
        self.terminals.clear();

        let mut skipped = 0_usize;
        for record in records {
            let (Some(departure), Some(arrival), Some(price)) = (
                record.departure_terminal.clone(),
                record.arrival_terminal.clone(),
                record.price,
            ) else {
                skipped += 1;
                println!("[catalog] Skipping incomplete ferry record: {record:?}");
                continue;
            };

            if let (Some(lat), Some(lng)) = (record.departure_lat, record.departure_lng) {
                self.terminals
                    .entry(departure.clone())
                    .or_insert_with(|| Coordinate::new(lat, lng));
            }
            if let (Some(lat), Some(lng)) = (record.arrival_lat, record.arrival_lng) {
                self.terminals
                    .entry(arrival.clone())
                    .or_insert_with(|| Coordinate::new(lat, lng));
            }

            self.routes.push(FerryRoute {
                title: record
                    .title
                    .unwrap_or_else(|| format!("{departure} \u{2192} {arrival}")),
                departure_terminal: departure,
                arrival_terminal: arrival,
                price,
                price_per_km: record.price_per_km.unwrap_or(self.default_tariff.per_km),
                minimum_price: record.minimum_price.unwrap_or(self.default_tariff.minimum),
            });
        }

        if skipped > 0 {
            println!(
                "[catalog] Loaded {} routes, skipped {skipped} incomplete records",
                self.routes.len()
            );
        }

        self.routes.len()
    }

    /// Routes in load order.
    pub fn list_routes(&self) -> &[FerryRoute] {
        &self.routes
    }

    pub fn resolve_terminal(&self, name: &str) -> Option<Coordinate> {
        self.terminals.get(name).copied()
    }

    /// True when both of the route's terminals resolve to coordinates.
    pub fn is_routable(&self, route: &FerryRoute) -> bool {
        self.resolve_terminal(&route.departure_terminal).is_some()
            && self.resolve_terminal(&route.arrival_terminal).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record() -> RawFerryRecord {
        RawFerryRecord {
            title: Some("Channel".into()),
            departure_terminal: Some("Calais".into()),
            arrival_terminal: Some("Dover".into()),
            price: Some(500.0),
            price_per_km: Some(2.5),
            minimum_price: Some(450.0),
            departure_lat: Some(50.96),
            departure_lng: Some(1.85),
            arrival_lat: Some(51.12),
            arrival_lng: Some(1.31),
        }
    }

    #[test]
    fn load_builds_routes_and_terminals_in_order() {
        let mut catalog = FerryCatalog::default();
        let second = RawFerryRecord {
            title: Some("North Sea".into()),
            departure_terminal: Some("Rotterdam".into()),
            arrival_terminal: Some("Hull".into()),
            price: Some(900.0),
            ..RawFerryRecord::default()
        };
        let loaded = catalog.load([full_record(), second]);

        assert_eq!(loaded, 2);
        assert_eq!(catalog.list_routes()[0].departure_terminal, "Calais");
        assert_eq!(catalog.list_routes()[1].title, "North Sea");
        assert_eq!(
            catalog.resolve_terminal("Dover"),
            Some(Coordinate::new(51.12, 1.31))
        );
        assert_eq!(catalog.resolve_terminal("Rotterdam"), None);
    }

    #[test]
    fn incomplete_records_are_skipped_not_fatal() {
        let mut catalog = FerryCatalog::default();
        let no_price = RawFerryRecord {
            price: None,
            ..full_record()
        };
        let no_arrival = RawFerryRecord {
            arrival_terminal: None,
            ..full_record()
        };
        let loaded = catalog.load([no_price, full_record(), no_arrival]);

        assert_eq!(loaded, 1);
        assert_eq!(catalog.list_routes().len(), 1);
    }

    #[test]
    fn missing_tariff_fields_fall_back_to_defaults() {
        let mut catalog = FerryCatalog::new(LegTariff::new(2.5, 450.0));
        catalog.load([RawFerryRecord {
            price_per_km: None,
            minimum_price: None,
            ..full_record()
        }]);

        let route = &catalog.list_routes()[0];
        assert_eq!(route.price_per_km, 2.5);
        assert_eq!(route.minimum_price, 450.0);
    }

    #[test]
    fn route_without_terminal_coordinates_is_not_routable() {
        let mut catalog = FerryCatalog::default();
        catalog.load([RawFerryRecord {
            arrival_lat: None,
            arrival_lng: None,
            ..full_record()
        }]);

        let route = catalog.list_routes()[0].clone();
        assert!(!catalog.is_routable(&route));
    }
}
