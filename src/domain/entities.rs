use serde::{Deserialize, Serialize};

/// A bare latitude/longitude pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A named location, produced by a map click or an address search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            name: name.into(),
        }
    }

    /// Point labelled with its raw coordinates, used when the address
    /// resolver fails or is absent.
    pub fn unnamed(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            name: format!("{lat:.4}, {lng:.4}"),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Per-km rate with a minimum-price floor for one road leg.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegTariff {
    pub per_km: f64,
    pub minimum: f64,
}

impl LegTariff {
    pub fn new(per_km: f64, minimum: f64) -> Self {
        Self { per_km, minimum }
    }
}

/// Tariffs for the two road legs. Selecting a ferry overrides the collection
/// tariff with the route's own rate; the delivery tariff keeps its
/// configured value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub collection: LegTariff,
    pub delivery: LegTariff,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            collection: LegTariff::new(2.5, 450.0),
            delivery: LegTariff::new(3.0, 300.0),
        }
    }
}

/// A ferry crossing as loaded from the catalog. Terminal names are keys into
/// the catalog's terminal coordinate table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FerryRoute {
    pub title: String,
    pub departure_terminal: String,
    pub arrival_terminal: String,
    pub price: f64,
    pub price_per_km: f64,
    pub minimum_price: f64,
}

impl FerryRoute {
    pub fn label(&self) -> String {
        format!(
            "{}: {} \u{2192} {}",
            self.title, self.departure_terminal, self.arrival_terminal
        )
    }

    /// Tariff this route imposes on the collection leg.
    pub fn collection_tariff(&self) -> LegTariff {
        LegTariff::new(self.price_per_km, self.minimum_price)
    }
}

/// A finalized calculation committed into the ledger. Immutable after
/// creation; money fields stay unrounded until presentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub id: u64,
    pub collection_cost: f64,
    pub delivery_cost: f64,
    pub ferry_cost: f64,
    pub margin_amount: f64,
    pub total: f64,
    pub timestamp: String,
}

/// Field-wise sums over every calculation currently in the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrandTotal {
    pub collection: f64,
    pub delivery: f64,
    pub ferry: f64,
    pub margin: f64,
    pub grand: f64,
}
