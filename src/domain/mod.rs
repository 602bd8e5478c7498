//! Domain logic for freight cost estimation lives here.

pub mod catalog;
pub mod entities;
pub mod ledger;
pub mod pricing;
pub mod selection;

pub use catalog::{FerryCatalog, RawFerryRecord};
pub use entities::{
    Calculation, Coordinate, FerryRoute, GeoPoint, GrandTotal, LegTariff, PricingConfig,
};
pub use ledger::{CalculationLedger, LedgerError};
pub use pricing::{apply_margin, format_money, leg_price, MarginOutcome};
pub use selection::{
    Applied, DistanceRequest, LegStatus, Quote, RouteLeg, Selection, SelectionError, SelectionMode,
    SelectionStep,
};
