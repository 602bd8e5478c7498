//! Cost estimation engine for multi-leg freight transport: road collection,
//! ferry crossing, road delivery.
//!
//! The domain layer owns the selection workflow, pricing rules, and the
//! calculation ledger; the infra layer talks to the list-backed ferry store,
//! the road routing service, and the geocoder. [`session::Session`] ties the
//! two together for a front end.

pub mod domain;
pub mod infra;
pub mod report;
pub mod session;
pub mod util;

pub use domain::{
    CalculationLedger, FerryCatalog, GeoPoint, LedgerError, Selection, SelectionError,
};
pub use session::Session;
