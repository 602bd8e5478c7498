//! Accumulation of committed calculations and grand-total rollup.

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::entities::{Calculation, GrandTotal};
use super::selection::{Selection, SelectionStep};

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("cannot commit before distances for both road legs are priced")]
    IncompleteSelection,
}

/// Ordered collection of committed calculations for the session. Ids are
/// assigned sequentially and never reused, even after removals.
#[derive(Clone, Debug, Default)]
pub struct CalculationLedger {
    entries: Vec<Calculation>,
    next_id: u64,
}

impl CalculationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots a completed selection into an immutable record. The
    /// selection itself is left untouched; committing repeatedly produces
    /// distinct entries.
    pub fn commit(&mut self, selection: &Selection) -> Result<Calculation, LedgerError> {
        if selection.step() != SelectionStep::Complete {
            return Err(LedgerError::IncompleteSelection);
        }

        let quote = selection.quote();
        self.next_id += 1;
        let entry = Calculation {
            id: self.next_id,
            collection_cost: quote.collection_cost,
            delivery_cost: quote.delivery_cost,
            ferry_cost: quote.ferry_cost,
            margin_amount: quote.margin_amount,
            total: quote.total,
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Removes the matching entry. Absent ids are a no-op; delete is
    /// idempotent.
    pub fn remove(&mut self, id: u64) {
        self.entries.retain(|entry| entry.id != id);
    }

    /// Entries in insertion order.
    pub fn calculations(&self) -> &[Calculation] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Field-wise sums over all current entries, recomputed on every call.
    pub fn grand_total(&self) -> GrandTotal {
        self.entries
            .iter()
            .fold(GrandTotal::default(), |acc, entry| GrandTotal {
                collection: acc.collection + entry.collection_cost,
                delivery: acc.delivery + entry.delivery_cost,
                ferry: acc.ferry + entry.ferry_cost,
                margin: acc.margin + entry.margin_amount,
                grand: acc.grand + entry.total,
            })
    }

    /// Restores previously persisted entries, pushing the id counter past
    /// the highest restored id so fresh commits never collide.
    pub fn restore(&mut self, entries: Vec<Calculation>) {
        self.next_id = entries
            .iter()
            .map(|entry| entry.id)
            .max()
            .unwrap_or(0)
            .max(self.next_id);
        self.entries = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{FerryCatalog, RawFerryRecord};
    use crate::domain::entities::GeoPoint;
    use crate::domain::selection::RouteLeg;

    fn completed_selection() -> Selection {
        let mut catalog = FerryCatalog::default();
        catalog.load([RawFerryRecord {
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
        }]);

        let mut selection = Selection::default();
        selection
            .choose_collection_point(GeoPoint::new(48.85, 2.35, "Paris"))
            .unwrap();
        selection
            .choose_ferry(&catalog, catalog.list_routes()[0].clone())
            .unwrap();
        selection
            .choose_delivery_point(GeoPoint::new(51.50, -0.12, "London"))
            .unwrap();
        let generation = selection.generation();
        selection.apply_distance(generation, RouteLeg::Collection, Ok(3.0));
        selection.apply_distance(generation, RouteLeg::Delivery, Ok(120.0));
        selection.set_margin(10);
        selection
    }

    #[test]
    fn commit_snapshots_the_worked_scenario() {
        let mut ledger = CalculationLedger::new();
        let entry = ledger.commit(&completed_selection()).unwrap();

        assert_eq!(entry.id, 1);
        assert_eq!(entry.collection_cost, 450.0);
        assert_eq!(entry.delivery_cost, 360.0);
        assert_eq!(entry.ferry_cost, 500.0);
        assert_eq!(entry.margin_amount, 131.0);
        assert_eq!(entry.total, 1441.0);

        let totals = ledger.grand_total();
        assert_eq!(totals.collection, 450.0);
        assert_eq!(totals.delivery, 360.0);
        assert_eq!(totals.ferry, 500.0);
        assert_eq!(totals.margin, 131.0);
        assert_eq!(totals.grand, 1441.0);
    }

    #[test]
    fn commit_rejects_incomplete_selections() {
        let mut ledger = CalculationLedger::new();
        let mut selection = Selection::default();
        selection
            .choose_collection_point(GeoPoint::new(48.85, 2.35, "Paris"))
            .unwrap();

        assert_eq!(
            ledger.commit(&selection),
            Err(LedgerError::IncompleteSelection)
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn remove_is_idempotent_and_ids_are_never_reused() {
        let mut ledger = CalculationLedger::new();
        let selection = completed_selection();
        let first = ledger.commit(&selection).unwrap();
        ledger.commit(&selection).unwrap();

        ledger.remove(first.id);
        assert_eq!(ledger.len(), 1);
        ledger.remove(first.id);
        ledger.remove(999);
        assert_eq!(ledger.len(), 1);

        let third = ledger.commit(&selection).unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn grand_total_tracks_the_current_entry_set() {
        let mut ledger = CalculationLedger::new();
        let selection = completed_selection();
        let first = ledger.commit(&selection).unwrap();
        ledger.commit(&selection).unwrap();
        assert_eq!(ledger.grand_total().grand, 2882.0);

        ledger.remove(first.id);
        assert_eq!(ledger.grand_total().grand, 1441.0);

        ledger.remove(2);
        assert_eq!(ledger.grand_total(), GrandTotal::default());
    }

    #[test]
    fn restore_advances_the_id_counter() {
        let mut ledger = CalculationLedger::new();
        ledger.restore(vec![Calculation {
            id: 7,
            collection_cost: 450.0,
            delivery_cost: 360.0,
            ferry_cost: 500.0,
            margin_amount: 0.0,
            total: 1310.0,
            timestamp: "2026-08-30T12:00:00Z".into(),
        }]);

        let next = ledger.commit(&completed_selection()).unwrap();
        assert_eq!(next.id, 8);
    }
}
