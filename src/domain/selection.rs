//! The 3-step selection workflow: collection point, ferry, delivery point.
//!
//! The machine owns one mutable [`Selection`] per session. Steps advance
//! monotonically; `reset` is the only way back. Distance resolution is
//! asynchronous and re-enters through [`Selection::apply_distance`], which
//! checks the generation token so completions for a discarded selection are
//! dropped instead of applied to stale state.

use thiserror::Error;
use uuid::Uuid;

use super::catalog::FerryCatalog;
use super::entities::{Coordinate, FerryRoute, GeoPoint, LegTariff, PricingConfig};
use super::pricing::{self, MarginOutcome};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionStep {
    #[default]
    AwaitingCollection,
    AwaitingFerry,
    AwaitingDelivery,
    Complete,
}

/// How the user is picking points; has no effect on step ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    MapClick,
    AddressSearch,
}

/// The two road segments of a journey.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteLeg {
    Collection,
    Delivery,
}

impl RouteLeg {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Delivery => "delivery",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("step out of order: {action} is not legal while {step:?}")]
    InvalidStep {
        action: &'static str,
        step: SelectionStep,
    },
    #[error("ferry terminal '{terminal}' has no known coordinates")]
    UnroutableFerry { terminal: String },
}

/// Resolution state of one road leg.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LegStatus {
    #[default]
    Idle,
    Requested,
    Resolved {
        distance_km: f64,
        price: f64,
    },
    Failed {
        reason: String,
    },
}

impl LegStatus {
    pub fn price(&self) -> Option<f64> {
        match self {
            Self::Resolved { price, .. } => Some(*price),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// An asynchronous road-distance request issued by the machine. Carries the
/// generation it was issued under so a late completion can be matched
/// against the current selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceRequest {
    pub generation: Uuid,
    pub leg: RouteLeg,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

/// What became of an async distance completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// Leg priced; selection may now be Complete.
    Priced,
    /// Resolver reported no route; leg marked failed, retryable.
    LegFailed,
    /// Completion belonged to a superseded selection and was dropped.
    Stale,
}

/// Costs derived from whatever is currently known; unresolved legs count
/// as 0. Never cached.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Quote {
    pub collection_cost: f64,
    pub delivery_cost: f64,
    pub ferry_cost: f64,
    pub subtotal: f64,
    pub margin_amount: f64,
    pub total: f64,
}

/// One in-progress workflow instance. Fields populate monotonically forward
/// through [`SelectionStep`]; `reset` clears them all.
#[derive(Clone, Debug)]
pub struct Selection {
    generation: Uuid,
    step: SelectionStep,
    mode: SelectionMode,
    pricing: PricingConfig,
    collection_point: Option<GeoPoint>,
    ferry: Option<FerryRoute>,
    departure_coord: Option<Coordinate>,
    arrival_coord: Option<Coordinate>,
    delivery_point: Option<GeoPoint>,
    collection_leg: LegStatus,
    delivery_leg: LegStatus,
    margin_percent: i32,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

impl Selection {
    pub fn new(pricing: PricingConfig) -> Self {
        Self {
            generation: Uuid::new_v4(),
            step: SelectionStep::AwaitingCollection,
            mode: SelectionMode::default(),
            pricing,
            collection_point: None,
            ferry: None,
            departure_coord: None,
            arrival_coord: None,
            delivery_point: None,
            collection_leg: LegStatus::Idle,
            delivery_leg: LegStatus::Idle,
            margin_percent: 0,
        }
    }

    pub fn step(&self) -> SelectionStep {
        self.step
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    pub fn generation(&self) -> Uuid {
        self.generation
    }

    pub fn margin_percent(&self) -> i32 {
        self.margin_percent
    }

    pub fn collection_point(&self) -> Option<&GeoPoint> {
        self.collection_point.as_ref()
    }

    pub fn ferry(&self) -> Option<&FerryRoute> {
        self.ferry.as_ref()
    }

    pub fn delivery_point(&self) -> Option<&GeoPoint> {
        self.delivery_point.as_ref()
    }

    pub fn leg_status(&self, leg: RouteLeg) -> &LegStatus {
        match leg {
            RouteLeg::Collection => &self.collection_leg,
            RouteLeg::Delivery => &self.delivery_leg,
        }
    }

    /// Step 1: fix the collection point and advance to the ferry step.
    pub fn choose_collection_point(&mut self, point: GeoPoint) -> Result<(), SelectionError> {
        self.require_step(SelectionStep::AwaitingCollection, "choose_collection_point")?;
        self.collection_point = Some(point);
        self.step = SelectionStep::AwaitingFerry;
        Ok(())
    }

    /// Step 2: fix the ferry. Both terminals must resolve in the catalog,
    /// otherwise the machine stays in AwaitingFerry and the user picks
    /// another route. The route's own tariff takes over the collection leg.
    pub fn choose_ferry(
        &mut self,
        catalog: &FerryCatalog,
        route: FerryRoute,
    ) -> Result<(), SelectionError> {
        self.require_step(SelectionStep::AwaitingFerry, "choose_ferry")?;

        let departure = catalog
            .resolve_terminal(&route.departure_terminal)
            .ok_or_else(|| SelectionError::UnroutableFerry {
                terminal: route.departure_terminal.clone(),
            })?;
        let arrival = catalog
            .resolve_terminal(&route.arrival_terminal)
            .ok_or_else(|| SelectionError::UnroutableFerry {
                terminal: route.arrival_terminal.clone(),
            })?;

        self.pricing.collection = route.collection_tariff();
        self.departure_coord = Some(departure);
        self.arrival_coord = Some(arrival);
        self.ferry = Some(route);
        self.step = SelectionStep::AwaitingDelivery;
        Ok(())
    }

    /// Step 3: fix the delivery point and issue the two road-distance
    /// requests. The selection completes once both legs come back priced.
    pub fn choose_delivery_point(
        &mut self,
        point: GeoPoint,
    ) -> Result<Vec<DistanceRequest>, SelectionError> {
        self.require_step(SelectionStep::AwaitingDelivery, "choose_delivery_point")?;

        // The step ordering guarantees these were set in the earlier steps;
        // if the invariant ever slips, refuse rather than issue a request
        // for a made-up coordinate.
        let (Some(departure), Some(arrival), Some(collection)) = (
            self.departure_coord,
            self.arrival_coord,
            self.collection_point.as_ref().map(GeoPoint::coordinate),
        ) else {
            debug_assert!(false, "AwaitingDelivery without resolved endpoints");
            return Err(SelectionError::InvalidStep {
                action: "choose_delivery_point",
                step: self.step,
            });
        };
        let delivery = point.coordinate();

        self.delivery_point = Some(point);
        self.collection_leg = LegStatus::Requested;
        self.delivery_leg = LegStatus::Requested;

        Ok(vec![
            DistanceRequest {
                generation: self.generation,
                leg: RouteLeg::Collection,
                origin: collection,
                destination: departure,
            },
            DistanceRequest {
                generation: self.generation,
                leg: RouteLeg::Delivery,
                origin: arrival,
                destination: delivery,
            },
        ])
    }

    /// Applies an asynchronous distance completion. Completions issued under
    /// an older generation are dropped. A per-leg failure leaves the other
    /// leg and the step untouched.
    pub fn apply_distance(
        &mut self,
        generation: Uuid,
        leg: RouteLeg,
        outcome: Result<f64, String>,
    ) -> Applied {
        if generation != self.generation {
            println!("[selection] Dropping stale {} distance completion", leg.label());
            return Applied::Stale;
        }

        let tariff = self.leg_tariff(leg);
        let status = match leg {
            RouteLeg::Collection => &mut self.collection_leg,
            RouteLeg::Delivery => &mut self.delivery_leg,
        };

        match outcome {
            Ok(distance_km) => {
                *status = LegStatus::Resolved {
                    distance_km,
                    price: pricing::leg_price(distance_km, tariff.per_km, tariff.minimum),
                };
                if self.collection_leg.is_resolved() && self.delivery_leg.is_resolved() {
                    self.step = SelectionStep::Complete;
                }
                Applied::Priced
            }
            Err(reason) => {
                *status = LegStatus::Failed { reason };
                Applied::LegFailed
            }
        }
    }

    /// Re-issues the distance request for a failed (or still pending) leg.
    /// Returns None when the leg has no request to repeat: before the
    /// delivery point is chosen, or once the leg is already priced.
    /// Re-requesting a resolved leg would leave a Complete selection with
    /// an unpriced leg inside it.
    pub fn retry_leg(&mut self, leg: RouteLeg) -> Option<DistanceRequest> {
        if !matches!(
            self.leg_status(leg),
            LegStatus::Requested | LegStatus::Failed { .. }
        ) {
            return None;
        }

        let (origin, destination) = match leg {
            RouteLeg::Collection => (
                self.collection_point.as_ref().map(GeoPoint::coordinate)?,
                self.departure_coord?,
            ),
            RouteLeg::Delivery => (
                self.arrival_coord?,
                self.delivery_point.as_ref().map(GeoPoint::coordinate)?,
            ),
        };

        match leg {
            RouteLeg::Collection => self.collection_leg = LegStatus::Requested,
            RouteLeg::Delivery => self.delivery_leg = LegStatus::Requested,
        }

        Some(DistanceRequest {
            generation: self.generation,
            leg,
            origin,
            destination,
        })
    }

    /// Legal in any state; the quote reflects the change immediately.
    pub fn set_margin(&mut self, percent: i32) {
        self.margin_percent = percent;
    }

    /// Current costs, with unresolved legs counted as 0.
    pub fn quote(&self) -> Quote {
        let collection_cost = self.collection_leg.price().unwrap_or(0.0);
        let delivery_cost = self.delivery_leg.price().unwrap_or(0.0);
        let ferry_cost = self.ferry.as_ref().map(|f| f.price).unwrap_or(0.0);
        let subtotal = collection_cost + delivery_cost + ferry_cost;
        let MarginOutcome {
            margin_amount,
            total,
        } = pricing::apply_margin(subtotal, self.margin_percent);

        Quote {
            collection_cost,
            delivery_cost,
            ferry_cost,
            subtotal,
            margin_amount,
            total,
        }
    }

    /// Back to AwaitingCollection from any state. Clears every field, puts
    /// the margin back to 0, restores the pricing defaults, and renews the
    /// generation token so in-flight completions are discarded on arrival.
    /// The input mode survives. Map/route side effects are the caller's
    /// responsibility.
    pub fn reset(&mut self, pricing: PricingConfig) {
        let mode = self.mode;
        *self = Self::new(pricing);
        self.mode = mode;
    }

    fn leg_tariff(&self, leg: RouteLeg) -> LegTariff {
        match leg {
            RouteLeg::Collection => self.pricing.collection,
            RouteLeg::Delivery => self.pricing.delivery,
        }
    }

    fn require_step(
        &self,
        expected: SelectionStep,
        action: &'static str,
    ) -> Result<(), SelectionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SelectionError::InvalidStep {
                action,
                step: self.step,
            })
        }
    }
}
