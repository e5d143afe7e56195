//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod fines;
pub mod members;
pub mod reports;
pub mod reservations;

use std::sync::Arc;

use crate::{clock::Clock, config::CirculationConfig, repository::Store};

pub use circulation::Requester;
pub use fines::FinePolicy;
pub use reservations::{NoReservations, ReservationDirectory};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub circulation: circulation::CirculationService,
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub reports: reports::ReportsService,
    store: Arc<dyn Store>,
}

impl Services {
    /// Create all services over one shared store and clock
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        reservations: Arc<dyn ReservationDirectory>,
        policy: CirculationConfig,
    ) -> Self {
        let fines = FinePolicy::from_config(&policy);
        Self {
            circulation: circulation::CirculationService::new(
                store.clone(),
                clock.clone(),
                reservations,
                policy,
            ),
            catalog: catalog::CatalogService::new(store.clone(), clock.clone()),
            members: members::MembersService::new(store.clone(), clock.clone()),
            reports: reports::ReportsService::new(store.clone(), clock, fines),
            store,
        }
    }

    /// Store the services run against, for readiness checks
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}
