//! Recommendation fetchers
//!
//! Reservation and savings plan recommendations come back in different
//! envelopes, so a fetch yields a [`RawRecommendations`] tagged by kind.

use log::{debug, info};

use crate::lib::config::PurchasePolicy;
use crate::lib::cost_explorer::{RawSavingsPlanDetail, ReservationRecommendationGroup};
use crate::lib::service::Service;
use crate::Result;

/// Anything that can answer purchase recommendation queries
#[allow(async_fn_in_trait)]
pub trait RecommendationSource {
    /// Reservation recommendation groups for one of [`Service::RESERVATIONS`]
    async fn reservation_recommendations(
        &self,
        service: Service,
        policy: &PurchasePolicy,
    ) -> Result<Vec<ReservationRecommendationGroup>>;

    /// Compute Savings Plan recommendation details
    async fn savings_plans_recommendations(
        &self,
        policy: &PurchasePolicy,
    ) -> Result<Vec<RawSavingsPlanDetail>>;
}

/// Raw recommendations for a single service category
#[derive(Debug, Clone)]
pub enum RawRecommendations {
    /// Groups of per-instance-type details
    Reservations(Vec<ReservationRecommendationGroup>),
    /// Flat list of plan details
    SavingsPlans(Vec<RawSavingsPlanDetail>),
}

impl RawRecommendations {
    /// Number of detail records across all groups
    pub fn detail_count(&self) -> usize {
        match self {
            RawRecommendations::Reservations(groups) => groups
                .iter()
                .map(|g| g.recommendation_details.len())
                .sum(),
            RawRecommendations::SavingsPlans(details) => details.len(),
        }
    }
}

/// Fetch the raw recommendations for one service category
pub async fn fetch_recommendations<S: RecommendationSource>(
    source: &S,
    service: Service,
    policy: &PurchasePolicy,
) -> Result<RawRecommendations> {
    info!("Fetching {} recommendations...", service.description());

    let raw = match service {
        Service::ComputeSavingsPlan => source
            .savings_plans_recommendations(policy)
            .await
            .map(RawRecommendations::SavingsPlans)?,
        reservation => source
            .reservation_recommendations(reservation, policy)
            .await
            .map(RawRecommendations::Reservations)?,
    };

    debug!("{}: {} raw recommendation details", service, raw.detail_count());
    Ok(raw)
}
