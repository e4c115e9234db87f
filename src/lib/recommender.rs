use crate::Result;
use crate::lib::aggregator::{Totals, aggregate, summarize};
use crate::lib::config::PurchasePolicy;
use crate::lib::error::RecommenderError;
use crate::lib::fetcher::{RecommendationSource, fetch_recommendations};
use crate::lib::normalizer::{NormalizedRecommendation, normalize};
use crate::lib::service::Service;
use log::{debug, error, info};

/// A service whose recommendations could not be collected
#[derive(Debug)]
pub struct ServiceFailure {
    pub service: Service,
    pub error: RecommenderError,
}

/// Ranked recommendations with their totals
#[derive(Debug)]
pub struct RecommendationReport {
    pub recommendations: Vec<NormalizedRecommendation>,
    pub totals: Totals,
    pub failures: Vec<ServiceFailure>,
}

impl RecommendationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Recommender<S> {
    source: S,
    policy: PurchasePolicy,
    fail_fast: bool,
}

impl<S: RecommendationSource> Recommender<S> {
    pub fn new(source: S, policy: PurchasePolicy, fail_fast: bool) -> Self {
        Self {
            source,
            policy,
            fail_fast,
        }
    }

    /// Generate ranked recommendations for every service category
    ///
    /// The five fetches run concurrently. A failing category is recorded in
    /// [`RecommendationReport::failures`] and the rest are still reported,
    /// unless `fail_fast` is set, in which case the first failure in
    /// [`Service::ALL`] order is returned.
    pub async fn generate_recommendations(&self) -> Result<RecommendationReport> {
        let (ec2, rds, elasticache, opensearch, savings_plans) = tokio::join!(
            self.collect_service(Service::Ec2),
            self.collect_service(Service::Rds),
            self.collect_service(Service::ElastiCache),
            self.collect_service(Service::OpenSearch),
            self.collect_service(Service::ComputeSavingsPlan),
        );

        let mut lists = Vec::with_capacity(Service::ALL.len());
        let mut failures = Vec::new();

        for (service, outcome) in Service::ALL
            .into_iter()
            .zip([ec2, rds, elasticache, opensearch, savings_plans])
        {
            match outcome {
                Ok(recommendations) => lists.push(recommendations),
                Err(e) if self.fail_fast => return Err(e),
                Err(e) => {
                    error!("Failed to fetch {} recommendations: {}", service.description(), e);
                    failures.push(ServiceFailure { service, error: e });
                }
            }
        }

        let recommendations = aggregate(lists);
        let totals = summarize(&recommendations);

        info!(
            "Collected {} recommendations ({} of {} services failed)",
            recommendations.len(),
            failures.len(),
            Service::ALL.len()
        );

        Ok(RecommendationReport {
            recommendations,
            totals,
            failures,
        })
    }

    /// Fetch and normalize a single service category
    async fn collect_service(&self, service: Service) -> Result<Vec<NormalizedRecommendation>> {
        let raw = fetch_recommendations(&self.source, service, &self.policy).await?;
        let recommendations = normalize(&raw, service)?;

        debug!(
            "Normalized {} {} recommendations",
            recommendations.len(),
            service
        );
        Ok(recommendations)
    }
}
