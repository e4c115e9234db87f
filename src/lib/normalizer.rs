//! Normalization of raw Cost Explorer recommendations
//!
//! Reservation and savings plan details are flattened into one
//! [`NormalizedRecommendation`] shape so they can be ranked, summed and
//! rendered together.

use std::fmt;

use serde::Serialize;

use crate::lib::cost_explorer::{
    RawInstanceDetails, RawReservationDetail, RawSavingsPlanDetail, ReservationRecommendationGroup,
};
use crate::lib::fetcher::RawRecommendations;
use crate::lib::service::Service;
use crate::{RecommenderError, Result};

/// Sentinel for values that do not apply to a row
pub const NOT_APPLICABLE: &str = "N/A";

/// Hours used to turn hourly savings plan rates into monthly amounts
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Instance or node class of a reservation recommendation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceDetail {
    Compute { instance_type: String },
    Database { instance_type: String },
    Cache { node_type: String },
    Search { instance_type: String },
}

impl InstanceDetail {
    /// Instance or node type, `"N/A"` if Cost Explorer left it blank
    pub fn resource_type(&self) -> &str {
        let value = match self {
            InstanceDetail::Compute { instance_type } => instance_type,
            InstanceDetail::Database { instance_type } => instance_type,
            InstanceDetail::Cache { node_type } => node_type,
            InstanceDetail::Search { instance_type } => instance_type,
        };
        if value.trim().is_empty() {
            NOT_APPLICABLE
        } else {
            value
        }
    }

    /// Service category this detail belongs to
    pub fn service(&self) -> Service {
        match self {
            InstanceDetail::Compute { .. } => Service::Ec2,
            InstanceDetail::Database { .. } => Service::Rds,
            InstanceDetail::Cache { .. } => Service::ElastiCache,
            InstanceDetail::Search { .. } => Service::OpenSearch,
        }
    }
}

impl TryFrom<&RawInstanceDetails> for InstanceDetail {
    type Error = RecommenderError;

    /// Exactly one container must be populated
    fn try_from(raw: &RawInstanceDetails) -> Result<Self> {
        let mut found = Vec::with_capacity(1);

        if let Some(ec2) = &raw.ec2 {
            found.push(InstanceDetail::Compute {
                instance_type: ec2.instance_type.clone(),
            });
        }
        if let Some(rds) = &raw.rds {
            found.push(InstanceDetail::Database {
                instance_type: rds.instance_type.clone(),
            });
        }
        if let Some(cache) = &raw.elasticache {
            found.push(InstanceDetail::Cache {
                node_type: cache.node_type.clone(),
            });
        }
        if let Some(search) = &raw.opensearch {
            let parts: Vec<&str> = [&search.instance_class, &search.instance_size]
                .into_iter()
                .map(|part| part.trim())
                .filter(|part| !part.is_empty())
                .collect();
            found.push(InstanceDetail::Search {
                instance_type: parts.join("."),
            });
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(RecommenderError::Parse(
                "recommendation has no instance details".to_string(),
            )),
            n => Err(RecommenderError::Parse(format!(
                "recommendation has {} instance detail containers, expected one",
                n
            ))),
        }
    }
}

/// What the recommendation asks you to buy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commitment {
    /// Number of reserved instances or nodes
    Instances(u32),
    /// Savings plan commitment in dollars per hour
    Hourly(f64),
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commitment::Instances(count) => write!(f, "{}", count),
            Commitment::Hourly(rate) => write!(f, "{}/hour", format_currency(*rate)),
        }
    }
}

/// A purchase recommendation in the common shape shared by all services
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecommendation {
    pub service: Service,
    pub resource_type: String,
    pub commitment: Commitment,
    pub monthly_savings: f64,
    pub savings_percentage: f64,
    pub upfront_cost: f64,
    pub breakeven_months: Option<f64>,
    pub current_spend: f64,
    pub projected_spend: f64,
}

impl NormalizedRecommendation {
    /// Display form with every amount formatted
    pub fn to_row(&self) -> RecommendationRow {
        RecommendationRow {
            service: self.service.to_string(),
            resource_type: self.resource_type.clone(),
            quantity_or_commitment: self.commitment.to_string(),
            monthly_savings: format_currency(self.monthly_savings),
            savings_percentage: format_percentage(self.savings_percentage),
            upfront_cost: format_currency(self.upfront_cost),
            breakeven_months: format_months(self.breakeven_months),
            current_spend: format_currency(self.current_spend),
            projected_spend: format_currency(self.projected_spend),
        }
    }
}

/// Formatted recommendation, serialized as one JSON object or CSV record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationRow {
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "Instance Type")]
    pub resource_type: String,
    #[serde(rename = "Quantity / Commitment")]
    pub quantity_or_commitment: String,
    #[serde(rename = "Estimated Monthly Savings")]
    pub monthly_savings: String,
    #[serde(rename = "Estimated Savings Percentage")]
    pub savings_percentage: String,
    #[serde(rename = "Upfront Cost")]
    pub upfront_cost: String,
    #[serde(rename = "Estimated Break Even (Months)")]
    pub breakeven_months: String,
    #[serde(rename = "Current On-Demand Spend")]
    pub current_spend: String,
    #[serde(rename = "Estimated Reserved Spend")]
    pub projected_spend: String,
}

impl RecommendationRow {
    /// Column titles, in serialization order
    pub const HEADERS: [&'static str; 9] = [
        "Service",
        "Instance Type",
        "Quantity / Commitment",
        "Estimated Monthly Savings",
        "Estimated Savings Percentage",
        "Upfront Cost",
        "Estimated Break Even (Months)",
        "Current On-Demand Spend",
        "Estimated Reserved Spend",
    ];

    /// Cell values in the same order as [`Self::HEADERS`]
    pub fn cells(&self) -> [&str; 9] {
        [
            &self.service,
            &self.resource_type,
            &self.quantity_or_commitment,
            &self.monthly_savings,
            &self.savings_percentage,
            &self.upfront_cost,
            &self.breakeven_months,
            &self.current_spend,
            &self.projected_spend,
        ]
    }
}

/// Normalize the raw recommendations fetched for `service`
pub fn normalize(raw: &RawRecommendations, service: Service) -> Result<Vec<NormalizedRecommendation>> {
    match (raw, service) {
        (RawRecommendations::SavingsPlans(details), Service::ComputeSavingsPlan) => {
            normalize_savings_plans(details)
        }
        (RawRecommendations::Reservations(groups), service)
            if service != Service::ComputeSavingsPlan =>
        {
            normalize_reservations(groups, service)
        }
        _ => Err(RecommenderError::Parse(format!(
            "unexpected recommendation kind for {}",
            service
        ))),
    }
}

/// Flatten every detail of every group, preserving order
pub fn normalize_reservations(
    groups: &[ReservationRecommendationGroup],
    service: Service,
) -> Result<Vec<NormalizedRecommendation>> {
    groups
        .iter()
        .flat_map(|group| group.recommendation_details.iter())
        .map(|detail| normalize_reservation_detail(detail, service))
        .collect()
}

fn normalize_reservation_detail(
    detail: &RawReservationDetail,
    service: Service,
) -> Result<NormalizedRecommendation> {
    let instance = InstanceDetail::try_from(&detail.instance_details)?;
    if instance.service() != service {
        return Err(RecommenderError::Parse(format!(
            "{} recommendation carries {} instance details",
            service,
            instance.service()
        )));
    }

    let count = instance_count(required(
        detail.recommended_number_of_instances_to_purchase,
        "RecommendedNumberOfInstancesToPurchase",
        service,
    )?)?;
    let monthly_savings = round_cents(required(
        detail.estimated_monthly_savings_amount,
        "EstimatedMonthlySavingsAmount",
        service,
    )?);
    let savings_percentage = round_cents(required(
        detail.estimated_monthly_savings_percentage,
        "EstimatedMonthlySavingsPercentage",
        service,
    )?);
    let upfront_cost = round_cents(required(detail.upfront_cost, "UpfrontCost", service)?);

    Ok(NormalizedRecommendation {
        service,
        resource_type: instance.resource_type().to_string(),
        commitment: Commitment::Instances(count),
        monthly_savings,
        savings_percentage,
        upfront_cost,
        breakeven_months: breakeven_months(upfront_cost, monthly_savings),
        current_spend: round_cents(detail.estimated_monthly_on_demand_cost),
        projected_spend: round_cents(detail.recurring_standard_monthly_cost),
    })
}

/// Savings plan details are already flat
pub fn normalize_savings_plans(
    details: &[RawSavingsPlanDetail],
) -> Result<Vec<NormalizedRecommendation>> {
    details.iter().map(normalize_savings_plan_detail).collect()
}

fn normalize_savings_plan_detail(
    detail: &RawSavingsPlanDetail,
) -> Result<NormalizedRecommendation> {
    let service = Service::ComputeSavingsPlan;
    let hourly_commitment = required(
        detail.hourly_commitment_to_purchase,
        "HourlyCommitmentToPurchase",
        service,
    )?;
    let monthly_savings = round_cents(required(
        detail.estimated_monthly_savings_amount,
        "EstimatedMonthlySavingsAmount",
        service,
    )?);
    let savings_percentage = round_cents(required(
        detail.estimated_savings_percentage,
        "EstimatedSavingsPercentage",
        service,
    )?);
    let upfront_cost = round_cents(required(detail.upfront_cost, "UpfrontCost", service)?);

    Ok(NormalizedRecommendation {
        service,
        resource_type: NOT_APPLICABLE.to_string(),
        commitment: Commitment::Hourly(round_cents(hourly_commitment)),
        monthly_savings,
        savings_percentage,
        upfront_cost,
        breakeven_months: breakeven_months(upfront_cost, monthly_savings),
        current_spend: round_cents(detail.current_average_hourly_on_demand_spend * HOURS_PER_MONTH),
        projected_spend: round_cents(hourly_commitment * HOURS_PER_MONTH),
    })
}

/// A field the row cannot be built without
fn required(value: Option<f64>, field: &str, service: Service) -> Result<f64> {
    value.ok_or_else(|| {
        RecommenderError::Parse(format!("{} recommendation is missing {}", service, field))
    })
}

fn instance_count(value: f64) -> Result<u32> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as u32)
    } else {
        Err(RecommenderError::Parse(format!(
            "recommended instance count {} is not a whole number",
            value
        )))
    }
}

/// Months of savings needed to recover the upfront cost
///
/// `None` when there are no positive savings to divide by.
pub fn breakeven_months(upfront_cost: f64, monthly_savings: f64) -> Option<f64> {
    if monthly_savings > 0.0 {
        Some(upfront_cost / monthly_savings)
    } else {
        None
    }
}

/// Round to whole cents
///
/// Rounds the exact decimal value the way `{:.2}` does, exact ties going to
/// the even cent, so a rounded amount prints the same digits as the raw one.
pub fn round_cents(value: f64) -> f64 {
    // adding 0.0 turns -0.0 into 0.0
    format!("{:.2}", value).parse::<f64>().unwrap_or(value) + 0.0
}

pub fn format_currency(value: f64) -> String {
    format!("${:.2}", value)
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

pub fn format_months(months: Option<f64>) -> String {
    match months {
        Some(months) => format!("{:.1}", months),
        None => NOT_APPLICABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::cost_explorer::{RawInstanceTypeDetails, RawNodeTypeDetails, RawSearchDetails};

    fn ec2_details(instance_type: &str) -> RawInstanceDetails {
        RawInstanceDetails {
            ec2: Some(RawInstanceTypeDetails {
                instance_type: instance_type.to_string(),
            }),
            ..Default::default()
        }
    }

    fn reservation(
        instance_details: RawInstanceDetails,
        count: f64,
        upfront: f64,
        savings: f64,
    ) -> RawReservationDetail {
        RawReservationDetail {
            instance_details,
            recommended_number_of_instances_to_purchase: Some(count),
            estimated_monthly_savings_amount: Some(savings),
            estimated_monthly_savings_percentage: Some(25.0),
            upfront_cost: Some(upfront),
            estimated_monthly_on_demand_cost: 160.0,
            recurring_standard_monthly_cost: 120.0,
        }
    }

    fn group(details: Vec<RawReservationDetail>) -> ReservationRecommendationGroup {
        ReservationRecommendationGroup {
            recommendation_details: details,
        }
    }

    #[test]
    fn test_ec2_breakeven_scenario() {
        let groups = vec![group(vec![reservation(
            ec2_details("m5.large"),
            2.0,
            120.0,
            40.0,
        )])];

        let recs = normalize_reservations(&groups, Service::Ec2).unwrap();
        assert_eq!(recs.len(), 1);

        let row = recs[0].to_row();
        assert_eq!(row.service, "EC2");
        assert_eq!(row.resource_type, "m5.large");
        assert_eq!(row.quantity_or_commitment, "2");
        assert_eq!(row.breakeven_months, "3.0");
        assert_eq!(row.upfront_cost, "$120.00");
        assert_eq!(row.monthly_savings, "$40.00");
        assert_eq!(row.savings_percentage, "25.00%");
        assert_eq!(row.current_spend, "$160.00");
        assert_eq!(row.projected_spend, "$120.00");
    }

    #[test]
    fn test_savings_plan_zero_savings_has_no_breakeven() {
        let details = vec![RawSavingsPlanDetail {
            hourly_commitment_to_purchase: Some(0.5),
            estimated_monthly_savings_amount: Some(0.0),
            estimated_savings_percentage: Some(0.0),
            upfront_cost: Some(50.0),
            current_average_hourly_on_demand_spend: 1.0,
        }];

        let recs = normalize_savings_plans(&details).unwrap();
        assert_eq!(recs[0].breakeven_months, None);

        let row = recs[0].to_row();
        assert_eq!(row.breakeven_months, "N/A");
        assert_eq!(row.service, "Compute Savings Plan");
        assert_eq!(row.resource_type, "N/A");
        assert_eq!(row.quantity_or_commitment, "$0.50/hour");
        assert_eq!(row.current_spend, "$730.00");
        assert_eq!(row.projected_spend, "$365.00");
    }

    #[test]
    fn test_details_across_groups_keep_order() {
        let groups = vec![
            group(vec![
                reservation(ec2_details("m5.large"), 1.0, 0.0, 10.0),
                reservation(ec2_details("c5.xlarge"), 1.0, 0.0, 30.0),
            ]),
            group(vec![reservation(ec2_details("t3.micro"), 4.0, 0.0, 5.0)]),
        ];

        let recs = normalize_reservations(&groups, Service::Ec2).unwrap();
        let types: Vec<&str> = recs.iter().map(|r| r.resource_type.as_str()).collect();
        assert_eq!(types, vec!["m5.large", "c5.xlarge", "t3.micro"]);
    }

    #[test]
    fn test_each_container_maps_to_its_service() {
        let cases = [
            (
                RawInstanceDetails {
                    rds: Some(RawInstanceTypeDetails {
                        instance_type: "db.r5.large".into(),
                    }),
                    ..Default::default()
                },
                Service::Rds,
                "db.r5.large",
            ),
            (
                RawInstanceDetails {
                    elasticache: Some(RawNodeTypeDetails {
                        node_type: "cache.m6g.large".into(),
                    }),
                    ..Default::default()
                },
                Service::ElastiCache,
                "cache.m6g.large",
            ),
            (
                RawInstanceDetails {
                    opensearch: Some(RawSearchDetails {
                        instance_class: "r6g".into(),
                        instance_size: "large".into(),
                    }),
                    ..Default::default()
                },
                Service::OpenSearch,
                "r6g.large",
            ),
        ];

        for (details, service, expected) in cases {
            let groups = vec![group(vec![reservation(details, 1.0, 0.0, 1.0)])];
            let recs = normalize_reservations(&groups, service).unwrap();
            assert_eq!(recs[0].service, service);
            assert_eq!(recs[0].resource_type, expected);
        }
    }

    #[test]
    fn test_missing_instance_details_rejected() {
        let groups = vec![group(vec![reservation(
            RawInstanceDetails::default(),
            1.0,
            0.0,
            1.0,
        )])];
        let err = normalize_reservations(&groups, Service::Ec2).unwrap_err();
        assert!(matches!(err, RecommenderError::Parse(_)));
    }

    #[test]
    fn test_multiple_instance_details_rejected() {
        let mut details = ec2_details("m5.large");
        details.rds = Some(RawInstanceTypeDetails {
            instance_type: "db.t3.micro".into(),
        });
        let err = InstanceDetail::try_from(&details).unwrap_err();
        assert!(err.to_string().contains("2 instance detail containers"));
    }

    #[test]
    fn test_details_for_other_service_rejected() {
        let groups = vec![group(vec![reservation(ec2_details("m5.large"), 1.0, 0.0, 1.0)])];
        assert!(normalize_reservations(&groups, Service::Rds).is_err());
    }

    #[test]
    fn test_blank_instance_type_becomes_sentinel() {
        let groups = vec![group(vec![reservation(ec2_details(""), 1.0, 0.0, 1.0)])];
        let recs = normalize_reservations(&groups, Service::Ec2).unwrap();
        assert_eq!(recs[0].resource_type, NOT_APPLICABLE);
    }

    #[test]
    fn test_opensearch_without_class_or_size() {
        let details = RawInstanceDetails {
            opensearch: Some(RawSearchDetails {
                instance_class: "m6g".into(),
                instance_size: String::new(),
            }),
            ..Default::default()
        };
        assert_eq!(InstanceDetail::try_from(&details).unwrap().resource_type(), "m6g");

        let details = RawInstanceDetails {
            opensearch: Some(RawSearchDetails::default()),
            ..Default::default()
        };
        assert_eq!(
            InstanceDetail::try_from(&details).unwrap().resource_type(),
            NOT_APPLICABLE
        );
    }

    #[test]
    fn test_reservation_missing_required_amount_rejected() {
        let mut detail = reservation(ec2_details("m5.large"), 1.0, 0.0, 10.0);
        detail.estimated_monthly_savings_percentage = None;
        let err = normalize_reservations(&[group(vec![detail])], Service::Ec2).unwrap_err();
        assert!(matches!(err, RecommenderError::Parse(_)));
        assert!(err.to_string().contains("EstimatedMonthlySavingsPercentage"));

        let detail = RawReservationDetail {
            instance_details: ec2_details("m5.large"),
            recommended_number_of_instances_to_purchase: Some(2.0),
            ..Default::default()
        };
        let err = normalize_reservations(&[group(vec![detail])], Service::Ec2).unwrap_err();
        assert!(err.to_string().contains("EstimatedMonthlySavingsAmount"));
    }

    #[test]
    fn test_savings_plan_missing_commitment_rejected() {
        let details = vec![RawSavingsPlanDetail {
            estimated_monthly_savings_amount: Some(12.0),
            estimated_savings_percentage: Some(10.0),
            upfront_cost: Some(0.0),
            ..Default::default()
        }];
        let err = normalize_savings_plans(&details).unwrap_err();
        assert!(err.to_string().contains("HourlyCommitmentToPurchase"));
    }

    #[test]
    fn test_fractional_instance_count_rejected() {
        let groups = vec![group(vec![reservation(ec2_details("m5.large"), 1.5, 0.0, 1.0)])];
        assert!(normalize_reservations(&groups, Service::Ec2).is_err());
    }

    #[test]
    fn test_normalize_rejects_mismatched_kind() {
        let raw = RawRecommendations::SavingsPlans(vec![]);
        assert!(normalize(&raw, Service::Ec2).is_err());

        let raw = RawRecommendations::Reservations(vec![]);
        assert!(normalize(&raw, Service::ComputeSavingsPlan).is_err());
        assert!(normalize(&raw, Service::Rds).unwrap().is_empty());
    }

    #[test]
    fn test_breakeven_matches_division_to_one_decimal() {
        for (upfront, savings) in [(100.0, 30.0), (999.99, 12.34), (0.0, 5.0), (1.0, 0.01)] {
            let months = breakeven_months(upfront, savings).unwrap();
            assert_eq!(
                format_months(Some(months)),
                format!("{:.1}", upfront / savings)
            );
        }
        assert_eq!(breakeven_months(10.0, 0.0), None);
        assert_eq!(breakeven_months(10.0, -3.0), None);
    }

    #[test]
    fn test_amounts_rounded_to_cents() {
        assert_eq!(round_cents(12.345_6), 12.35);
        assert_eq!(round_cents(0.004), 0.0);
        assert_eq!(format_currency(round_cents(-0.001)), "$0.00");
        assert_eq!(format_percentage(27.3), "27.30%");
    }

    #[test]
    fn test_exact_ties_round_to_even_cent() {
        assert_eq!(round_cents(0.125), 0.12);
        assert_eq!(round_cents(0.375), 0.38);
        assert_eq!(format_currency(round_cents(0.125)), "$0.12");
        assert_eq!(format_percentage(round_cents(12.625)), "12.62%");
    }

    #[test]
    fn test_rounding_then_formatting_matches_formatting_once() {
        for value in [0.125, 0.285, 1.005, 2.675, 40.5, 99.999, 1234.565, 0.015] {
            assert_eq!(format_currency(round_cents(value)), format!("${:.2}", value));
        }
    }
}
