//! Ranking and portfolio totals

use std::fmt;

use crate::lib::normalizer::{NormalizedRecommendation, format_currency, format_months};

/// Portfolio-level savings figures
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub total_monthly_savings: f64,
    pub total_upfront_cost: f64,
    /// `None` when there are no positive savings to pay anything back
    pub payback_months: Option<f64>,
    pub annual_savings: f64,
}

impl Totals {
    /// The four summary lines printed after the report
    pub fn summary_lines(&self) -> [String; 4] {
        let payback = match self.payback_months {
            Some(_) => format!("{} months", format_months(self.payback_months)),
            None => format_months(None),
        };

        [
            format!(
                "Total potential monthly savings: {}",
                format_currency(self.total_monthly_savings)
            ),
            format!(
                "Total upfront cost: {}",
                format_currency(self.total_upfront_cost)
            ),
            format!("Estimated payback period: {}", payback),
            format!(
                "Estimated annual savings: {}",
                format_currency(self.annual_savings)
            ),
        ]
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary_lines().join("\n"))
    }
}

/// Merge per-service lists and rank by estimated monthly savings
///
/// The sort is stable: recommendations with equal savings keep the order in
/// which they were supplied.
pub fn aggregate(lists: Vec<Vec<NormalizedRecommendation>>) -> Vec<NormalizedRecommendation> {
    let mut combined: Vec<NormalizedRecommendation> = lists.into_iter().flatten().collect();
    combined.sort_by(|a, b| b.monthly_savings.total_cmp(&a.monthly_savings));
    combined
}

/// Compute portfolio totals for a set of recommendations
pub fn summarize(recommendations: &[NormalizedRecommendation]) -> Totals {
    // fold from +0.0; an empty float sum would print as "$-0.00"
    let total_monthly_savings = recommendations
        .iter()
        .fold(0.0, |acc, r| acc + r.monthly_savings);
    let total_upfront_cost = recommendations
        .iter()
        .fold(0.0, |acc, r| acc + r.upfront_cost);

    let payback_months = if total_monthly_savings > 0.0 {
        Some(total_upfront_cost / total_monthly_savings)
    } else {
        None
    };

    Totals {
        total_monthly_savings,
        total_upfront_cost,
        payback_months,
        annual_savings: total_monthly_savings * 12.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::normalizer::{Commitment, breakeven_months};
    use crate::lib::service::Service;

    fn rec(service: Service, resource_type: &str, savings: f64, upfront: f64) -> NormalizedRecommendation {
        NormalizedRecommendation {
            service,
            resource_type: resource_type.to_string(),
            commitment: Commitment::Instances(1),
            monthly_savings: savings,
            savings_percentage: 20.0,
            upfront_cost: upfront,
            breakeven_months: breakeven_months(upfront, savings),
            current_spend: 0.0,
            projected_spend: 0.0,
        }
    }

    #[test]
    fn test_aggregate_orders_by_savings_descending() {
        let a = rec(Service::Ec2, "A", 100.0, 0.0);
        let b = rec(Service::Rds, "B", 50.0, 0.0);

        let ranked = aggregate(vec![vec![b.clone()], vec![a.clone()]]);
        assert_eq!(ranked, vec![a, b]);
    }

    #[test]
    fn test_aggregate_is_stable_for_equal_savings() {
        let ranked = aggregate(vec![
            vec![
                rec(Service::Ec2, "first", 25.0, 0.0),
                rec(Service::Ec2, "top", 80.0, 0.0),
            ],
            vec![
                rec(Service::ElastiCache, "second", 25.0, 0.0),
                rec(Service::OpenSearch, "third", 25.0, 0.0),
            ],
        ]);

        let order: Vec<&str> = ranked.iter().map(|r| r.resource_type.as_str()).collect();
        assert_eq!(order, vec!["top", "first", "second", "third"]);
        assert!(
            ranked
                .windows(2)
                .all(|w| w[0].monthly_savings >= w[1].monthly_savings)
        );
    }

    #[test]
    fn test_aggregate_empty_lists() {
        assert!(aggregate(vec![vec![], vec![], vec![], vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_summarize_totals_and_payback() {
        let recs = vec![
            rec(Service::Ec2, "a", 40.0, 120.0),
            rec(Service::Rds, "b", 10.0, 30.0),
        ];

        let totals = summarize(&recs);
        assert_eq!(totals.total_monthly_savings, 50.0);
        assert_eq!(totals.total_upfront_cost, 150.0);
        assert_eq!(totals.payback_months, Some(3.0));
        assert_eq!(totals.annual_savings, totals.total_monthly_savings * 12.0);
    }

    #[test]
    fn test_total_matches_sum_of_displayed_values() {
        let recs: Vec<_> = [12.34, 0.01, 99.99, 1_234.56, 7.07, 0.5]
            .iter()
            .map(|s| rec(Service::Ec2, "x", *s, 0.0))
            .collect();

        let displayed: f64 = recs
            .iter()
            .map(|r| {
                r.to_row()
                    .monthly_savings
                    .trim_start_matches('$')
                    .parse::<f64>()
                    .unwrap()
            })
            .sum();

        let totals = summarize(&recs);
        assert!((totals.total_monthly_savings - displayed).abs() < 0.01);
    }

    #[test]
    fn test_summarize_empty_has_no_payback() {
        let totals = summarize(&[]);
        assert_eq!(totals, Totals::default());

        let lines = totals.summary_lines();
        assert_eq!(lines[0], "Total potential monthly savings: $0.00");
        assert_eq!(lines[1], "Total upfront cost: $0.00");
        assert_eq!(lines[2], "Estimated payback period: N/A");
        assert_eq!(lines[3], "Estimated annual savings: $0.00");
    }

    #[test]
    fn test_summarize_zero_savings_has_no_payback() {
        let totals = summarize(&[rec(Service::ComputeSavingsPlan, "N/A", 0.0, 50.0)]);
        assert_eq!(totals.payback_months, None);
        assert_eq!(totals.total_upfront_cost, 50.0);
    }

    #[test]
    fn test_summary_lines_format_payback_in_months() {
        let totals = summarize(&[rec(Service::Ec2, "a", 40.0, 100.0)]);
        assert_eq!(totals.summary_lines()[2], "Estimated payback period: 2.5 months");
        assert_eq!(totals.summary_lines()[3], "Estimated annual savings: $480.00");
    }
}
