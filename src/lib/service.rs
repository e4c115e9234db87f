use std::fmt;

/// Service categories covered by purchase recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Ec2,
    Rds,
    ElastiCache,
    OpenSearch,
    ComputeSavingsPlan,
}

impl Service {
    /// Every category, in the order the report is assembled
    pub const ALL: [Service; 5] = [
        Service::Ec2,
        Service::Rds,
        Service::ElastiCache,
        Service::OpenSearch,
        Service::ComputeSavingsPlan,
    ];

    /// Categories served by reservation purchase recommendations
    pub const RESERVATIONS: [Service; 4] = [
        Service::Ec2,
        Service::Rds,
        Service::ElastiCache,
        Service::OpenSearch,
    ];

    /// Short tag shown in the `Service` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Ec2 => "EC2",
            Service::Rds => "RDS",
            Service::ElastiCache => "ElastiCache",
            Service::OpenSearch => "OpenSearch",
            Service::ComputeSavingsPlan => "Compute Savings Plan",
        }
    }

    /// Service name expected by `GetReservationPurchaseRecommendation`
    ///
    /// Savings plans are not queried by service name and return `None`.
    pub fn cost_explorer_name(&self) -> Option<&'static str> {
        match self {
            Service::Ec2 => Some("Amazon Elastic Compute Cloud - Compute"),
            Service::Rds => Some("Amazon Relational Database Service"),
            Service::ElastiCache => Some("Amazon ElastiCache"),
            Service::OpenSearch => Some("Amazon OpenSearch Service"),
            Service::ComputeSavingsPlan => None,
        }
    }

    /// Human-readable name of the recommendation kind, used in progress logs
    pub fn description(&self) -> &'static str {
        match self {
            Service::Ec2 => "EC2 Reserved Instance",
            Service::Rds => "RDS Reserved Instance",
            Service::ElastiCache => "ElastiCache Reserved Instance",
            Service::OpenSearch => "OpenSearch Reserved Instance",
            Service::ComputeSavingsPlan => "Savings Plans",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
