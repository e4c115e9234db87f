//! Reserved Instance & Savings Plan Recommender Library
//!
//! This library fetches purchase recommendations from AWS Cost Explorer,
//! normalizes them into a common shape, ranks them by estimated monthly
//! savings and renders the result as a table, JSON or CSV.

pub mod lib {
    pub mod aggregator;
    pub mod cli;
    pub mod config;
    pub mod cost_explorer;
    pub mod error;
    pub mod fetcher;
    pub mod logger;
    pub mod normalizer;
    pub mod output;
    pub mod recommender;
    pub mod service;
    pub mod tui;
}

// Re-export commonly used types at the root level for convenience
pub use lib::aggregator::{Totals, aggregate, summarize};
pub use lib::cli::{Cli, OutputFormat};
pub use lib::config::{Config, LookbackPeriod, PaymentOption, PurchasePolicy, Term};
pub use lib::cost_explorer::{
    CostExplorerClient, RawInstanceDetails, RawInstanceTypeDetails, RawNodeTypeDetails,
    RawReservationDetail, RawSavingsPlanDetail, RawSearchDetails, ReservationRecommendationGroup,
};
pub use lib::error::{
    AwsError, ConfigError, EXIT_CONFIG_FAILURE, EXIT_FETCH_FAILURE, EXIT_OUTPUT_FAILURE,
    RecommenderError, Result,
};
pub use lib::fetcher::{RawRecommendations, RecommendationSource, fetch_recommendations};
pub use lib::logger::init_logger;
pub use lib::normalizer::{
    Commitment, InstanceDetail, NOT_APPLICABLE, NormalizedRecommendation, RecommendationRow,
    normalize,
};
pub use lib::output::{emit, render_table, report_path};
pub use lib::recommender::{RecommendationReport, Recommender, ServiceFailure};
pub use lib::service::Service;
pub use lib::tui::display_recommendations_table;
