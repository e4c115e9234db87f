use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use url::Url;

use crate::lib::cli::{Cli, OutputFormat};
use crate::{ConfigError, Result};

/// Usage history the recommendation engine analyzes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LookbackPeriod {
    SevenDays,
    ThirtyDays,
    #[default]
    SixtyDays,
}

impl LookbackPeriod {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            LookbackPeriod::SevenDays => "SEVEN_DAYS",
            LookbackPeriod::ThirtyDays => "THIRTY_DAYS",
            LookbackPeriod::SixtyDays => "SIXTY_DAYS",
        }
    }
}

/// Reservation or plan term length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Term {
    #[default]
    OneYear,
    ThreeYears,
}

impl Term {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Term::OneYear => "ONE_YEAR",
            Term::ThreeYears => "THREE_YEARS",
        }
    }
}

/// How the purchase is paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PaymentOption {
    #[default]
    NoUpfront,
    PartialUpfront,
    AllUpfront,
}

impl PaymentOption {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            PaymentOption::NoUpfront => "NO_UPFRONT",
            PaymentOption::PartialUpfront => "PARTIAL_UPFRONT",
            PaymentOption::AllUpfront => "ALL_UPFRONT",
        }
    }
}

/// Parameters shared by every recommendation request
///
/// The default is a 60-day lookback, a 1-year term and no upfront payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurchasePolicy {
    pub lookback: LookbackPeriod,
    pub term: Term,
    pub payment_option: PaymentOption,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub endpoint: Url,
    pub region: String,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub interactive: bool,
    pub policy: PurchasePolicy,
    pub fail_fast: bool,
    pub report_date: NaiveDate,
}

impl Config {
    /// Validate command-line arguments into a run configuration
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.interactive && cli.format != OutputFormat::Table {
            return Err(ConfigError::InvalidValue(
                "--interactive can only be used with --format table".to_string(),
            )
            .into());
        }

        let region = cli.region.trim().to_string();
        let endpoint = match &cli.endpoint_url {
            Some(url) => url.clone(),
            None => cost_explorer_endpoint(&region)?,
        };

        Ok(Self {
            endpoint,
            region,
            output_dir: cli.output_dir.clone(),
            format: cli.format,
            interactive: cli.interactive,
            policy: PurchasePolicy {
                lookback: cli.lookback,
                term: cli.term,
                payment_option: cli.payment_option,
            },
            fail_fast: cli.fail_fast,
            report_date: Local::now().date_naive(),
        })
    }
}

/// Default Cost Explorer endpoint for a region
pub fn cost_explorer_endpoint(region: &str) -> Result<Url> {
    if region.is_empty()
        || !region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ConfigError::InvalidValue(format!("Invalid AWS region: '{}'", region)).into());
    }

    let domain = if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    };

    Url::parse(&format!("https://ce.{}.{}/", region, domain))
        .map_err(|e| ConfigError::InvalidValue(format!("Invalid endpoint: {}", e)).into())
}
