use std::path::PathBuf;

use clap::Parser;
use url::Url;

use crate::lib::config::{LookbackPeriod, PaymentOption, Term};

/// Reserved Instance & Savings Plan Recommender
///
/// Fetches purchase recommendations from AWS Cost Explorer for EC2, RDS,
/// ElastiCache, OpenSearch and Compute Savings Plans, ranks them by estimated
/// monthly savings and prints a savings summary.
#[derive(Parser, Debug)]
#[command(name = "ri-recommender", author, version, about, styles=get_styles())]
pub struct Cli {
    /// Directory to save output files
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub output_dir: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    pub format: OutputFormat,

    /// Browse the table interactively instead of printing it
    ///
    /// Only valid with `--format table`
    #[arg(short, long)]
    pub interactive: bool,

    /// AWS Region used to reach and sign requests for Cost Explorer
    #[arg(short, long, default_value = "us-east-1")]
    pub region: String,

    /// Override the Cost Explorer endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<Url>,

    /// Usage history analyzed by the recommendation engine
    #[arg(long, value_name = "PERIOD", default_value = "sixty-days")]
    pub lookback: LookbackPeriod,

    /// Reservation or plan term
    #[arg(long, default_value = "one-year")]
    pub term: Term,

    /// Payment option for the purchase
    #[arg(long, value_name = "OPTION", default_value = "no-upfront")]
    pub payment_option: PaymentOption,

    /// Abort on the first service whose recommendations cannot be fetched
    #[arg(long)]
    pub fail_fast: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress log output to stderr (logs still written to file)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the recommendation report
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Print a grid table to stdout
    Table,
    /// Write a JSON file to the output directory
    Json,
    /// Write a CSV file to the output directory
    Csv,
}

impl OutputFormat {
    /// File extension for formats that write a report file
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Table => None,
            OutputFormat::Json => Some("json"),
            OutputFormat::Csv => Some("csv"),
        }
    }
}

/// Set color and variants for help description
///
/// Thanks to [Praveen Perera](https://stackoverflow.com/a/76916424)
fn get_styles() -> clap::builder::Styles {
    let heading = anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)));
    let failure = anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)));

    clap::builder::Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(failure)
        .error(failure)
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}
