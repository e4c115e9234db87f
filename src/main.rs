use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, info, warn};
use ri_recommender::{
    Cli, Config, CostExplorerClient, EXIT_CONFIG_FAILURE, EXIT_FETCH_FAILURE, Recommender, Result,
    emit, init_logger,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = report_parse_error(&e, e.print(), &mut io::stderr());
            return ExitCode::from(code);
        }
    };
    let quiet = cli.quiet;

    if let Err(e) = init_logger(cli.verbose, cli.quiet) {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_CONFIG_FAILURE);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            if quiet {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

/// Exit code for a clap error, writing it to `fallback` if clap could not print it
fn report_parse_error<W: Write>(e: &clap::Error, printed: io::Result<()>, fallback: &mut W) -> u8 {
    if printed.is_err() {
        let _ = write!(fallback, "{}", e);
    }
    // help and version requests are not failures
    if e.use_stderr() { EXIT_CONFIG_FAILURE } else { 0 }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        debug!("TLS crypto provider already installed");
    }

    let config = Config::from_cli(&cli)?;

    info!("Starting Reserved Instance & Savings Plan Recommender");
    debug!("Cost Explorer endpoint: {}", config.endpoint);
    debug!("Purchase policy: {:?}", config.policy);

    let client = CostExplorerClient::new(config.endpoint.clone(), config.region.clone()).await?;
    let recommender = Recommender::new(client, config.policy, config.fail_fast);
    let report = recommender.generate_recommendations().await?;

    let mut stdout = io::stdout().lock();
    emit(&config, &report.recommendations, &mut stdout)?;
    writeln!(stdout)?;
    writeln!(stdout, "{}", report.totals)?;
    stdout.flush()?;

    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        for failure in &report.failures {
            warn!("{} recommendations missing: {}", failure.service, failure.error);
        }
        Ok(ExitCode::from(EXIT_FETCH_FAILURE))
    }
}
