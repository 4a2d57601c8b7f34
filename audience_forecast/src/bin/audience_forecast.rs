//! # audience-forecast
//!
//! Command-line front end for the audience analytics pipeline.

use audience_forecast::insights;
use audience_forecast::output::{default_output_name, write_forecast_csv, write_json_report};
use audience_forecast::{
    DashboardConfig, DashboardSession, FeaturedTable, ForecastError, ForecastRequest, ModelType,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "audience-forecast")]
#[command(about = "Audience analytics and forecasting", long_about = None)]
struct Cli {
    /// Pipeline config (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a model and forecast daily audience
    Forecast {
        /// Input CSV with Date, AudienceCount, Platform, EngagementRate, ConversionRate, ForecastError
        #[arg(short, long)]
        input: PathBuf,

        /// Platform to model. When omitted, every platform's rows are merged into
        /// one series with repeated timestamps
        #[arg(short, long)]
        platform: Option<String>,

        /// Model type (ARIMA, SARIMA, Prophet)
        #[arg(short, long, default_value = "ARIMA")]
        model: String,

        /// Days to forecast (config default when omitted)
        #[arg(long)]
        horizon: Option<usize>,

        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<NaiveDate>,

        /// Forecast CSV path (defaults to <platform>_forecast_<model>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Optional JSON report with insights and metrics
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Print the data overview without forecasting
    Summary {
        /// Input CSV
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<DashboardConfig, ForecastError> {
    match path {
        Some(path) => DashboardConfig::from_json_file(path),
        None => Ok(DashboardConfig::default()),
    }
}

fn print_summary(featured: &FeaturedTable) -> Result<(), ForecastError> {
    let overview = insights::overview(featured)?;
    println!("Rows:                {}", overview.rows);
    println!("Platforms:           {}", overview.platforms.join(", "));
    println!("Date range:          {} .. {}", overview.first_date, overview.last_date);
    println!("Total audience:      {:.0}", overview.total_audience);
    println!("Avg. engagement:     {:.2}%", overview.avg_engagement_rate);
    println!("Avg. conversion:     {:.2}%", overview.avg_conversion_rate);
    println!("Forecast accuracy:   {:.1}%", overview.forecast_accuracy);
    Ok(())
}

fn run_summary(config: DashboardConfig, input: PathBuf) -> Result<(), ForecastError> {
    let mut session = DashboardSession::new(config);
    let featured = session.load_csv(&input)?;
    print_summary(featured)
}

#[allow(clippy::too_many_arguments)]
fn run_forecast(
    config: DashboardConfig,
    input: PathBuf,
    platform: Option<String>,
    model: String,
    horizon: Option<usize>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    output: Option<PathBuf>,
    report: Option<PathBuf>,
) -> Result<(), ForecastError> {
    let model_type: ModelType = model.parse()?;
    let horizon = horizon.unwrap_or(config.horizon.default);

    let mut session = DashboardSession::new(config);
    print_summary(session.load_csv(&input)?)?;

    let mut request = ForecastRequest::new(model_type, horizon).with_dates(start_date, end_date);
    if let Some(platform) = platform {
        request = request.with_platform(platform);
    }

    let outcome = session.run_forecast(&request);
    if let Some(path) = &report {
        let insight = session.report(&request, outcome.as_ref())?;
        write_json_report(path, &insight)?;
        log::info!("Wrote report to {}", path.display());
    }
    let outcome = outcome?;

    println!();
    println!("Model:               {}", outcome.model_name);
    match (&outcome.metrics, &outcome.metrics_error) {
        (Some(metrics), _) => println!("Metrics:             {}", metrics),
        (None, Some(reason)) => eprintln!("Metrics unavailable [{}]", reason),
        (None, None) => {}
    }

    let output = output.unwrap_or_else(|| {
        let label = request.platform.as_deref().unwrap_or("all");
        PathBuf::from(default_output_name(label, model_type))
    });
    write_forecast_csv(&output, &outcome.timestamps, outcome.values())?;
    println!("Forecast:            {} day(s) -> {}", outcome.values().len(), output.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Forecast {
            input,
            platform,
            model,
            horizon,
            start_date,
            end_date,
            output,
            report,
        } => run_forecast(
            config, input, platform, model, horizon, start_date, end_date, output, report,
        ),
        Commands::Summary { input } => run_summary(config, input),
    });

    if let Err(e) = result {
        eprintln!("Error [{}]: {}", e.kind(), e);
        std::process::exit(1);
    }
}
