mod cli;
mod core;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "costlens",
    about = "Cloud cost aggregation, trends and decision signals",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate costs for a window and compare against the previous period
    Overview {
        /// Rolling window length in days (1-365)
        #[arg(short, long)]
        days: Option<i64>,

        /// Calendar month window instead, as YYYY-MM
        #[arg(short, long, conflicts_with = "days")]
        month: Option<String>,

        /// Skip the baseline period (no trends, concentration signals only)
        #[arg(long)]
        no_baseline: bool,

        /// Filter raw records, as key=value (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Time bucket for raw records: daily or monthly
        #[arg(long, default_value = "daily")]
        granularity: String,

        /// Dimension to group raw records by (supported: service)
        #[arg(long = "group-by", default_value = "service")]
        group_by: String,

        /// Bypass the cache lookup but still write the fresh result through
        #[arg(long)]
        refresh: bool,
    },
    /// Compare two calendar months service by service
    Compare {
        /// Current month, as YYYY-MM
        #[arg(long)]
        current: String,

        /// Baseline month, as YYYY-MM
        #[arg(long)]
        baseline: String,

        /// Bypass the cache lookup but still write the fresh result through
        #[arg(long)]
        refresh: bool,
    },
    /// Derive decision signals for a window
    Signals {
        /// Rolling window length in days (1-365)
        #[arg(short, long)]
        days: Option<i64>,

        /// Calendar month window instead, as YYYY-MM
        #[arg(short, long, conflicts_with = "days")]
        month: Option<String>,

        /// Time bucket for raw records: daily or monthly
        #[arg(long, default_value = "daily")]
        granularity: String,

        /// Dimension to group raw records by (supported: service)
        #[arg(long = "group-by", default_value = "service")]
        group_by: String,

        /// Bypass the cache lookup but still write the fresh result through
        #[arg(long)]
        refresh: bool,
    },
    /// Inspect or clear the API response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry count, hit rate and estimated savings
    Stats,
    /// Remove all cached entries
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let output_opts = cli::output::OutputOptions {
        format: if cli.json {
            cli::output::OutputFormat::Json
        } else {
            match cli.format.as_deref() {
                Some("json") => cli::output::OutputFormat::Json,
                _ => cli::output::OutputFormat::Text,
            }
        },
        pretty: cli.pretty,
        use_color: cli::output::detect_color(!cli.no_color),
        verbose: cli.verbose,
    };

    match cli.command {
        None | Some(Commands::Overview { .. }) => {
            let (days, month, no_baseline, filters, granularity, group_by, refresh) =
                match cli.command {
                    Some(Commands::Overview {
                        days,
                        month,
                        no_baseline,
                        filters,
                        granularity,
                        group_by,
                        refresh,
                    }) => (days, month, no_baseline, filters, granularity, group_by, refresh),
                    _ => (
                        None,
                        None,
                        false,
                        Vec::new(),
                        "daily".to_string(),
                        "service".to_string(),
                        false,
                    ),
                };
            cli::overview_cmd::run(
                days,
                month,
                no_baseline,
                filters,
                granularity,
                group_by,
                refresh,
                &output_opts,
            )
            .await?;
        }
        Some(Commands::Compare {
            current,
            baseline,
            refresh,
        }) => {
            cli::overview_cmd::compare(current, baseline, refresh, &output_opts).await?;
        }
        Some(Commands::Signals {
            days,
            month,
            granularity,
            group_by,
            refresh,
        }) => {
            cli::signals_cmd::run(days, month, granularity, group_by, refresh, &output_opts)
                .await?;
        }
        Some(Commands::Cache { action }) => match action {
            CacheAction::Stats => cli::cache_cmd::stats(&output_opts)?,
            CacheAction::Clear => cli::cache_cmd::clear(&output_opts)?,
        },
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init => cli::config_cmd::init(&output_opts)?,
            ConfigAction::Check => cli::config_cmd::check(&output_opts)?,
        },
    }

    Ok(())
}
