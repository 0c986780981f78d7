use anyhow::Result;
use chrono::Local;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::config::AppConfig;
use crate::core::pipeline::Pipeline;
use crate::core::window::Window;

/// Signals need a baseline to compute trends against, so this command
/// always compares to the preceding period.
pub async fn run(
    days: Option<i64>,
    month: Option<String>,
    granularity: String,
    group_by: String,
    refresh: bool,
    opts: &OutputOptions,
) -> Result<()> {
    let config = AppConfig::load()?;
    let (granularity, group_by) =
        crate::cli::overview_cmd::parse_query_shape(&granularity, &group_by)?;
    let (window, baseline) = match month.as_deref() {
        Some(label) => {
            let window = Window::parse_month(label)?;
            (window, window.preceding_month())
        }
        None => {
            let days = days.unwrap_or(config.output.default_days);
            let window = Window::last_days(days, Local::now().date_naive())?;
            (window, window.preceding())
        }
    };

    let mut pipeline = Pipeline::from_config(config)?;
    let overview = pipeline
        .compute_overview(window, Some(baseline), &[], granularity, group_by, refresh)
        .await?;
    pipeline.flush()?;

    match opts.format {
        OutputFormat::Json => opts.print_json(&overview.signals)?,
        OutputFormat::Text => {
            println!("{}", renderer::render_signals(&overview.signals, opts.use_color));
        }
    }
    Ok(())
}
