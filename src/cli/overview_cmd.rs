use anyhow::{bail, Context, Result};
use chrono::Local;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::config::AppConfig;
use crate::core::fingerprint::{Granularity, GroupBy};
use crate::core::pipeline::Pipeline;
use crate::core::window::Window;

/// Parse the query-shaping flags. Unsupported dimensions fail here, before
/// the cache or the source is ever touched.
pub fn parse_query_shape(granularity: &str, group_by: &str) -> Result<(Granularity, GroupBy)> {
    let granularity = Granularity::parse(granularity)?;
    let group_by = GroupBy::parse(group_by)?;
    Ok((granularity, group_by))
}

/// Parse repeated `--filter key=value` arguments.
pub fn parse_filters(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("invalid filter '{}', expected key=value", entry))
        })
        .collect()
}

/// Resolve the current window and its baseline from the CLI arguments.
fn resolve_windows(
    days: Option<i64>,
    month: Option<&str>,
    no_baseline: bool,
    config: &AppConfig,
) -> Result<(Window, Option<Window>)> {
    let (window, baseline) = match month {
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
    Ok((window, (!no_baseline).then_some(baseline)))
}

pub async fn run(
    days: Option<i64>,
    month: Option<String>,
    no_baseline: bool,
    filters: Vec<String>,
    granularity: String,
    group_by: String,
    refresh: bool,
    opts: &OutputOptions,
) -> Result<()> {
    let config = AppConfig::load()?;
    let (granularity, group_by) = parse_query_shape(&granularity, &group_by)?;
    let filters = parse_filters(&filters)?;
    let (window, baseline) = resolve_windows(days, month.as_deref(), no_baseline, &config)?;

    opts.diag(&format!(
        "window {} (baseline: {})",
        window.label(),
        baseline.map(|b| b.label()).unwrap_or_else(|| "none".into())
    ));

    let top_services = config.output.top_services;
    let mut pipeline = Pipeline::from_config(config)?;
    let overview = pipeline
        .compute_overview(window, baseline, &filters, granularity, group_by, refresh)
        .await?;
    pipeline.flush()?;

    match opts.format {
        OutputFormat::Json => opts.print_json(&overview)?,
        OutputFormat::Text => {
            println!("{}", renderer::render_overview(&overview, top_services, opts.use_color));
            println!();
            println!("{}", renderer::render_signals(&overview.signals, opts.use_color));
        }
    }
    Ok(())
}

pub async fn compare(
    current: String,
    baseline: String,
    refresh: bool,
    opts: &OutputOptions,
) -> Result<()> {
    let current = Window::parse_month(&current)?;
    let baseline_window = Window::parse_month(&baseline)?;
    if current == baseline_window {
        bail!("current and baseline months are the same");
    }

    let config = AppConfig::load()?;
    let mut pipeline = Pipeline::from_config(config)?;
    let comparison = pipeline
        .compare_windows(current, baseline_window, refresh)
        .await?;
    pipeline.flush()?;

    match opts.format {
        OutputFormat::Json => opts.print_json(&comparison)?,
        OutputFormat::Text => {
            println!("{}", renderer::render_comparison(&comparison, opts.use_color));
            println!();
            println!("{}", renderer::render_signals(&comparison.signals, opts.use_color));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_group_by_fails_before_any_fetch() {
        assert!(parse_query_shape("daily", "region").is_err());
        assert!(parse_query_shape("hourly", "service").is_err());
    }

    #[test]
    fn query_shape_accepts_known_values_case_insensitively() {
        let (granularity, group_by) = parse_query_shape("Monthly", " Service ").unwrap();
        assert_eq!(granularity, Granularity::Monthly);
        assert_eq!(group_by, GroupBy::Service);
    }

    #[test]
    fn filters_parse_key_value_pairs() {
        let parsed = parse_filters(&["service=EC2".into(), "team=platform".into()]).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("service".to_string(), "EC2".to_string()),
                ("team".to_string(), "platform".to_string())
            ]
        );
    }

    #[test]
    fn malformed_filter_is_rejected() {
        assert!(parse_filters(&["serviceEC2".into()]).is_err());
    }

    #[test]
    fn month_argument_uses_previous_month_as_baseline() {
        let config = AppConfig::default();
        let (window, baseline) =
            resolve_windows(None, Some("2026-07"), false, &config).unwrap();
        assert_eq!(window, Window::calendar_month(2026, 7).unwrap());
        assert_eq!(baseline, Some(Window::calendar_month(2026, 6).unwrap()));
    }

    #[test]
    fn no_baseline_flag_drops_the_baseline() {
        let config = AppConfig::default();
        let (_, baseline) = resolve_windows(Some(7), None, true, &config).unwrap();
        assert!(baseline.is_none());
    }

    #[test]
    fn invalid_days_surface_as_validation_error() {
        let config = AppConfig::default();
        assert!(resolve_windows(Some(0), None, false, &config).is_err());
    }
}
