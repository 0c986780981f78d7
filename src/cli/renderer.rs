use colored::{control, Colorize};
use rust_decimal::Decimal;

use crate::core::cache::CacheStats;
use crate::core::models::signal::{Severity, Signal};
use crate::core::models::trend::{TrendDirection, TrendResult};
use crate::core::pipeline::{Comparison, Overview};

/// Format a decimal dollar amount as "$1,234.56" (two places, grouped).
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), format!("{:0<2}", f)),
        None => (text, "00".to_string()),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

/// Arrow plus percentage, e.g. "↗ +12.3%", "↘ -8.1%", "→ 0.0%", "↗ new".
pub fn format_trend(trend: &TrendResult) -> String {
    let arrow = match trend.direction {
        TrendDirection::Up => "↗",
        TrendDirection::Down => "↘",
        TrendDirection::Stable => "→",
    };
    if trend.is_new {
        format!("{} new", arrow)
    } else {
        format!("{} {:+.1}%", arrow, trend.percentage_change)
    }
}

fn colorize_trend(trend: &TrendResult) -> String {
    let text = format_trend(trend);
    match trend.direction {
        TrendDirection::Up => text.red().to_string(),
        TrendDirection::Down => text.green().to_string(),
        TrendDirection::Stable => text.dimmed().to_string(),
    }
}

fn severity_tag(severity: Severity) -> String {
    let tag = format!("[{}]", severity.as_str().to_uppercase());
    match severity {
        Severity::High => tag.red().bold().to_string(),
        Severity::Warn => tag.yellow().to_string(),
        Severity::Info => tag.cyan().to_string(),
    }
}

pub fn render_overview(overview: &Overview, top_services: usize, use_color: bool) -> String {
    control::set_override(use_color);
    let mut lines: Vec<String> = Vec::new();

    let summary = &overview.summary;
    lines.push(
        format!(" Cost overview: {}", summary.window.label())
            .bold()
            .to_string(),
    );
    lines.push(format!(
        "  {}        {}",
        "Total".cyan(),
        format_money(summary.total_cost)
    ));
    lines.push(format!(
        "  {}    {}",
        "Daily avg".cyan(),
        format_money(summary.daily_average)
    ));
    if let Some(trend) = &overview.trend {
        lines.push(format!(
            "  {}        {} ({}) vs previous period",
            "Trend".cyan(),
            colorize_trend(&trend.total),
            format_money(trend.total.absolute_change)
        ));
    }
    if overview.from_cache {
        lines.push(format!("  {}", "(served from cache)".dimmed()));
    }

    if !summary.services.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "  {:<30} {:>12} {:>8}   {}",
            "Service".bold(),
            "Cost".bold(),
            "Share".bold(),
            "Trend".bold()
        ));
        for service in summary.services.iter().take(top_services) {
            let trend_cell = overview
                .trend
                .as_ref()
                .and_then(|t| t.by_service.get(&service.service))
                .map(colorize_trend)
                .unwrap_or_default();
            lines.push(format!(
                "  {:<30} {:>12} {:>7.1}%   {}",
                service.service,
                format_money(service.total_cost),
                service.percentage_of_total,
                trend_cell
            ));
        }
        let hidden = summary.services.len().saturating_sub(top_services);
        if hidden > 0 {
            lines.push(format!("  {}", format!("(+{} more services)", hidden).dimmed()));
        }
    }

    lines.join("\n")
}

pub fn render_signals(signals: &[Signal], use_color: bool) -> String {
    control::set_override(use_color);
    let mut lines: Vec<String> = Vec::new();
    lines.push(" Signals".bold().to_string());

    if signals.is_empty() {
        lines.push(format!("  {}", "No notable signals for this period".dimmed()));
        return lines.join("\n");
    }

    for signal in signals {
        lines.push(format!("  {} {}", severity_tag(signal.severity), signal.title));
        lines.push(format!("         {}", signal.action.dimmed()));
    }
    lines.join("\n")
}

pub fn render_cache_stats(stats: &CacheStats, use_color: bool) -> String {
    control::set_override(use_color);
    let mut lines: Vec<String> = Vec::new();
    lines.push(" Cache".bold().to_string());
    lines.push(format!("  {}      {}", "Entries".cyan(), stats.entries));
    lines.push(format!("  {}         {}", "Hits".cyan(), stats.hits));
    lines.push(format!("  {}       {}", "Misses".cyan(), stats.misses));
    lines.push(format!(
        "  {}     {:.1}%",
        "Hit rate".cyan(),
        stats.hit_rate * 100.0
    ));
    // An estimate of avoided API-call charges, not an invoice figure.
    lines.push(format!(
        "  {}   ~{}",
        "Est. saved".cyan(),
        format_money(Decimal::try_from(stats.estimated_savings).unwrap_or(Decimal::ZERO))
    ));
    lines.join("\n")
}

pub fn render_comparison(comparison: &Comparison, use_color: bool) -> String {
    control::set_override(use_color);
    let mut lines: Vec<String> = Vec::new();

    lines.push(
        format!(
            " Comparing {} vs {}",
            comparison.current.window.label(),
            comparison.baseline.window.label()
        )
        .bold()
        .to_string(),
    );
    lines.push(format!(
        "  {}     {}",
        "Current".cyan(),
        format_money(comparison.current.total_cost)
    ));
    lines.push(format!(
        "  {}    {}",
        "Baseline".cyan(),
        format_money(comparison.baseline.total_cost)
    ));
    lines.push(format!(
        "  {}       {} ({})",
        "Delta".cyan(),
        colorize_trend(&comparison.trend.total),
        format_money(comparison.trend.total.absolute_change)
    ));

    if !comparison.deltas.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "  {:<30} {:>12} {:>12} {:>12}",
            "Service".bold(),
            "Current".bold(),
            "Baseline".bold(),
            "Delta".bold()
        ));
        for delta in &comparison.deltas {
            lines.push(format!(
                "  {:<30} {:>12} {:>12} {:>12}",
                delta.service,
                format_money(delta.current_cost),
                format_money(delta.baseline_cost),
                format_money(delta.delta)
            ));
        }
    }

    lines.join("\n")
}
