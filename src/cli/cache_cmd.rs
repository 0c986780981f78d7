use anyhow::Result;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::config::AppConfig;
use crate::core::pipeline::Pipeline;

pub fn stats(opts: &OutputOptions) -> Result<()> {
    let pipeline = Pipeline::maintenance(AppConfig::load()?);
    let stats = pipeline.cache_stats();
    match opts.format {
        OutputFormat::Json => opts.print_json(&stats)?,
        OutputFormat::Text => println!("{}", renderer::render_cache_stats(&stats, opts.use_color)),
    }
    Ok(())
}

pub fn clear(opts: &OutputOptions) -> Result<()> {
    let mut pipeline = Pipeline::maintenance(AppConfig::load()?);
    let removed = pipeline.cache_stats().entries;
    pipeline.clear_cache();
    pipeline.flush()?;
    opts.diag("cache cleared and saved");
    println!(
        "Cleared {} cache entr{}",
        removed,
        if removed == 1 { "y" } else { "ies" }
    );
    Ok(())
}
