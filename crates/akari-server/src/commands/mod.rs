//! CLI command implementations.

use akari_core::config::AkariConfig;
use akari_core::{Points, TierBands};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub mod serve;

const CONFIG_FILE_NAME: &str = "akari.json";

/// Load config from file or return the validated default.
pub fn load_config(path: Option<PathBuf>) -> Result<AkariConfig> {
    let path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    if path.exists() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AkariConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    } else {
        Ok(AkariConfig::from_env()?)
    }
}

pub fn run_init(output: &Path, force: bool) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("creating {}", output.display()))?;
    let path = output.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let config = AkariConfig::default();
    let json = serde_json::to_string_pretty(&config)?;
    std::fs::write(&path, json)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn run_tier(config: &AkariConfig, points: u64) -> Result<()> {
    let bands = TierBands::new(config.ledger.tier_thresholds.clone())?;
    let tier = bands.tier_for(Points(points));
    println!(
        "{} points -> tier {} of {}",
        Points(points),
        tier.0,
        bands.tier_count() - 1
    );
    Ok(())
}
