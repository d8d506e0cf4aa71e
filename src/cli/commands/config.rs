use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

const MASKED_KEY: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a config file with default values")]
    Init {
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration (file plus environment)")]
    Show,
    #[command(about = "Show configuration file path")]
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { force } => handle_init(force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path => handle_path(),
    }
}

fn handle_init(force: bool, formatter: &dyn Formatter) -> Result<()> {
    let config_path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let path = Config::default()
        .save()
        .context("failed to create config")?;
    println!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

/// Copy of `config` safe to print.
fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    if config.gemini.api_key.is_some() {
        config.gemini.api_key = Some(MASKED_KEY.to_string());
    }
    config
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let config = masked(&Config::load()?);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(path) = Config::config_path()
        && path.exists()
    {
        println!("# Config file: {}", path.display());
        println!();
    }
    print!("{}", toml::to_string_pretty(&config)?);
    if config.gemini.api_key.is_none() {
        println!();
        println!("# api_key not set (GOOGLE_API_KEY)");
    }
    Ok(())
}

fn handle_path() -> Result<()> {
    let path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    let state = if path.exists() { "active" } else { "would be" };
    println!("Config file ({state}): {}", path.display());

    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        let state = if env_path.exists() { "active" } else { "would be" };
        println!(".env file ({state}): {}", env_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_api_key() {
        let mut config = Config::default();
        config.gemini.api_key = Some("secret".to_string());
        let shown = masked(&config);
        assert_eq!(shown.gemini.api_key.as_deref(), Some(MASKED_KEY));

        let unset = masked(&Config::default());
        assert!(unset.gemini.api_key.is_none());
    }
}
