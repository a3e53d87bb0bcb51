//! The `sprig config` command for configuration management.

use clap::{Args, Subcommand};
use sprig_core::config::resolve_env_var;
use sprig_core::Config;
use std::path::PathBuf;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(
    args: ConfigArgs,
    config: Config,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(Config::default_path);

    match args.command {
        ConfigCommand::Show => {
            println!("{}", redacted(&config).to_toml()?);
            eprintln!(
                "# Pl@ntNet key: {}  |  fallback key: {}",
                key_state(&config.plantnet.api_key),
                key_state(&config.openai.api_key)
            );
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let toml = Config::default().to_toml()?;
            std::fs::write(&path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Copy of `config` that is safe to print: literal API keys are masked,
/// `${ENV_VAR}` references are shown as written.
fn redacted(config: &Config) -> Config {
    let mut shown = config.clone();
    shown.plantnet.api_key = mask_key(&config.plantnet.api_key);
    shown.openai.api_key = mask_key(&config.openai.api_key);
    shown
}

fn mask_key(value: &str) -> String {
    let is_reference = value.starts_with("${") && value.ends_with('}');
    if is_reference || value.is_empty() {
        value.to_string()
    } else {
        "********".to_string()
    }
}

fn key_state(value: &str) -> &'static str {
    if resolve_env_var(value).is_some() {
        "set"
    } else {
        "missing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let args = ConfigArgs {
            command: ConfigCommand::Init { force: false },
        };
        execute(args, Config::default(), Some(path.clone()))
            .await
            .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.boost.threshold, 0.8);
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let args = ConfigArgs {
            command: ConfigCommand::Init { force: false },
        };
        let err = execute(args, Config::default(), Some(path.clone()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let args = ConfigArgs {
            command: ConfigCommand::Init { force: true },
        };
        execute(args, Config::default(), Some(path.clone()))
            .await
            .unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[boost]"));
    }

    #[test]
    fn test_key_state() {
        assert_eq!(key_state("literal"), "set");
        assert_eq!(key_state("${DEFINITELY_NOT_SET_SPRIG_KEY}"), "missing");
    }

    #[test]
    fn test_show_masks_literal_keys() {
        let mut config = Config::default();
        config.plantnet.api_key = "2b10secretplantnetkey".to_string();

        let shown = redacted(&config).to_toml().unwrap();
        assert!(!shown.contains("2b10secretplantnetkey"));
        assert!(shown.contains("********"));
        // Env references reveal nothing and stay readable
        assert!(shown.contains("${OPENAI_API_KEY}"));
        assert_eq!(config.plantnet.api_key, "2b10secretplantnetkey");
    }
}
