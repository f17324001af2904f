//! Configuration commands.

use clap::Subcommand;

use clarion_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Update configuration values
    Set {
        /// Minutes between reconciliation passes
        #[arg(long)]
        reconcile_interval_min: Option<u64>,
        /// Stay-awake ceiling during trigger handling, in seconds
        #[arg(long)]
        stay_awake_timeout_secs: Option<u64>,
        /// Default announcement language code for new alarms
        #[arg(long)]
        language: Option<String>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Set {
            reconcile_interval_min,
            stay_awake_timeout_secs,
            language,
        } => {
            let mut config = Config::load()?;
            if let Some(minutes) = reconcile_interval_min {
                config.reconcile_interval_min = minutes;
            }
            if let Some(secs) = stay_awake_timeout_secs {
                config.stay_awake_timeout_secs = secs;
            }
            if let Some(language) = language {
                config.announcer.language_code = language;
            }
            config.save()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
