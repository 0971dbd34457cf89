use clap::Subcommand;
use pomotick_core::error::ConfigError;
use pomotick_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value, e.g. `timer.focus_minutes`
    Get { key: String },
    /// Change one value and save the file
    Set { key: String, value: String },
    /// Print every value as `key = value`
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the location of the config file
    Path,
    /// Overwrite the file with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {value}");
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for (key, value) in config.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("Configuration reset to defaults");
        }
    }
    Ok(())
}
