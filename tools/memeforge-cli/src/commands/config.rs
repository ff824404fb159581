//! Show or write the configuration.

use memeforge_common::config::{config_file_path, AppConfig};
use memeforge_common::error::MemeResult;

pub fn run(config: &AppConfig, write: bool) -> MemeResult<()> {
    println!("# {}", config_file_path().display());
    println!("{}", serde_json::to_string_pretty(config)?);

    if write {
        let path = config.save()?;
        println!("Configuration written to {}", path.display());
    }
    Ok(())
}
