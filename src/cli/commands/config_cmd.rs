//! Configuration display.

use console::style;

use feedharvest::config::Config;

/// Print the configuration after file discovery and env overrides.
pub fn cmd_config_show(config: &Config, json: bool) -> anyhow::Result<()> {
    let rendered = if json {
        serde_json::to_string_pretty(config)?
    } else {
        toml::to_string_pretty(config)?
    };

    match &config.source_path {
        Some(path) => eprintln!("{} Loaded from {}", style("→").cyan(), path.display()),
        None => eprintln!("{} No config file found, showing defaults", style("!").yellow()),
    }
    println!("{}", rendered);
    Ok(())
}
