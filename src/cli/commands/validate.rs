//! Profile address check.

use anyhow::bail;
use console::style;

use feedharvest::address::profile_handle;
use feedharvest::config::Config;

pub fn cmd_validate(config: &Config, url: &str) -> anyhow::Result<()> {
    let Some(handle) = profile_handle(url, config.browser.allowed_hosts.as_slice()) else {
        bail!(
            "Not a profile page: {}. Expected https://<host>/<handle> with host one of: {}",
            url,
            config.browser.allowed_hosts.join(", ")
        );
    };
    println!("{} Profile page for @{}", style("✓").green(), handle);
    Ok(())
}
