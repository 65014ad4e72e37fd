use anyhow::Result;
use meetbook_core::config::MeetbookConfig;
use owo_colors::OwoColorize;

pub fn run(set_api_url: Option<String>) -> Result<()> {
    let config_path = MeetbookConfig::config_path()?;
    let mut config = MeetbookConfig::load()?;

    if let Some(url) = set_api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
        config.save()?;
        println!("{} API URL saved to {}", "✓".green(), config_path.display());
        println!();
    }

    println!("{}", "Paths".bold());
    println!("  Config:  {}", config_path.display());
    println!("  Drafts:  {}", config.draft_store_path()?.display());

    println!();
    println!("{}", "Server".bold());
    println!("  API:     {}", config.api_base_url);
    println!(
        "  Auth:    {}",
        if config.auth_token.is_some() { "bearer token" } else { "none" }
    );
    match config.request_timeout_secs {
        Some(secs) => println!("  Timeout: {}s", secs),
        None => println!("  Timeout: {}", "transport default".dimmed()),
    }

    Ok(())
}
