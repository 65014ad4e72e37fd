use anyhow::{Context as _, Result};
use meetbook_core::editor::MeetingRoute;
use owo_colors::OwoColorize;

use super::{Context, require_id};
use crate::render::Render;
use crate::utils::tui::create_spinner;

/// Throw away local edits and take the server's copy.
pub async fn run(ctx: &Context, raw_id: &str) -> Result<()> {
    let id = require_id(raw_id)?;
    let session = ctx.open_session(&MeetingRoute::Existing(id.clone())).await?;

    let spinner = create_spinner(format!("Syncing {}", id));
    let synced = session.resync().await;
    spinner.finish_and_clear();
    synced.with_context(|| format!("Could not sync meeting {}", id))?;

    println!("{} {}", "✓".green(), "Reloaded from server".dimmed());
    println!("{}", session.fields().render());

    Ok(())
}
