use anyhow::Result;
use meetbook_core::editor::MeetingRoute;
use owo_colors::OwoColorize;

use super::{Context, resolve_route};
use crate::render::Render;

pub async fn run(ctx: &Context, raw_id: &str) -> Result<()> {
    let route = resolve_route(raw_id);
    if !matches!(route, MeetingRoute::Existing(_)) {
        println!("{}", "Nothing to show. Create a meeting with: meetbook new \"<title>\"".dimmed());
        return Ok(());
    }

    let session = ctx.open_session(&route).await?;
    let Some(detail) = session.server_snapshot() else {
        anyhow::bail!("Meeting {} could not be loaded", raw_id);
    };

    println!("{}", detail.render());

    // Location and links only live in the local draft
    let meta = session.fields().meta;
    if !meta.location.is_empty() || !meta.links.is_empty() {
        println!();
        println!("{}", "Local".bold());
        if !meta.location.is_empty() {
            println!("  {} {}", "Where:".dimmed(), meta.location);
        }
        for link in &meta.links {
            println!("  {}  {}", "Link:".dimmed(), link);
        }
    }

    Ok(())
}
