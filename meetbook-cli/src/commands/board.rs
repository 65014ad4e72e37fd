use std::io::Read;

use anyhow::{Context as _, Result};
use meetbook_core::board::BoardCache;
use meetbook_core::editor::MeetingRoute;
use owo_colors::OwoColorize;

use super::{Context, require_id};
use crate::utils::tui::create_spinner;

pub async fn get(ctx: &Context, raw_id: &str) -> Result<()> {
    let id = require_id(raw_id)?;
    let boards = BoardCache::new(ctx.api.clone(), ctx.store());

    let spinner = create_spinner(format!("Fetching board for {}", id));
    let board = boards.load(&id).await;
    spinner.finish_and_clear();

    match board? {
        Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        None => println!("{}", "No board yet".dimmed()),
    }

    Ok(())
}

/// Store a snapshot read from `source`, a file path or "-" for stdin.
pub async fn put(ctx: &Context, raw_id: &str, source: &str) -> Result<()> {
    let id = require_id(raw_id)?;

    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Could not read {}", source))?
    };
    let snapshot: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", source))?;

    let session = ctx.open_session(&MeetingRoute::Existing(id.clone())).await?;
    if !session.can_persist_boards() {
        anyhow::bail!("Meeting {} is not on the server yet", id);
    }

    let boards = BoardCache::new(ctx.api.clone(), ctx.store());
    let spinner = create_spinner(format!("Saving board for {}", id));
    let saved = boards.save(&id, &snapshot).await;
    spinner.finish_and_clear();
    saved?;

    println!("{} Board saved", "✓".green());
    Ok(())
}
