use anyhow::Result;
use meetbook_core::MeetbookError;
use meetbook_core::api::IfMatch;
use meetbook_core::draft::DraftKey;
use owo_colors::OwoColorize;

use super::{Context, require_id};
use crate::utils::tui::create_spinner;

pub async fn run(ctx: &Context, raw_id: &str, if_match: Option<i64>) -> Result<()> {
    let id = require_id(raw_id)?;
    let if_match = if_match.map(IfMatch::from);

    let spinner = create_spinner(format!("Deleting {}", id));
    let deleted = ctx.api.delete(&id, if_match.as_ref()).await;
    spinner.finish_and_clear();

    match deleted {
        Ok(()) => {}
        Err(MeetbookError::VersionConflict(_)) => anyhow::bail!(
            "Meeting {} changed on the server since version {}. Not deleted.",
            id,
            if_match.map(|m| m.header_value()).unwrap_or_default()
        ),
        Err(e) => return Err(e.into()),
    }

    ctx.drafts().remove(&DraftKey::Meeting(id.clone()))?;
    println!("{} Deleted {}", "-".red(), id);

    Ok(())
}
