use anyhow::{Context as _, Result};
use meetbook_core::editor::{EditorFields, SaveOutcome};
use owo_colors::OwoColorize;

use super::{Context, parse_datetime, resolve_route, settle_new_draft};
use crate::render::Render;
use crate::utils::tui::create_spinner;

/// Field changes requested on the command line.
pub struct Changes {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub all_day: Option<bool>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub links: Vec<String>,
}

impl Changes {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.all_day.is_none()
            && self.location.is_none()
            && self.notes.is_none()
            && self.links.is_empty()
    }

    fn apply(self, fields: &mut EditorFields) -> Result<()> {
        if let Some(title) = self.title {
            fields.title = title;
        }
        if let Some(start) = self.start {
            let start = parse_datetime(&start)?;
            // Keep the duration when only the start moves
            let duration = fields.end - fields.start;
            fields.start = start;
            fields.end = start + duration;
        }
        if let Some(end) = self.end {
            fields.end = parse_datetime(&end)?;
        }
        if let Some(all_day) = self.all_day {
            fields.all_day = all_day;
        }
        if let Some(location) = self.location {
            fields.meta.location = location;
        }
        if let Some(notes) = self.notes {
            fields.meta.notes = notes;
        }
        fields.meta.links.extend(self.links);

        if fields.end < fields.start {
            anyhow::bail!("End is before start");
        }
        Ok(())
    }
}

pub async fn run(ctx: &Context, raw_id: &str, changes: Changes) -> Result<()> {
    let route = resolve_route(raw_id);
    let session = ctx.open_session(&route).await?;

    if changes.is_empty() {
        println!("{}", session.fields().render());
        println!();
        println!("{}", "Nothing to change. See meetbook edit --help".dimmed());
        return Ok(());
    }

    let mut fields = session.fields();
    changes.apply(&mut fields)?;
    session.edit(|f| *f = fields);

    let spinner = create_spinner("Saving");
    let saved = session.save().await;
    spinner.finish_and_clear();

    let outcome = saved.context("Could not save meeting (your edit is kept in the local draft)")?;
    println!("{}", outcome.render());
    settle_new_draft(&ctx.drafts(), &outcome)?;

    if let SaveOutcome::ConflictReloaded { .. } = outcome {
        println!();
        println!("{}", session.fields().render());
        anyhow::bail!("Edit not applied. Run the command again to edit the latest version");
    }

    Ok(())
}
