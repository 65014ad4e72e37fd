use anyhow::{Context as _, Result};
use chrono::Duration;
use dialoguer::Input;
use meetbook_core::editor::{MeetingRoute, SaveOutcome};
use owo_colors::OwoColorize;

use super::{Context, parse_datetime, settle_new_draft};
use crate::render::Render;
use crate::utils::tui::create_spinner;

pub struct NewArgs {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub all_day: bool,
    pub location: Option<String>,
    pub notes: Option<String>,
}

pub async fn run(ctx: &Context, args: NewArgs) -> Result<()> {
    let title = match args.title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("  Title")
            .allow_empty(true)
            .interact_text()?,
    };

    let start = args.start.as_deref().map(parse_datetime).transpose()?;
    let end = args.end.as_deref().map(parse_datetime).transpose()?;

    let session = ctx.open_session(&MeetingRoute::New).await?;
    if !session.fields().meta.notes.is_empty() && args.notes.is_none() {
        println!("{}", "Restored notes from an unsaved draft".dimmed());
    }

    session.edit(|f| {
        f.title = title;
        f.all_day = args.all_day;
        if let Some(start) = start {
            f.start = start;
            f.end = start + Duration::hours(1);
        }
        if let Some(end) = end {
            f.end = end;
        }
        if let Some(location) = args.location {
            f.meta.location = location;
        }
        if let Some(notes) = args.notes {
            f.meta.notes = notes;
        }
    });

    let fields = session.fields();
    if fields.end < fields.start {
        anyhow::bail!(
            "End ({}) is before start ({})",
            fields.end.format("%Y-%m-%d %H:%M"),
            fields.start.format("%Y-%m-%d %H:%M")
        );
    }

    let spinner = create_spinner(format!("Creating {}", fields.title_or_default()));
    let saved = session.save().await;
    spinner.finish_and_clear();

    let outcome = saved.context("Could not create meeting (draft kept for next time)")?;
    println!("{}", outcome.render());

    settle_new_draft(&ctx.drafts(), &outcome)?;
    if let SaveOutcome::Created { .. } = outcome {
        println!();
        println!("{}", session.fields().render());
    }

    Ok(())
}
