use anyhow::Result;
use meetbook_core::query::{DateWindow, ListQuery, RangeQuery, meetings_in_window};
use owo_colors::OwoColorize;

use super::Context;
use crate::render::{Render, format_date_label};
use crate::utils::tui::create_spinner;

pub async fn run(
    ctx: &Context,
    page: Option<u32>,
    month: Option<&str>,
    query: Option<&str>,
) -> Result<()> {
    let range = RangeQuery::new(ctx.api.clone());

    match month {
        Some(m) => {
            let window = DateWindow::parse_month(m).map_err(|e| anyhow::anyhow!(e))?;

            let spinner = create_spinner(format!("Fetching {}", m));
            let fetched = range.fetch(&ListQuery::Range(window), query).await;
            spinner.finish_and_clear();

            let meetings = fetched?.unwrap_or_default();
            let days = meetings_in_window(&meetings, &window);
            if days.is_empty() {
                println!("{}", "No meetings found".dimmed());
                return Ok(());
            }

            for (i, (day, on_day)) in days.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", format_date_label(*day).bold());
                for meeting in on_day {
                    println!("  {}", meeting.render());
                }
            }
        }
        None => {
            let page = page.unwrap_or(1).max(1);

            let spinner = create_spinner(format!("Fetching page {}", page));
            let fetched = range.fetch(&ListQuery::page(page), query).await;
            spinner.finish_and_clear();

            let meetings = fetched?.unwrap_or_default();
            if meetings.is_empty() {
                println!("{}", "No meetings found".dimmed());
                return Ok(());
            }

            for meeting in &meetings {
                println!(
                    "{} {}",
                    meeting.start.format("%Y-%m-%d").dimmed(),
                    meeting.render()
                );
            }
            println!();
            println!("{}", format!("Page {} (meetbook list --page {} for more)", page, page + 1).dimmed());
        }
    }

    Ok(())
}
