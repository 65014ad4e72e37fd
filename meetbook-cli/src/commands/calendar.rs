use anyhow::Result;
use chrono::Local;
use meetbook_core::calendar::{MonthGrid, week_cells, week_days};
use meetbook_core::query::{DateWindow, ListQuery, RangeQuery};
use owo_colors::OwoColorize;

use super::{Context, parse_date};
use crate::render::{Render, format_date_label};
use crate::utils::tui::create_spinner;

pub async fn run(ctx: &Context, month: Option<&str>, week: Option<&str>) -> Result<()> {
    match week {
        Some(day) => run_week(ctx, day).await,
        None => run_month(ctx, month).await,
    }
}

async fn run_month(ctx: &Context, month: Option<&str>) -> Result<()> {
    let window = match month {
        Some(m) => DateWindow::parse_month(m).map_err(|e| anyhow::anyhow!(e))?,
        None => DateWindow::month_of(Local::now().date_naive()),
    };

    let query = RangeQuery::new(ctx.api.clone());
    let spinner = create_spinner(format!("Fetching {}", window.from.format("%B %Y")));
    let fetched = query.fetch(&ListQuery::Range(window), None).await;
    spinner.finish_and_clear();

    let meetings = fetched?.unwrap_or_default();
    println!("{}", MonthGrid::new(window.from, &meetings).render());

    Ok(())
}

async fn run_week(ctx: &Context, day: &str) -> Result<()> {
    let cursor = parse_date(day)?;
    let days = week_days(cursor);
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Ok(());
    };
    let window = DateWindow::new(*first, *last).map_err(|e| anyhow::anyhow!(e))?;

    let query = RangeQuery::new(ctx.api.clone());
    let spinner = create_spinner(format!("Fetching week of {}", first));
    let fetched = query.fetch(&ListQuery::Range(window), None).await;
    spinner.finish_and_clear();

    let meetings = fetched?.unwrap_or_default();

    for (i, cell) in week_cells(cursor, &meetings).iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", format_date_label(cell.date).bold());
        if cell.meetings.is_empty() {
            println!("  {}", "No meetings".dimmed());
        }
        for meeting in &cell.meetings {
            println!("  {}", meeting.render());
        }
    }

    Ok(())
}
