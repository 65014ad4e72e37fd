//! Meeting list and calendar range queries.

use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::MeetingApi;
use crate::error::{MeetbookError, MeetbookResult};
use crate::generation::{Generation, Ticket};
use crate::meeting::{ListMeetingsResponse, MeetingListItem, PublicId};
use crate::timestamp::{DATE_FORMAT, format_date};

pub const DEFAULT_PER_PAGE: u32 = 20;

/// Inclusive calendar date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, String> {
        if from > to {
            return Err(format!("Window starts after it ends: {} > {}", from, to));
        }
        Ok(DateWindow { from, to })
    }

    /// First to last day of a month.
    pub fn month(year: i32, month: u32) -> Result<Self, String> {
        let from = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| format!("Invalid month {}-{:02}", year, month))?;
        let to = from
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| format!("Month out of range: {}-{:02}", year, month))?;
        Ok(DateWindow { from, to })
    }

    /// The month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        // year/month of a valid date always form a valid month
        Self::month(date.year(), date.month()).unwrap_or(DateWindow { from: date, to: date })
    }

    /// Parse `YYYY-MM`.
    pub fn parse_month(s: &str) -> Result<Self, String> {
        let date = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), DATE_FORMAT)
            .map_err(|_| format!("Invalid month '{}'. Expected YYYY-MM", s))?;
        Ok(Self::month_of(date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from.iter_days().take_while(move |d| *d <= self.to)
    }
}

/// What to ask the list endpoint for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListQuery {
    Page { page: u32, per_page: u32 },
    Range(DateWindow),
}

impl ListQuery {
    pub fn page(page: u32) -> Self {
        ListQuery::Page {
            page,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Query-string parameters.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            ListQuery::Page { page, per_page } => {
                vec![("page", page.to_string()), ("perPage", per_page.to_string())]
            }
            ListQuery::Range(window) => vec![
                ("from", format_date(&window.from)),
                ("to", format_date(&window.to)),
            ],
        }
    }
}

/// A meeting as the calendar shows it, addressed by its public id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMeeting {
    pub id: PublicId,
    pub title: String,
    pub all_day: bool,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub updated_at: Option<String>,
}

impl From<MeetingListItem> for CalendarMeeting {
    fn from(item: MeetingListItem) -> Self {
        CalendarMeeting {
            id: item.public_id,
            title: item.title,
            all_day: item.all_day,
            start: item.start,
            end: item.end,
            updated_at: item.updated_at,
        }
    }
}

impl CalendarMeeting {
    /// Starts on `day`, or is all-day and spans it.
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        let start = self.start.date();
        let end = self.end.date();
        start == day || (self.all_day && start <= day && day <= end)
    }
}

/// Case-insensitive title substring filter. Blank queries keep everything.
pub fn filter_by_title(meetings: Vec<CalendarMeeting>, query: &str) -> Vec<CalendarMeeting> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return meetings;
    }
    meetings
        .into_iter()
        .filter(|m| m.title.to_lowercase().contains(&q))
        .collect()
}

/// Meetings grouped by the days of `window` they occur on. Days outside the
/// window never appear, even when the server returned spill-over items.
pub fn meetings_in_window(
    meetings: &[CalendarMeeting],
    window: &DateWindow,
) -> Vec<(NaiveDate, Vec<CalendarMeeting>)> {
    window
        .days()
        .map(|day| {
            let on_day = meetings
                .iter()
                .filter(|m| m.occurs_on(day))
                .cloned()
                .collect::<Vec<_>>();
            (day, on_day)
        })
        .filter(|(_, on_day)| !on_day.is_empty())
        .collect()
}

/// Issues list requests for the visible window, dropping superseded results.
pub struct RangeQuery {
    api: Arc<dyn MeetingApi>,
    generation: Generation,
}

impl RangeQuery {
    pub fn new(api: Arc<dyn MeetingApi>) -> Self {
        RangeQuery {
            api,
            generation: Generation::new(),
        }
    }

    /// Fetch and map one window or page. `Ok(None)` means a newer fetch (or
    /// [`RangeQuery::cancel`]) superseded this one.
    pub async fn fetch(
        &self,
        query: &ListQuery,
        title_filter: Option<&str>,
    ) -> MeetbookResult<Option<Vec<CalendarMeeting>>> {
        let ticket = self.generation.begin();
        let result = self.api.list(query).await;
        self.finish(ticket, result, title_filter)
    }

    fn finish(
        &self,
        ticket: Ticket,
        result: MeetbookResult<ListMeetingsResponse>,
        title_filter: Option<&str>,
    ) -> MeetbookResult<Option<Vec<CalendarMeeting>>> {
        if !self.generation.is_current(ticket) {
            tracing::debug!("discarding superseded meeting list");
            return Ok(None);
        }

        let resp = result.inspect_err(|e: &MeetbookError| {
            tracing::warn!("meeting list failed: {}", e);
        })?;

        let meetings: Vec<CalendarMeeting> = resp.items.into_iter().map(Into::into).collect();
        let meetings = match title_filter {
            Some(q) => filter_by_title(meetings, q),
            None => meetings,
        };

        Ok(Some(meetings))
    }

    /// Drop whatever is in flight.
    pub fn cancel(&self) {
        self.generation.invalidate();
    }
}
