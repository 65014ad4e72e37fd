pub mod board;
pub mod calendar;
pub mod config;
pub mod delete;
pub mod edit;
pub mod list;
pub mod new;
pub mod show;
pub mod sync;
pub mod templates;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::{NaiveDate, NaiveDateTime};
use meetbook_core::api::{HttpClient, MeetingApi};
use meetbook_core::config::MeetbookConfig;
use meetbook_core::draft::{DraftCache, DraftKey};
use meetbook_core::editor::{EditorSession, MeetingRoute, SaveOutcome};
use meetbook_core::meeting::PublicId;
use meetbook_core::store::FileStore;
use meetbook_core::timestamp::{DATE_FORMAT, parse_server};
use owo_colors::OwoColorize;

use crate::utils::tui::create_spinner;

/// Everything a command needs: the API client and the draft store.
pub struct Context {
    pub api: Arc<dyn MeetingApi>,
    store: Arc<FileStore>,
}

impl Context {
    pub fn load() -> Result<Self> {
        let config = MeetbookConfig::load().context("Could not load config")?;
        let api = HttpClient::from_config(&config)?;

        let store_path = config.draft_store_path()?;
        let store = FileStore::open(&store_path)
            .with_context(|| format!("Could not open draft store {}", store_path.display()))?;

        tracing::debug!(
            api = %config.api_base_url,
            drafts = %store.path().display(),
            "meetbook context ready"
        );

        Ok(Context {
            api: Arc::new(api),
            store: Arc::new(store),
        })
    }

    pub fn drafts(&self) -> DraftCache {
        DraftCache::new(self.store.clone())
    }

    pub fn store(&self) -> Arc<FileStore> {
        self.store.clone()
    }

    /// Open an editor for `route`, loading existing meetings from the server.
    pub async fn open_session(&self, route: &MeetingRoute) -> Result<EditorSession> {
        let session = EditorSession::open(route, self.api.clone(), self.drafts());

        if let Some(id) = session.public_id() {
            let spinner = create_spinner(format!("Loading {}", id));
            let loaded = session.load().await;
            spinner.finish_and_clear();
            loaded.with_context(|| format!("Could not load meeting {}", id))?;
        }

        Ok(session)
    }

    pub fn close(self) -> Result<()> {
        // Every write already went to disk; this only catches a final flush error
        match Arc::try_unwrap(self.store) {
            Ok(store) => store.close().context("Could not close draft store"),
            Err(_) => Ok(()),
        }
    }
}

/// Classify a meeting argument, telling the user when an invalid id sends
/// them to the new-meeting flow.
pub fn resolve_route(raw: &str) -> MeetingRoute {
    let route = MeetingRoute::parse(raw);
    if let MeetingRoute::Redirect { requested } = &route {
        eprintln!(
            "{} '{}' is not a meeting id, continuing with a new meeting",
            "note:".yellow(),
            requested
        );
    }
    route
}

/// After a create the draft lives under the new id, so the new-meeting
/// entries would only resurface in the next `meetbook new`.
pub fn settle_new_draft(drafts: &DraftCache, outcome: &SaveOutcome) -> Result<()> {
    if let SaveOutcome::Created { public_id } = outcome {
        drafts
            .remove(&DraftKey::New)
            .with_context(|| format!("Could not clear the draft copied to {}", public_id))?;
    }
    Ok(())
}

/// Commands that only make sense for an existing meeting.
pub fn require_id(raw: &str) -> Result<PublicId> {
    PublicId::parse(raw.trim()).map_err(|_| {
        anyhow::anyhow!(
            "'{}' is not a meeting id.\n\n\
            Create a new meeting with:\n  \
            meetbook new \"<title>\"",
            raw
        )
    })
}

/// Parse a user supplied date/time. Accepts the server formats plus
/// minute precision ("2024-03-01T09:00" or "2024-03-01 09:00").
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    let normalized = input.trim().replacen(' ', "T", 1);
    parse_server(&normalized).map_err(|_| {
        anyhow::anyhow!(
            "Invalid date/time '{}'. Expected YYYY-MM-DD or YYYY-MM-DDTHH:MM",
            input
        )
    })
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| anyhow::anyhow!("Invalid date '{}'. Expected YYYY-MM-DD", input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_arguments() {
        assert_eq!(
            parse_datetime("2024-03-01 09:30").unwrap().to_string(),
            "2024-03-01 09:30:00"
        );
        assert_eq!(
            parse_datetime("2024-03-01").unwrap().to_string(),
            "2024-03-01 00:00:00"
        );
        assert!(parse_datetime("next tuesday").is_err());
    }

    #[test]
    fn created_meeting_clears_the_new_draft() {
        use meetbook_core::draft::MeetingMeta;
        use meetbook_core::store::MemoryStore;

        let drafts = DraftCache::new(Arc::new(MemoryStore::new()));
        let meta = MeetingMeta {
            notes: "agenda".into(),
            ..Default::default()
        };
        drafts.store(&DraftKey::New, "Planning", &meta).unwrap();

        settle_new_draft(&drafts, &SaveOutcome::Updated { version: Some(2) }).unwrap();
        assert_eq!(drafts.load(&DraftKey::New).unwrap().title, "Planning");

        let public_id = PublicId::parse("7c9e6679-7425-40de-944b-e07fc1f90ae7").unwrap();
        settle_new_draft(&drafts, &SaveOutcome::Created { public_id }).unwrap();

        let left = drafts.load(&DraftKey::New).unwrap();
        assert_eq!(left.title, "");
        assert_eq!(left.meta.notes, "");
    }

    #[test]
    fn invalid_ids_are_rejected_for_existing_only_commands() {
        assert!(require_id("3f2b8c1e-9d4a-4b7e-8c21-5a6f7e8d9c0b").is_ok());
        assert!(require_id("42").is_err());
    }
}
