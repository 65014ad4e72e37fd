//! Editor session: local edit state reconciled with the server.
//!
//! Saves use optimistic concurrency. An update carries the `meetingVersion`
//! last seen from the server; a 409 is never retried. Instead the session
//! refetches the meeting, overwrites every field from it and bumps
//! [`EditorSession::reset_counter`] so views re-initialise. The edit that
//! conflicted is dropped (last writer wins, manual reload).
//!
//! Every save attempt first writes the edited title/notes/meta to the draft
//! cache, so nothing typed is lost to a failing network.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! await. Fetch results are applied only if their [`Ticket`] is still
//! current; [`EditorSession::close`] invalidates everything in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Local, NaiveDateTime, Timelike};

use crate::api::MeetingApi;
use crate::draft::{DraftCache, DraftKey, MeetingMeta};
use crate::error::{MeetbookError, MeetbookResult};
use crate::generation::{Generation, Ticket};
use crate::meeting::{CreateMeetingRequest, MeetingDetail, PublicId, UpdateMeetingRequest};

/// Title sent when the editor's title is blank.
pub const UNTITLED: &str = "Untitled";

/// Where a meeting route points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingRoute {
    Existing(PublicId),
    New,
    /// Not a meeting id; callers should continue in the new-meeting flow.
    Redirect { requested: String },
}

impl MeetingRoute {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "new" {
            return MeetingRoute::New;
        }

        match PublicId::parse(raw) {
            Ok(id) => MeetingRoute::Existing(id),
            Err(_) => MeetingRoute::Redirect {
                requested: raw.to_string(),
            },
        }
    }

    pub fn draft_key(&self) -> DraftKey {
        match self {
            MeetingRoute::Existing(id) => DraftKey::Meeting(id.clone()),
            _ => DraftKey::New,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Loading,
    Clean,
    Editing,
    Saving,
    ConflictDetected,
    Error,
}

/// Everything the editor lets the user change.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorFields {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
    /// Team names, display only.
    pub team: Option<String>,
    pub meta: MeetingMeta,
}

impl EditorFields {
    fn blank(now: NaiveDateTime) -> Self {
        EditorFields {
            title: String::new(),
            start: now,
            end: now + Duration::hours(1),
            all_day: false,
            team: None,
            meta: MeetingMeta::default(),
        }
    }

    fn from_server(detail: &MeetingDetail, meta: MeetingMeta, fallback_title: &str) -> Self {
        let title = if detail.title.is_empty() {
            fallback_title.to_string()
        } else {
            detail.title.clone()
        };

        EditorFields {
            title,
            start: detail.start,
            end: detail.end,
            all_day: detail.all_day,
            team: detail.teams_display(),
            meta,
        }
    }

    pub fn title_or_default(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Updated { version: Option<i64> },
    Created { public_id: PublicId },
    /// The server had a newer version; fields now hold the server's copy.
    ConflictReloaded { version: Option<i64> },
    /// A create from this session is still outstanding; nothing was sent.
    Skipped,
}

struct Inner {
    key: DraftKey,
    state: EditorState,
    fields: EditorFields,
    server: Option<MeetingDetail>,
    reset_counter: u64,
    last_error: Option<String>,
}

impl Inner {
    /// Id and version to PATCH with, if this session may update.
    fn patch_target(&self) -> Option<(PublicId, Option<i64>)> {
        let id = self.key.public_id()?;
        let server = self.server.as_ref()?;
        if &server.public_id == id {
            Some((id.clone(), server.meeting_version))
        } else {
            None
        }
    }
}

/// Clears the create flag however the create ends.
struct CreateGuard<'a>(&'a AtomicBool);

impl<'a> CreateGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| CreateGuard(flag))
    }
}

impl Drop for CreateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct EditorSession {
    api: Arc<dyn MeetingApi>,
    cache: DraftCache,
    inner: Mutex<Inner>,
    creating: AtomicBool,
    generation: Generation,
}

impl EditorSession {
    /// Open an editor for `route`, seeded from the draft cache.
    ///
    /// Redirect routes open a new-meeting session. Existing meetings start in
    /// [`EditorState::Loading`] until [`EditorSession::load`] resolves.
    pub fn open(route: &MeetingRoute, api: Arc<dyn MeetingApi>, cache: DraftCache) -> Self {
        let now = Local::now().naive_local();
        Self::open_at(route, api, cache, now.with_nanosecond(0).unwrap_or(now))
    }

    pub fn open_at(
        route: &MeetingRoute,
        api: Arc<dyn MeetingApi>,
        cache: DraftCache,
        now: NaiveDateTime,
    ) -> Self {
        if let MeetingRoute::Redirect { requested } = route {
            tracing::info!("'{}' is not a meeting id, opening a new meeting", requested);
        }

        let key = route.draft_key();
        let mut fields = EditorFields::blank(now);

        match cache.load(&key) {
            Ok(draft) => {
                fields.title = draft.title;
                fields.meta = draft.meta;
            }
            Err(e) => tracing::warn!(%key, "could not read cached draft: {}", e),
        }

        let state = match key {
            DraftKey::New => EditorState::Editing,
            DraftKey::Meeting(_) => EditorState::Loading,
        };

        EditorSession {
            api,
            cache,
            inner: Mutex::new(Inner {
                key,
                state,
                fields,
                server: None,
                reset_counter: 0,
                last_error: None,
            }),
            creating: AtomicBool::new(false),
            generation: Generation::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ACCESSORS:

    pub fn state(&self) -> EditorState {
        self.lock().state
    }

    pub fn fields(&self) -> EditorFields {
        self.lock().fields.clone()
    }

    pub fn key(&self) -> DraftKey {
        self.lock().key.clone()
    }

    pub fn public_id(&self) -> Option<PublicId> {
        self.lock().key.public_id().cloned()
    }

    pub fn server_snapshot(&self) -> Option<MeetingDetail> {
        self.lock().server.clone()
    }

    /// Version token the next update will carry.
    pub fn meeting_version(&self) -> Option<i64> {
        self.lock().server.as_ref().and_then(|s| s.meeting_version)
    }

    /// Bumped every time fields are overwritten from the server.
    pub fn reset_counter(&self) -> u64 {
        self.lock().reset_counter
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn is_patchable(&self) -> bool {
        self.lock().patch_target().is_some()
    }

    /// Boards can only be stored for meetings the server knows.
    pub fn can_persist_boards(&self) -> bool {
        self.lock().server.is_some()
    }

    // EDITING:

    pub fn edit(&self, f: impl FnOnce(&mut EditorFields)) {
        let mut inner = self.lock();
        f(&mut inner.fields);
        inner.state = EditorState::Editing;
    }

    /// Discard results of fetches still in flight.
    pub fn close(&self) {
        self.generation.invalidate();
    }

    // SERVER ROUND TRIPS:

    /// Fetch the meeting and merge it into the editor.
    ///
    /// The server wins for everything it stores; location and links only
    /// exist locally and keep their cached values. No-op for new meetings.
    pub async fn load(&self) -> MeetbookResult<()> {
        let Some(id) = self.public_id() else {
            return Ok(());
        };

        let ticket = self.generation.begin();
        self.lock().state = EditorState::Loading;

        let result = self.api.detail(&id).await;

        let mut inner = self.lock();
        if !self.generation.is_current(ticket) {
            tracing::debug!(%id, "discarding superseded meeting load");
            return Ok(());
        }

        match result {
            Ok(detail) => {
                let mut meta = MeetingMeta::from_server(&detail);
                meta.location = std::mem::take(&mut inner.fields.meta.location);
                meta.links = std::mem::take(&mut inner.fields.meta.links);

                if let Err(e) = self.cache.store_snapshot(&inner.key, &detail, &meta) {
                    tracing::warn!(%id, "could not cache meeting snapshot: {}", e);
                }

                inner.fields = EditorFields::from_server(&detail, meta, &inner.fields.title);
                inner.server = Some(detail);
                inner.state = EditorState::Clean;
                inner.last_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%id, "meeting load failed: {}", e);
                inner.server = None;
                inner.state = EditorState::Error;
                inner.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Refetch unconditionally and reset every field from the server.
    /// No-op for meetings that were never saved.
    pub async fn resync(&self) -> MeetbookResult<()> {
        let Some(id) = self.public_id() else {
            tracing::debug!("resync requested for an unsaved meeting");
            return Ok(());
        };

        self.reload_from_server(&id, EditorState::Clean).await?;
        Ok(())
    }

    /// Save the current fields: update when patchable, create otherwise.
    ///
    /// The fields are backed up to the draft cache before the request goes
    /// out. A version conflict then resets both the fields and that backup to
    /// the server's copy, so the rejected edit cannot be recovered from the
    /// cache. Callers that want to keep it must read [`EditorSession::fields`]
    /// before saving.
    pub async fn save(&self) -> MeetbookResult<SaveOutcome> {
        let (key, fields, target) = {
            let inner = self.lock();
            (inner.key.clone(), inner.fields.clone(), inner.patch_target())
        };

        // Backup regardless of what the server says
        if let Err(e) = self.cache.store(&key, &fields.title, &fields.meta) {
            tracing::warn!(%key, "could not back up draft: {}", e);
        }

        match target {
            Some((id, version)) => self.save_update(id, version, fields).await,
            None => self.save_create(key, fields).await,
        }
    }

    async fn save_update(
        &self,
        id: PublicId,
        version: Option<i64>,
        fields: EditorFields,
    ) -> MeetbookResult<SaveOutcome> {
        self.lock().state = EditorState::Saving;

        let req = UpdateMeetingRequest {
            title: Some(fields.title_or_default().to_string()),
            all_day: Some(fields.all_day),
            start: Some(fields.start),
            end: Some(fields.end),
            meeting_version: version,
            content: Some(fields.meta.notes.clone()),
            ..Default::default()
        };

        match self.api.update(&id, &req).await {
            Ok(resp) => {
                let version = match resp.meeting_version {
                    Some(v) => Some(v),
                    None => self.fetch_version(&id).await,
                };

                let mut inner = self.lock();
                if let Some(server) = inner.server.as_mut() {
                    server.title = fields.title_or_default().to_string();
                    server.all_day = fields.all_day;
                    server.start = fields.start;
                    server.end = fields.end;
                    server.note_content = Some(fields.meta.notes.clone());
                    server.meeting_version = version.or(server.meeting_version);
                    server.note_version = resp.note_version.or(server.note_version);
                }
                inner.last_error = None;
                inner.state = if inner.fields == fields {
                    EditorState::Clean
                } else {
                    EditorState::Editing
                };

                tracing::debug!(%id, ?version, "meeting updated");
                Ok(SaveOutcome::Updated { version })
            }
            Err(MeetbookError::VersionConflict(msg)) => {
                tracing::info!(%id, ?version, "version conflict ({}), reloading from server", msg);
                self.lock().state = EditorState::ConflictDetected;

                let version = self
                    .reload_from_server(&id, EditorState::ConflictDetected)
                    .await?;
                Ok(SaveOutcome::ConflictReloaded { version })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn save_create(&self, key: DraftKey, fields: EditorFields) -> MeetbookResult<SaveOutcome> {
        let Some(_guard) = CreateGuard::acquire(&self.creating) else {
            tracing::debug!("create already in flight, ignoring save");
            return Ok(SaveOutcome::Skipped);
        };

        self.lock().state = EditorState::Saving;

        let req = CreateMeetingRequest {
            title: fields.title_or_default().to_string(),
            all_day: fields.all_day,
            start: fields.start,
            end: fields.end,
            project_id: None,
            participant_account_ids: None,
            team_ids: None,
        };

        let created = match self.api.create(&req).await {
            Ok(created) => created,
            Err(e) => return Err(self.fail(e)),
        };

        let public_id = created.public_id;
        let new_key = DraftKey::Meeting(public_id.clone());
        tracing::info!(%public_id, "meeting created");

        if let Err(e) = self.cache.copy(&key, &new_key) {
            tracing::warn!(%public_id, "could not copy draft to new meeting: {}", e);
        }

        {
            let mut inner = self.lock();
            inner.key = new_key;
            inner.server = None;
            inner.state = EditorState::Loading;
            inner.last_error = None;
        }

        // Same as navigating to the new meeting
        if let Err(e) = self.load().await {
            tracing::warn!(%public_id, "created meeting could not be loaded: {}", e);
        }

        Ok(SaveOutcome::Created { public_id })
    }

    /// Overwrite every field from a fresh fetch. Returns the server version,
    /// or `None` if the fetch was superseded.
    async fn reload_from_server(
        &self,
        id: &PublicId,
        settle: EditorState,
    ) -> MeetbookResult<Option<i64>> {
        let ticket = self.generation.begin();

        let detail = match self.api.detail(id).await {
            Ok(detail) => detail,
            Err(e) if self.generation.is_current(ticket) => return Err(self.fail(e)),
            Err(_) => return Ok(None),
        };

        self.apply_reset(ticket, detail, settle)
    }

    fn apply_reset(
        &self,
        ticket: Ticket,
        detail: MeetingDetail,
        settle: EditorState,
    ) -> MeetbookResult<Option<i64>> {
        let mut inner = self.lock();
        if !self.generation.is_current(ticket) {
            tracing::debug!(id = %detail.public_id, "discarding superseded reload");
            return Ok(None);
        }

        let meta = MeetingMeta::from_server(&detail);
        if let Err(e) = self.cache.store_snapshot(&inner.key, &detail, &meta) {
            tracing::warn!(id = %detail.public_id, "could not cache meeting snapshot: {}", e);
        }

        let version = detail.meeting_version;
        inner.fields = EditorFields::from_server(&detail, meta, &inner.fields.title);
        inner.server = Some(detail);
        inner.reset_counter += 1;
        inner.state = settle;
        inner.last_error = None;

        Ok(version)
    }

    /// Best-effort lookup of the current version after an update whose
    /// response carried none.
    async fn fetch_version(&self, id: &PublicId) -> Option<i64> {
        match self.api.detail(id).await {
            Ok(detail) => detail.meeting_version,
            Err(e) => {
                tracing::warn!(%id, "could not refresh version after update: {}", e);
                None
            }
        }
    }

    fn fail(&self, e: MeetbookError) -> MeetbookError {
        tracing::warn!("save failed: {}", e);
        let mut inner = self.lock();
        inner.state = EditorState::Error;
        inner.last_error = Some(e.to_string());
        e
    }
}
