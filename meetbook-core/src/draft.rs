//! Draft cache: title, notes and meta of a meeting kept in the local store.
//!
//! Layout (plain strings, no schema versioning, no expiry):
//!
//! - `meeting:title:{key}`
//! - `meeting:notes:{key}`
//! - `meeting:meta:{key}`: JSON `{location, participants, links, notes}`
//! - `meeting:board:{key}`: board snapshot and its entity tag
//!
//! `{key}` is the meeting's public id, or `new` for an unsaved meeting.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MeetbookError, MeetbookResult};
use crate::meeting::{MeetingDetail, PublicId};
use crate::store::KeyValueStore;

pub const KEY_PREFIX: &str = "meeting:";

/// Which meeting a draft belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DraftKey {
    New,
    Meeting(PublicId),
}

impl DraftKey {
    pub fn public_id(&self) -> Option<&PublicId> {
        match self {
            DraftKey::New => None,
            DraftKey::Meeting(id) => Some(id),
        }
    }

    pub fn title_key(&self) -> String {
        format!("{KEY_PREFIX}title:{self}")
    }

    pub fn notes_key(&self) -> String {
        format!("{KEY_PREFIX}notes:{self}")
    }

    pub fn meta_key(&self) -> String {
        format!("{KEY_PREFIX}meta:{self}")
    }

    pub fn board_key(&self) -> String {
        format!("{KEY_PREFIX}board:{self}")
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DraftKey::New => f.write_str("new"),
            DraftKey::Meeting(id) => write!(f, "{}", id),
        }
    }
}

/// Editor side-panel data. `participants` is a display string, not a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingMeta {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub participants: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl MeetingMeta {
    /// Meta as derived from a server snapshot. Location and links are not
    /// stored server-side and come back empty.
    pub fn from_server(detail: &MeetingDetail) -> Self {
        MeetingMeta {
            location: String::new(),
            participants: detail.participants_display(),
            links: Vec::new(),
            notes: detail.note_content.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub meta: MeetingMeta,
}

/// Typed view over the injected key-value store.
#[derive(Clone)]
pub struct DraftCache {
    store: Arc<dyn KeyValueStore>,
}

impl DraftCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        DraftCache { store }
    }

    /// Load the cached draft, falling back to empty values.
    ///
    /// The standalone notes entry wins over the notes inside meta when it is
    /// non-empty; a corrupt meta entry is ignored.
    pub fn load(&self, key: &DraftKey) -> MeetbookResult<Draft> {
        let mut meta = match self.store.get(&key.meta_key())? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(%key, "ignoring unreadable cached meta: {}", e);
                MeetingMeta::default()
            }),
            None => MeetingMeta::default(),
        };

        if let Some(notes) = self.store.get(&key.notes_key())?.filter(|n| !n.is_empty()) {
            meta.notes = notes;
        }

        let title = self.store.get(&key.title_key())?.unwrap_or_default();

        Ok(Draft { title, meta })
    }

    /// Write title, notes and meta under `key`.
    pub fn store(&self, key: &DraftKey, title: &str, meta: &MeetingMeta) -> MeetbookResult<()> {
        let meta_json =
            serde_json::to_string(meta).map_err(|e| MeetbookError::Store(e.to_string()))?;

        self.store.set(&key.title_key(), title)?;
        self.store.set(&key.notes_key(), &meta.notes)?;
        self.store.set(&key.meta_key(), &meta_json)?;
        Ok(())
    }

    /// Mirror a server snapshot. An empty server title leaves the cached
    /// title alone.
    pub fn store_snapshot(
        &self,
        key: &DraftKey,
        detail: &MeetingDetail,
        meta: &MeetingMeta,
    ) -> MeetbookResult<()> {
        if !detail.title.is_empty() {
            self.store.set(&key.title_key(), &detail.title)?;
        }

        let meta_json =
            serde_json::to_string(meta).map_err(|e| MeetbookError::Store(e.to_string()))?;
        self.store.set(&key.notes_key(), &meta.notes)?;
        self.store.set(&key.meta_key(), &meta_json)?;
        Ok(())
    }

    /// Copy every entry stored under `from` to `to`.
    pub fn copy(&self, from: &DraftKey, to: &DraftKey) -> MeetbookResult<()> {
        let suffix = format!(":{from}");

        for key in self.store.keys_with_prefix(KEY_PREFIX)? {
            let Some(kind) = key.strip_suffix(&suffix) else {
                continue;
            };
            if let Some(value) = self.store.get(&key)? {
                self.store.set(&format!("{kind}:{to}"), &value)?;
            }
        }

        Ok(())
    }

    /// Drop every entry stored under `key`.
    pub fn remove(&self, key: &DraftKey) -> MeetbookResult<()> {
        let suffix = format!(":{key}");

        for entry in self.store.keys_with_prefix(KEY_PREFIX)? {
            if entry.ends_with(&suffix) {
                self.store.remove(&entry)?;
            }
        }

        Ok(())
    }

    pub fn raw(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }
}
