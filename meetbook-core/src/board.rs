//! Board snapshots with entity-tag revalidation.
//!
//! The snapshot is opaque JSON. The last fetched snapshot and its tag are
//! kept in the draft store under `meeting:board:{id}` so an unchanged board
//! costs a 304.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::{BoardFetch, MeetingApi};
use crate::draft::DraftKey;
use crate::error::{MeetbookError, MeetbookResult};
use crate::meeting::PublicId;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CachedBoard {
    etag: Option<String>,
    snapshot: serde_json::Value,
}

pub struct BoardCache {
    api: Arc<dyn MeetingApi>,
    store: Arc<dyn KeyValueStore>,
}

impl BoardCache {
    pub fn new(api: Arc<dyn MeetingApi>, store: Arc<dyn KeyValueStore>) -> Self {
        BoardCache { api, store }
    }

    /// Current board, `None` when the meeting has none yet.
    pub async fn load(&self, id: &PublicId) -> MeetbookResult<Option<serde_json::Value>> {
        let key = DraftKey::Meeting(id.clone()).board_key();
        let cached = self.cached(&key)?;
        let etag = cached.as_ref().and_then(|c| c.etag.as_deref());

        match self.api.board(id, etag).await? {
            BoardFetch::Fresh { snapshot, etag } => {
                tracing::debug!(%id, "board fetched");
                self.remember(&key, etag, &snapshot)?;
                Ok(Some(snapshot))
            }
            BoardFetch::NotModified => match cached {
                Some(c) => Ok(Some(c.snapshot)),
                None => {
                    // We sent no tag, so a 304 means the server is confused
                    Err(MeetbookError::Decode(format!(
                        "board for {} reported unchanged but nothing is cached",
                        id
                    )))
                }
            },
            BoardFetch::Missing => {
                self.store.remove(&key)?;
                Ok(None)
            }
        }
    }

    pub async fn save(&self, id: &PublicId, snapshot: &serde_json::Value) -> MeetbookResult<()> {
        let etag = self.api.put_board(id, snapshot).await?;
        let key = DraftKey::Meeting(id.clone()).board_key();
        self.remember(&key, etag, snapshot)
    }

    fn cached(&self, key: &str) -> MeetbookResult<Option<CachedBoard>> {
        Ok(self
            .store
            .get(key)?
            .and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    fn remember(
        &self,
        key: &str,
        etag: Option<String>,
        snapshot: &serde_json::Value,
    ) -> MeetbookResult<()> {
        let entry = CachedBoard {
            etag,
            snapshot: snapshot.clone(),
        };
        let raw = serde_json::to_string(&entry).map_err(|e| MeetbookError::Store(e.to_string()))?;
        self.store.set(key, &raw)
    }
}
