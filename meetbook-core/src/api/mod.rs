//! REST API surface for meetings.
//!
//! [`MeetingApi`] is the seam between the editor session and the network;
//! [`HttpClient`] is the reqwest implementation.

mod client;

pub use client::HttpClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MeetbookResult;
use crate::meeting::{
    CreateMeetingRequest, CreateMeetingResponse, ListMeetingsResponse, MeetingDetail,
    MeetingTemplate, PublicId, UpdateMeetingRequest, UpdateMeetingResponse,
};
use crate::query::ListQuery;

/// Expected version for a conditional delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfMatch {
    Version(i64),
    Tag(String),
}

impl IfMatch {
    /// Header value, quoted unless it already is.
    pub fn header_value(&self) -> String {
        match self {
            IfMatch::Version(v) => format!("\"{}\"", v),
            IfMatch::Tag(t) if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') => t.clone(),
            IfMatch::Tag(t) => format!("\"{}\"", t),
        }
    }
}

impl From<i64> for IfMatch {
    fn from(v: i64) -> Self {
        IfMatch::Version(v)
    }
}

/// Result of a conditional board fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardFetch {
    Fresh {
        snapshot: serde_json::Value,
        etag: Option<String>,
    },
    NotModified,
    Missing,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BoardBody {
    #[serde(default)]
    pub snapshot: serde_json::Value,
}

#[async_trait]
pub trait MeetingApi: Send + Sync {
    /// POST /meeting
    async fn create(&self, req: &CreateMeetingRequest) -> MeetbookResult<CreateMeetingResponse>;

    /// PATCH /meeting/{id}
    async fn update(
        &self,
        id: &PublicId,
        req: &UpdateMeetingRequest,
    ) -> MeetbookResult<UpdateMeetingResponse>;

    /// DELETE /meeting/{id}
    async fn delete(&self, id: &PublicId, if_match: Option<&IfMatch>) -> MeetbookResult<()>;

    /// GET /meeting/{id}
    async fn detail(&self, id: &PublicId) -> MeetbookResult<MeetingDetail>;

    /// GET /meeting
    async fn list(&self, query: &ListQuery) -> MeetbookResult<ListMeetingsResponse>;

    /// GET /meeting/{id}/board
    async fn board(&self, id: &PublicId, if_none_match: Option<&str>) -> MeetbookResult<BoardFetch>;

    /// PUT /meeting/{id}/board. Returns the new entity tag, if any.
    async fn put_board(
        &self,
        id: &PublicId,
        snapshot: &serde_json::Value,
    ) -> MeetbookResult<Option<String>>;

    /// GET /meeting/template
    async fn templates(&self) -> MeetbookResult<Vec<MeetingTemplate>>;

    /// GET /meeting/template/{id}
    async fn template(&self, id: &str) -> MeetbookResult<MeetingTemplate>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn if_match_quotes_versions() {
        assert_eq!(IfMatch::Version(5).header_value(), "\"5\"");
        assert_eq!(IfMatch::from(12).header_value(), "\"12\"");
    }

    #[test]
    fn if_match_keeps_existing_quotes() {
        assert_eq!(IfMatch::Tag("\"abc\"".into()).header_value(), "\"abc\"");
        assert_eq!(IfMatch::Tag("abc".into()).header_value(), "\"abc\"");
        assert_eq!(IfMatch::Tag("\"".into()).header_value(), "\"\"\"");
    }
}
