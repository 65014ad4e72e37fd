//! HTTP client for the meeting REST API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ETAG, IF_MATCH, IF_NONE_MATCH};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::api::{BoardBody, BoardFetch, IfMatch, MeetingApi};
use crate::config::MeetbookConfig;
use crate::error::{MeetbookError, MeetbookResult};
use crate::meeting::{
    CreateMeetingRequest, CreateMeetingResponse, ListMeetingsResponse, MeetingDetail,
    MeetingTemplate, PublicId, UpdateMeetingRequest, UpdateMeetingResponse,
};
use crate::query::ListQuery;

const USER_AGENT: &str = concat!("meetbook/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed [`MeetingApi`].
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

// Error bodies come in a couple of shapes
#[derive(Deserialize)]
struct ErrorResponse {
    message: Option<String>,
    error: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: &str) -> MeetbookResult<Self> {
        Self::build(base_url, None, None)
    }

    pub fn from_config(config: &MeetbookConfig) -> MeetbookResult<Self> {
        Self::build(
            &config.api_base_url,
            config.auth_token.clone(),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    fn build(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Option<Duration>,
    ) -> MeetbookResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| MeetbookError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(HttpClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "meeting api request");

        let builder = self.http.request(method, url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and turn non-2xx statuses into errors.
    async fn send(&self, builder: RequestBuilder) -> MeetbookResult<Response> {
        let resp = builder.send().await.map_err(|e| {
            tracing::warn!("meeting api unreachable: {}", e);
            MeetbookError::Network(e.to_string())
        })?;

        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> MeetbookResult<T> {
        let resp = self.send(builder).await?;
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| MeetbookError::Decode(e.to_string()))
    }
}

/// Map an error status to the error taxonomy.
async fn error_from_response(resp: Response) -> MeetbookError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.message.or(e.error))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                body
            }
        });

    match status {
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
            MeetbookError::VersionConflict(message)
        }
        StatusCode::NOT_FOUND => MeetbookError::NotFound(message),
        s if s.is_server_error() => MeetbookError::Server {
            status: s.as_u16(),
            message,
        },
        s => MeetbookError::Validation {
            status: s.as_u16(),
            message,
        },
    }
}

fn etag_of(resp: &Response) -> Option<String> {
    resp.headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl MeetingApi for HttpClient {
    async fn create(&self, req: &CreateMeetingRequest) -> MeetbookResult<CreateMeetingResponse> {
        self.send_json(self.request(Method::POST, "/meeting").json(req))
            .await
    }

    async fn update(
        &self,
        id: &PublicId,
        req: &UpdateMeetingRequest,
    ) -> MeetbookResult<UpdateMeetingResponse> {
        let resp = self
            .send(self.request(Method::PATCH, &format!("/meeting/{}", id)).json(req))
            .await?;
        let body = resp.bytes().await?;

        // 204 or an empty 200: committed, but the new version is unknown
        if body.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!(%id, "update returned no body");
            return Ok(UpdateMeetingResponse {
                public_id: id.clone(),
                meeting_id: None,
                meeting_version: None,
                note_version: None,
            });
        }

        serde_json::from_slice(&body).map_err(|e| MeetbookError::Decode(e.to_string()))
    }

    async fn delete(&self, id: &PublicId, if_match: Option<&IfMatch>) -> MeetbookResult<()> {
        let mut builder = self.request(Method::DELETE, &format!("/meeting/{}", id));
        if let Some(if_match) = if_match {
            builder = builder.header(IF_MATCH, if_match.header_value());
        }

        self.send(builder).await?;
        Ok(())
    }

    async fn detail(&self, id: &PublicId) -> MeetbookResult<MeetingDetail> {
        self.send_json(self.request(Method::GET, &format!("/meeting/{}", id)))
            .await
    }

    async fn list(&self, query: &ListQuery) -> MeetbookResult<ListMeetingsResponse> {
        self.send_json(
            self.request(Method::GET, "/meeting")
                .query(&query.params()),
        )
        .await
    }

    async fn board(&self, id: &PublicId, if_none_match: Option<&str>) -> MeetbookResult<BoardFetch> {
        let mut builder = self.request(Method::GET, &format!("/meeting/{}/board", id));
        if let Some(tag) = if_none_match {
            builder = builder.header(IF_NONE_MATCH, tag);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| MeetbookError::Network(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_MODIFIED => Ok(BoardFetch::NotModified),
            StatusCode::NOT_FOUND => Ok(BoardFetch::Missing),
            StatusCode::OK => {
                let etag = etag_of(&resp);
                let body = resp.bytes().await?;
                let board: BoardBody = serde_json::from_slice(&body)
                    .map_err(|e| MeetbookError::Decode(e.to_string()))?;
                Ok(BoardFetch::Fresh {
                    snapshot: board.snapshot,
                    etag,
                })
            }
            _ => Err(error_from_response(resp).await),
        }
    }

    async fn put_board(
        &self,
        id: &PublicId,
        snapshot: &serde_json::Value,
    ) -> MeetbookResult<Option<String>> {
        let body = BoardBody {
            snapshot: snapshot.clone(),
        };
        let resp = self
            .send(
                self.request(Method::PUT, &format!("/meeting/{}/board", id))
                    .json(&body),
            )
            .await?;

        Ok(etag_of(&resp))
    }

    async fn templates(&self) -> MeetbookResult<Vec<MeetingTemplate>> {
        self.send_json(self.request(Method::GET, "/meeting/template"))
            .await
    }

    async fn template(&self, id: &str) -> MeetbookResult<MeetingTemplate> {
        self.send_json(self.request(Method::GET, &format!("/meeting/template/{}", id)))
            .await
    }
}
