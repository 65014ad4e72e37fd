//! Meeting types as exchanged with the REST API.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, de};
use uuid::{Uuid, Variant};

use crate::timestamp::{local_seconds, option_local_seconds};

/// Numeric server-side meeting id. Never used for addressing.
pub type InternalId = i64;

/// External meeting identifier.
///
/// Ids typed by the user go through [`PublicId::parse`], which only accepts a
/// hyphenated UUID of versions 1-5 with the RFC 4122 variant. Ids decoded from
/// server responses are taken as issued, so one id outside that range cannot
/// fail a whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct PublicId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPublicId(pub String);

impl fmt::Display for InvalidPublicId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' is not a meeting id", self.0)
    }
}

impl std::error::Error for InvalidPublicId {}

impl PublicId {
    pub fn parse(s: &str) -> Result<Self, InvalidPublicId> {
        if Self::is_valid(s) {
            Ok(PublicId(s.to_string()))
        } else {
            Err(InvalidPublicId(s.to_string()))
        }
    }

    pub fn is_valid(s: &str) -> bool {
        // Only the canonical hyphenated form; Uuid::try_parse also takes
        // braced, urn and simple forms.
        let bytes = s.as_bytes();
        if bytes.len() != 36 || [8, 13, 18, 23].iter().any(|&i| bytes[i] != b'-') {
            return false;
        }

        let Ok(uuid) = Uuid::try_parse(s) else {
            return false;
        };

        matches!(uuid.get_version_num(), 1..=5) && uuid.get_variant() == Variant::RFC4122
    }

    /// Accept an id the server issued. Only an empty id is refused.
    pub fn from_server(s: impl Into<String>) -> Result<Self, InvalidPublicId> {
        let s = s.into();
        if s.trim().is_empty() {
            Err(InvalidPublicId(s))
        } else {
            Ok(PublicId(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PublicId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicId::from_server(s).map_err(de::Error::custom)
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PublicId {
    type Err = InvalidPublicId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicId::parse(s)
    }
}

impl From<PublicId> for String {
    fn from(id: PublicId) -> Self {
        id.0
    }
}

// ============================================================================
// Create / update
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub title: String,
    pub all_day: bool,
    #[serde(with = "local_seconds")]
    pub start: NaiveDateTime,
    #[serde(with = "local_seconds")]
    pub end: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_account_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingResponse {
    pub public_id: PublicId,
    pub meeting_id: InternalId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub meeting_version: Option<i64>,
}

/// Partial update. Fields left as `None` are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(
        default,
        with = "option_local_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<NaiveDateTime>,
    #[serde(
        default,
        with = "option_local_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_account_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_version: Option<i64>,
    /// Note content, persisted by the server in the same call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetingResponse {
    pub public_id: PublicId,
    #[serde(default)]
    pub meeting_id: Option<InternalId>,
    #[serde(default)]
    pub meeting_version: Option<i64>,
    #[serde(default)]
    pub note_version: Option<i64>,
}

// ============================================================================
// Detail
// ============================================================================

/// A participant display record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Participant {
    /// First non-empty of nickname, name, display name.
    pub fn display_name(&self) -> Option<&str> {
        [&self.nickname, &self.name, &self.display_name]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
}

impl Team {
    pub fn display_name(&self) -> Option<&str> {
        [&self.name, &self.team_name]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDetail {
    pub public_id: PublicId,
    pub meeting_id: InternalId,
    pub title: String,
    #[serde(default)]
    pub all_day: bool,
    #[serde(with = "local_seconds")]
    pub start: NaiveDateTime,
    #[serde(with = "local_seconds")]
    pub end: NaiveDateTime,

    #[serde(default)]
    pub creator_account_id: Option<i64>,
    #[serde(default)]
    pub creator_nickname: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub note_content: Option<String>,
    #[serde(default)]
    pub meeting_version: Option<i64>,
    #[serde(default)]
    pub note_version: Option<i64>,

    #[serde(default)]
    pub participant_list: Vec<Participant>,
    #[serde(default)]
    pub team_list: Vec<Team>,
}

impl MeetingDetail {
    /// Participants as the editor shows them: "Ann, Bob".
    pub fn participants_display(&self) -> String {
        join_names(self.participant_list.iter().filter_map(Participant::display_name))
    }

    /// Team names joined the same way, `None` when there are none.
    pub fn teams_display(&self) -> Option<String> {
        let joined = join_names(self.team_list.iter().filter_map(Team::display_name));
        if joined.is_empty() { None } else { Some(joined) }
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

// ============================================================================
// List
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingListItem {
    pub meeting_id: InternalId,
    pub public_id: PublicId,
    pub title: String,
    #[serde(default)]
    pub all_day: bool,
    #[serde(with = "local_seconds")]
    pub start: NaiveDateTime,
    #[serde(with = "local_seconds")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub creator_nickname: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub participant_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeetingsResponse {
    #[serde(default)]
    pub items: Vec<MeetingListItem>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
}

// ============================================================================
// Templates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateColumn {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub badge_class: Option<String>,
}

/// Static board template (e.g. "standup", "4ls").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingTemplate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub columns: Vec<TemplateColumn>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ID: &str = "3f2b8c1e-9d4a-4b7e-8c21-5a6f7e8d9c0b";

    #[test]
    fn public_id_accepts_canonical_uuid() {
        assert!(PublicId::is_valid(ID));
        assert!(PublicId::is_valid(&ID.to_uppercase()));
    }

    #[test]
    fn public_id_rejects_other_forms() {
        assert!(!PublicId::is_valid("new"));
        assert!(!PublicId::is_valid("42"));
        assert!(!PublicId::is_valid("3f2b8c1e9d4a4b7e8c215a6f7e8d9c0b"));
        assert!(!PublicId::is_valid(&format!("{{{}}}", ID)));
        // version nibble 0
        assert!(!PublicId::is_valid("3f2b8c1e-9d4a-0b7e-8c21-5a6f7e8d9c0b"));
        // variant nibble outside 8-b
        assert!(!PublicId::is_valid("3f2b8c1e-9d4a-4b7e-cc21-5a6f7e8d9c0b"));
    }

    #[test]
    fn server_ids_outside_versions_one_to_five_still_decode() {
        // UUIDv7, as newer backends issue
        let v7 = "01890a5d-ac96-774b-bcce-b302099a8057";

        let id: PublicId = serde_json::from_str(&format!("\"{v7}\"")).unwrap();
        assert_eq!(id.as_str(), v7);
        assert!(PublicId::parse(v7).is_err());
        assert_eq!(
            crate::editor::MeetingRoute::parse(v7),
            crate::editor::MeetingRoute::Redirect { requested: v7.to_string() }
        );

        assert!(serde_json::from_str::<PublicId>("\"\"").is_err());
    }

    #[test]
    fn participant_name_precedence() {
        let p = Participant {
            nickname: Some("  ".into()),
            name: Some("Ann Lee".into()),
            display_name: Some("ann@example.com".into()),
            ..Default::default()
        };
        assert_eq!(p.display_name(), Some("Ann Lee"));

        let p = Participant {
            nickname: Some("annie".into()),
            name: Some("Ann Lee".into()),
            ..Default::default()
        };
        assert_eq!(p.display_name(), Some("annie"));

        assert_eq!(Participant::default().display_name(), None);
    }

    #[test]
    fn detail_decodes_and_builds_display_strings() {
        let json = format!(
            r#"{{
                "publicId": "{ID}",
                "meetingId": 7,
                "title": "Weekly",
                "allDay": false,
                "start": "2024-03-01T09:00:00",
                "end": "2024-03-01T10:00:00",
                "noteContent": "agenda",
                "meetingVersion": 4,
                "noteVersion": 2,
                "participantList": [
                    {{"accountId": 1, "nickname": "kim"}},
                    {{"accountId": 2, "name": "Lee"}},
                    {{"accountId": 3}},
                    {{"accountId": 4, "displayName": "Park"}}
                ],
                "teamList": [{{"teamId": 9, "teamName": "Platform"}}, {{"name": "Infra"}}]
            }}"#
        );

        let detail: MeetingDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(detail.meeting_version, Some(4));
        assert_eq!(detail.participants_display(), "kim, Lee, Park");
        assert_eq!(detail.teams_display().as_deref(), Some("Platform, Infra"));
    }

    #[test]
    fn create_request_omits_absent_references() {
        let req = CreateMeetingRequest {
            title: "Standup".into(),
            all_day: false,
            start: crate::timestamp::parse_server("2024-03-01T09:00:00").unwrap(),
            end: crate::timestamp::parse_server("2024-03-01T09:30:00").unwrap(),
            project_id: None,
            participant_account_ids: None,
            team_ids: None,
        };

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({
                "title": "Standup",
                "allDay": false,
                "start": "2024-03-01T09:00:00",
                "end": "2024-03-01T09:30:00"
            })
        );
    }

    #[test]
    fn list_response_tolerates_missing_pagination() {
        let resp: ListMeetingsResponse = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(resp, ListMeetingsResponse::default());
    }
}
