use std::sync::Arc;

use chrono::NaiveDate;
use meetbook_core::api::{HttpClient, MeetingApi};
use meetbook_core::board::BoardCache;
use meetbook_core::draft::{DraftCache, DraftKey};
use meetbook_core::editor::{EditorSession, EditorState, MeetingRoute, SaveOutcome};
use meetbook_core::meeting::PublicId;
use meetbook_core::store::{FileStore, KeyValueStore, MemoryStore};
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::json;

const ID: &str = "3f2b8c1e-9d4a-4b7e-8c21-5a6f7e8d9c0b";
const NEW_ID: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

fn api(server: &mockito::ServerGuard) -> Arc<dyn MeetingApi> {
    Arc::new(HttpClient::new(&server.url()).unwrap())
}

fn detail(id: &str, title: &str, version: i64, notes: &str) -> String {
    json!({
        "publicId": id,
        "meetingId": 17,
        "title": title,
        "allDay": false,
        "start": "2024-03-01T09:00:00",
        "end": "2024-03-01T09:30:00",
        "noteContent": notes,
        "meetingVersion": version
    })
    .to_string()
}

fn nine_o_clock() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn new_meeting_is_created_and_opened() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/meeting")
        .match_body(Matcher::Json(json!({
            "title": "Standup",
            "allDay": false,
            "start": "2024-03-01T09:00:00",
            "end": "2024-03-01T09:30:00"
        })))
        .with_status(201)
        .with_body(json!({"publicId": NEW_ID, "meetingId": 18, "title": "Standup"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let load = server
        .mock("GET", format!("/meeting/{NEW_ID}").as_str())
        .with_body(detail(NEW_ID, "Standup", 1, ""))
        .expect(1)
        .create_async()
        .await;

    let cache = DraftCache::new(Arc::new(MemoryStore::new()));
    let session = EditorSession::open_at(&MeetingRoute::New, api(&server), cache.clone(), nine_o_clock());
    session.edit(|f| {
        f.title = "Standup".into();
        f.end = nine_o_clock() + chrono::Duration::minutes(30);
        f.meta.location = "Room 2".into();
    });

    let outcome = session.save().await.unwrap();
    let new_id = PublicId::parse(NEW_ID).unwrap();

    assert_eq!(outcome, SaveOutcome::Created { public_id: new_id.clone() });
    assert_eq!(session.key(), DraftKey::Meeting(new_id.clone()));
    assert_eq!(session.meeting_version(), Some(1));
    assert_eq!(session.fields().meta.location, "Room 2");
    assert_eq!(cache.load(&DraftKey::Meeting(new_id)).unwrap().meta.location, "Room 2");

    create.assert_async().await;
    load.assert_async().await;
}

#[tokio::test]
async fn stale_version_reloads_once_without_retrying() {
    let mut server = mockito::Server::new_async().await;
    let path = format!("/meeting/{ID}");

    let first_load = server
        .mock("GET", path.as_str())
        .with_body(detail(ID, "Weekly sync", 3, "old agenda"))
        .expect(1)
        .create_async()
        .await;

    let cache = DraftCache::new(Arc::new(MemoryStore::new()));
    let route = MeetingRoute::parse(ID);
    let session = EditorSession::open_at(&route, api(&server), cache.clone(), nine_o_clock());
    session.load().await.unwrap();
    assert_eq!(session.meeting_version(), Some(3));

    first_load.assert_async().await;
    first_load.remove_async().await;

    let patch = server
        .mock("PATCH", path.as_str())
        .match_body(Matcher::PartialJson(json!({
            "meetingVersion": 3,
            "content": "my agenda"
        })))
        .with_status(409)
        .with_body(json!({"message": "version mismatch"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let refetch = server
        .mock("GET", path.as_str())
        .with_body(detail(ID, "Weekly sync (moved)", 4, "their agenda"))
        .expect(1)
        .create_async()
        .await;

    session.edit(|f| f.meta.notes = "my agenda".into());
    let outcome = session.save().await.unwrap();

    assert_eq!(outcome, SaveOutcome::ConflictReloaded { version: Some(4) });
    assert_eq!(session.state(), EditorState::ConflictDetected);
    assert_eq!(session.reset_counter(), 1);

    let fields = session.fields();
    assert_eq!(fields.title, "Weekly sync (moved)");
    assert_eq!(fields.meta.notes, "their agenda");

    let cached = cache.load(&route.draft_key()).unwrap();
    assert_eq!(cached.title, "Weekly sync (moved)");
    assert_eq!(cached.meta.notes, "their agenda");

    patch.assert_async().await;
    refetch.assert_async().await;
}

#[tokio::test]
async fn empty_update_response_refetches_the_version() {
    let mut server = mockito::Server::new_async().await;
    let path = format!("/meeting/{ID}");

    let first_load = server
        .mock("GET", path.as_str())
        .with_body(detail(ID, "Weekly sync", 3, ""))
        .expect(1)
        .create_async()
        .await;

    let cache = DraftCache::new(Arc::new(MemoryStore::new()));
    let route = MeetingRoute::parse(ID);
    let session = EditorSession::open_at(&route, api(&server), cache, nine_o_clock());
    session.load().await.unwrap();

    first_load.assert_async().await;
    first_load.remove_async().await;

    let patch = server
        .mock("PATCH", path.as_str())
        .match_body(Matcher::PartialJson(json!({"meetingVersion": 3})))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let version_check = server
        .mock("GET", path.as_str())
        .with_body(detail(ID, "Weekly sync", 5, "new agenda"))
        .expect(1)
        .create_async()
        .await;

    session.edit(|f| f.meta.notes = "new agenda".into());
    let outcome = session.save().await.unwrap();

    assert_eq!(outcome, SaveOutcome::Updated { version: Some(5) });
    assert_eq!(session.state(), EditorState::Clean);
    assert_eq!(session.meeting_version(), Some(5));
    assert_eq!(session.fields().meta.notes, "new agenda");
    assert!(session.last_error().is_none());

    patch.assert_async().await;
    version_check.assert_async().await;
}

#[tokio::test]
async fn double_save_of_new_meeting_creates_once() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/meeting")
        .with_status(201)
        .with_body(json!({"publicId": NEW_ID, "meetingId": 18}).to_string())
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", format!("/meeting/{NEW_ID}").as_str())
        .with_body(detail(NEW_ID, "Planning", 1, ""))
        .create_async()
        .await;

    let cache = DraftCache::new(Arc::new(MemoryStore::new()));
    let session = EditorSession::open_at(&MeetingRoute::New, api(&server), cache, nine_o_clock());
    session.edit(|f| f.title = "Planning".into());

    let (first, second) = tokio::join!(session.save(), session.save());
    let outcomes = [first.unwrap(), second.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| **o == SaveOutcome::Skipped).count(), 1);
    assert_eq!(
        outcomes.iter().filter(|o| matches!(o, SaveOutcome::Created { .. })).count(),
        1
    );
    create.assert_async().await;
}

#[tokio::test]
async fn server_error_leaves_backup_on_disk() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", format!("/meeting/{ID}").as_str())
        .with_body(detail(ID, "Weekly sync", 3, ""))
        .create_async()
        .await;
    server
        .mock("PATCH", format!("/meeting/{ID}").as_str())
        .with_status(500)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drafts.json");
    let store = Arc::new(FileStore::open(&path).unwrap());
    let cache = DraftCache::new(store);

    let route = MeetingRoute::parse(ID);
    let session = EditorSession::open_at(&route, api(&server), cache, nine_o_clock());
    session.load().await.unwrap();
    session.edit(|f| {
        f.title = "Weekly sync v2".into();
        f.meta.notes = "do not lose me".into();
    });

    assert!(session.save().await.is_err());
    assert_eq!(session.state(), EditorState::Error);
    assert_eq!(session.fields().meta.notes, "do not lose me");

    // A fresh process sees the backup
    let reopened = DraftCache::new(Arc::new(FileStore::open(&path).unwrap()));
    let draft = reopened.load(&route.draft_key()).unwrap();
    assert_eq!(draft.title, "Weekly sync v2");
    assert_eq!(draft.meta.notes, "do not lose me");
}

#[tokio::test]
async fn invalid_route_opens_new_meeting() {
    let server = mockito::Server::new_async().await;
    let cache = DraftCache::new(Arc::new(MemoryStore::new()));

    let route = MeetingRoute::parse("42");
    let session = EditorSession::open_at(&route, api(&server), cache, nine_o_clock());

    assert_eq!(session.key(), DraftKey::New);
    assert!(!session.is_patchable());
    session.load().await.unwrap();
    assert_eq!(session.state(), EditorState::Editing);
}

#[tokio::test]
async fn board_cache_revalidates_with_etag() {
    let mut server = mockito::Server::new_async().await;
    let path = format!("/meeting/{ID}/board");

    let fresh = server
        .mock("GET", path.as_str())
        .match_header("if-none-match", Matcher::Missing)
        .with_header("etag", "\"v1\"")
        .with_body(json!({"snapshot": {"cards": 3}}).to_string())
        .expect(1)
        .create_async()
        .await;
    let unchanged = server
        .mock("GET", path.as_str())
        .match_header("if-none-match", "\"v1\"")
        .with_status(304)
        .expect(1)
        .create_async()
        .await;

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let boards = BoardCache::new(api(&server), store);
    let id = PublicId::parse(ID).unwrap();

    assert_eq!(boards.load(&id).await.unwrap(), Some(json!({"cards": 3})));
    assert_eq!(boards.load(&id).await.unwrap(), Some(json!({"cards": 3})));

    fresh.assert_async().await;
    unchanged.assert_async().await;
}
