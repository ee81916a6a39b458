//! PostgREST-style HTTP client for the mirror tables.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{CompletionRecord, ReactionCount, RemoteCompletion, RemoteMirror, RemoteProfile};
use crate::error::MirrorError;
use crate::room::RoomSnapshot;
use crate::storage::MirrorConfig;

const PROFILE_COLUMNS: &str = "id,nickname,friend_code";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Talks to `<base>/rest/v1/<table>` with the anonymous API key.
pub struct RestMirror {
    base: Url,
    anon_key: String,
    http_client: Client,
}

impl RestMirror {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, MirrorError> {
        Self::with_timeout(base_url, anon_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Every request, body included, must finish within `timeout`.
    pub fn with_timeout(
        base_url: &str,
        anon_key: &str,
        timeout: Duration,
    ) -> Result<Self, MirrorError> {
        if base_url.trim().is_empty() || anon_key.trim().is_empty() {
            return Err(MirrorError::NotConfigured);
        }
        let mut base = Url::parse(base_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            anon_key: anon_key.trim().to_string(),
            http_client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Build from the `[mirror]` config section.
    pub fn from_config(config: &MirrorConfig) -> Result<Self, MirrorError> {
        if !config.is_configured() {
            return Err(MirrorError::NotConfigured);
        }
        Self::with_timeout(
            &config.base_url,
            &config.anon_key,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    fn table(&self, name: &str) -> Result<Url, MirrorError> {
        Ok(self.base.join(&format!("rest/v1/{name}"))?)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, MirrorError> {
        let req = self.http_client.get(self.table(table)?).query(query);
        let resp = check(self.authorized(req).send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn insert(
        &self,
        table: &str,
        body: serde_json::Value,
        prefer: &str,
    ) -> Result<Response, MirrorError> {
        let req = self
            .http_client
            .post(self.table(table)?)
            .header("Prefer", prefer)
            .json(&body);
        check(self.authorized(req).send().await?).await
    }
}

/// Map non-success statuses onto [`MirrorError`]. 409 is a unique violation.
async fn check(resp: Response) -> Result<Response, MirrorError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::CONFLICT {
        return Err(MirrorError::Duplicate(body));
    }
    Err(MirrorError::Status {
        status: status.as_u16(),
        body,
    })
}

/// PostgREST `in.(a,b,c)` filter value.
fn in_list(values: &[String]) -> String {
    format!("in.({})", values.join(","))
}

#[async_trait]
impl RemoteMirror for RestMirror {
    async fn upsert_room(&self, user_id: &str, room: &RoomSnapshot) -> Result<(), MirrorError> {
        let body = json!({
            "user_id": user_id,
            "placed_items": room.placed_items,
            "wall_color": room.wall_color,
            "floor_color": room.floor_color,
            "room_level": room.room_level,
            "updated_at": room.updated_at.to_rfc3339(),
        });
        self.insert("rooms", body, "resolution=merge-duplicates,return=minimal")
            .await?;
        Ok(())
    }

    async fn register_profile(
        &self,
        nickname: &str,
        friend_code: &str,
    ) -> Result<RemoteProfile, MirrorError> {
        let body = json!({ "nickname": nickname, "friend_code": friend_code });
        let resp = self.insert("profiles", body, "return=representation").await?;
        let rows: Vec<RemoteProfile> = resp.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| MirrorError::NotFound("created profile row".into()))
    }

    async fn find_profile_by_code(
        &self,
        code: &str,
    ) -> Result<Option<RemoteProfile>, MirrorError> {
        let rows: Vec<RemoteProfile> = self
            .get_rows(
                "profiles",
                &[
                    ("select", PROFILE_COLUMNS.to_string()),
                    ("friend_code", format!("eq.{code}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn create_friendship(&self, user_id: &str, friend_id: &str) -> Result<(), MirrorError> {
        let body = json!([
            { "user_id": user_id, "friend_id": friend_id },
            { "user_id": friend_id, "friend_id": user_id },
        ]);
        self.insert("friendships", body, "return=minimal").await?;
        Ok(())
    }

    async fn list_friends(&self, user_id: &str) -> Result<Vec<RemoteProfile>, MirrorError> {
        #[derive(Deserialize)]
        struct Link {
            friend_id: String,
        }

        let links: Vec<Link> = self
            .get_rows(
                "friendships",
                &[
                    ("select", "friend_id".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                ],
            )
            .await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = links.into_iter().map(|l| l.friend_id).collect();
        self.get_rows(
            "profiles",
            &[
                ("select", PROFILE_COLUMNS.to_string()),
                ("id", in_list(&ids)),
            ],
        )
        .await
    }

    async fn record_completed_task(
        &self,
        user_id: &str,
        record: &CompletionRecord,
    ) -> Result<(), MirrorError> {
        let body = json!({
            "user_id": user_id,
            "title": record.title,
            "emoji": record.emoji,
        });
        self.insert("completed_tasks", body, "return=minimal").await?;
        Ok(())
    }

    async fn completed_tasks_since(
        &self,
        user_ids: &[String],
        since: DateTime<FixedOffset>,
    ) -> Result<Vec<RemoteCompletion>, MirrorError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_rows(
            "completed_tasks",
            &[
                ("select", "id,user_id,title,emoji,completed_at".to_string()),
                ("user_id", in_list(user_ids)),
                ("completed_at", format!("gte.{}", since.to_rfc3339())),
                ("order", "completed_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn reaction_counts(&self, task_id: &str) -> Result<Vec<ReactionCount>, MirrorError> {
        #[derive(Deserialize)]
        struct Row {
            emoji: String,
        }

        let rows: Vec<Row> = self
            .get_rows(
                "reactions",
                &[
                    ("select", "emoji".to_string()),
                    ("task_id", format!("eq.{task_id}")),
                ],
            )
            .await?;
        let mut tally: BTreeMap<String, u32> = BTreeMap::new();
        for row in rows {
            *tally.entry(row.emoji).or_default() += 1;
        }
        Ok(tally
            .into_iter()
            .map(|(emoji, count)| ReactionCount { emoji, count })
            .collect())
    }

    async fn add_reaction(
        &self,
        from_user_id: &str,
        task_id: &str,
        emoji: &str,
    ) -> Result<(), MirrorError> {
        let body = json!({
            "from_user_id": from_user_id,
            "task_id": task_id,
            "emoji": emoji,
        });
        self.insert("reactions", body, "return=minimal").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const KEY: &str = "anon-key";

    fn client(server: &mockito::ServerGuard) -> RestMirror {
        RestMirror::new(&server.url(), KEY).unwrap()
    }

    #[test]
    fn rejects_missing_configuration() {
        assert!(matches!(
            RestMirror::new("", KEY),
            Err(MirrorError::NotConfigured)
        ));
        assert!(matches!(
            RestMirror::new("https://x.example.com", " "),
            Err(MirrorError::NotConfigured)
        ));
        assert!(matches!(
            RestMirror::new("not a url", KEY),
            Err(MirrorError::Url(_))
        ));
    }

    #[tokio::test]
    async fn register_returns_created_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/profiles")
            .match_header("apikey", KEY)
            .match_header("authorization", format!("Bearer {KEY}").as_str())
            .match_body(Matcher::PartialJson(json!({
                "nickname": "mina",
                "friend_code": "ABC234",
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"u-1","nickname":"mina","friend_code":"ABC234"}]"#)
            .create_async()
            .await;

        let profile = client(&server)
            .register_profile("mina", "ABC234")
            .await
            .unwrap();
        assert_eq!(profile.id, "u-1");
        assert_eq!(profile.friend_code.as_deref(), Some("ABC234"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn conflict_maps_to_duplicate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/profiles")
            .with_status(409)
            .with_body(r#"{"code":"23505"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .register_profile("mina", "ABC234")
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorError::Duplicate(_)));
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/completed_tasks")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let record = CompletionRecord {
            title: "Drink water".into(),
            emoji: "💧".into(),
        };
        let err = client(&server)
            .record_completed_task("u-1", &record)
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn find_by_code_filters_on_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/profiles")
            .match_query(Matcher::UrlEncoded("friend_code".into(), "eq.XYZ789".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"u-2","nickname":"jun","friend_code":"XYZ789"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/rest/v1/profiles")
            .match_query(Matcher::UrlEncoded("friend_code".into(), "eq.NOPE22".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let mirror = client(&server);
        let found = mirror.find_profile_by_code("XYZ789").await.unwrap();
        assert_eq!(found.map(|p| p.nickname), Some("jun".to_string()));
        assert!(mirror.find_profile_by_code("NOPE22").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn friendship_inserts_both_directions() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/friendships")
            .match_body(Matcher::Json(json!([
                { "user_id": "a", "friend_id": "b" },
                { "user_id": "b", "friend_id": "a" },
            ])))
            .with_status(201)
            .create_async()
            .await;

        client(&server).create_friendship("a", "b").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_friends_resolves_profiles() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/friendships")
            .match_query(Matcher::UrlEncoded("user_id".into(), "eq.a".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"friend_id":"b"},{"friend_id":"c"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/rest/v1/profiles")
            .match_query(Matcher::UrlEncoded("id".into(), "in.(b,c)".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"b","nickname":"bo"},{"id":"c","nickname":"cy"}]"#)
            .create_async()
            .await;

        let friends = client(&server).list_friends("a").await.unwrap();
        let names: Vec<_> = friends.iter().map(|f| f.nickname.as_str()).collect();
        assert_eq!(names, vec!["bo", "cy"]);
    }

    #[tokio::test]
    async fn reactions_are_tallied_by_emoji() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/reactions")
            .match_query(Matcher::UrlEncoded("task_id".into(), "eq.t-1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"emoji":"👏"},{"emoji":"🔥"},{"emoji":"👏"}]"#)
            .create_async()
            .await;

        let counts = client(&server).reaction_counts("t-1").await.unwrap();
        assert_eq!(
            counts,
            vec![
                ReactionCount { emoji: "👏".into(), count: 2 },
                ReactionCount { emoji: "🔥".into(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn room_upsert_merges_duplicates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/rooms")
            .match_header("prefer", Matcher::Regex("merge-duplicates".into()))
            .match_body(Matcher::PartialJson(json!({
                "user_id": "u-1",
                "room_level": 1,
                "wall_color": "#FFF8F0",
                "updated_at": "2026-03-02T09:00:00+09:00",
            })))
            .with_status(201)
            .create_async()
            .await;

        let room = RoomSnapshot {
            placed_items: Vec::new(),
            wall_color: "#FFF8F0".into(),
            floor_color: "#F5F0E8".into(),
            room_level: 1,
            updated_at: DateTime::parse_from_rfc3339("2026-03-02T09:00:00+09:00").unwrap(),
        };
        client(&server).upsert_room("u-1", &room).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let mirror = RestMirror::with_timeout(&url, KEY, Duration::from_millis(200)).unwrap();

        let record = CompletionRecord {
            title: "Drink water".into(),
            emoji: "💧".into(),
        };
        let started = std::time::Instant::now();
        let err = mirror.record_completed_task("u-1", &record).await.unwrap_err();
        assert!(matches!(err, MirrorError::Request(e) if e.is_timeout()));
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }
}
