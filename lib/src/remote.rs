//! Hosted backend store speaking the PostgREST dialect.
//!
//! CRUD goes straight to `{url}/rest/v1/{table}`. Live changes come from polling the
//! scoped snapshot (see [`crate::poll`]).

use crate::config::RemoteConfig;
use crate::error::{StoreError, SyncError};
use crate::models::{Bookmark, NewBookmark};
use crate::poll::{self, PollSettings};
use crate::session::Session;
use crate::store::{BookmarkStore, ChangeSink, Subscription};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// Connection details shared by the store and its poll workers
#[derive(Clone)]
struct Endpoint {
    client: Client,
    table_url: Url,
    anon_key: String,
    token: String,
}

impl Endpoint {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.token)
    }

    fn fetch(&self, scope: &str) -> Result<Vec<Bookmark>, StoreError> {
        let url = fetch_url(&self.table_url, scope);
        let resp = self.authorize(self.client.get(url)).send().map_err(transport)?;
        Ok(check_status(resp)?.json()?)
    }
}

pub struct RestStore {
    endpoint: Endpoint,
    poll: PollSettings,
}

impl RestStore {
    /// Build a store for `session`; the anon key stands in when it carries no token
    pub fn new(config: &RemoteConfig, session: &Session) -> Result<Self, SyncError> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("HTTP client: {}", e)))?;

        let token = if session.access_token.is_empty() {
            config.anon_key.clone()
        } else {
            session.access_token.clone()
        };

        Ok(Self {
            endpoint: Endpoint {
                client,
                table_url: table_url(&config.url, &config.table)?,
                anon_key: config.anon_key.clone(),
                token,
            },
            poll: PollSettings {
                interval: Duration::from_millis(config.poll_interval_ms),
                max_failures: config.max_poll_failures,
            },
        })
    }
}

impl BookmarkStore for RestStore {
    fn fetch_all(&self, scope: &str) -> Result<Vec<Bookmark>, StoreError> {
        self.endpoint.fetch(scope)
    }

    fn insert(&self, row: &NewBookmark) -> Result<Bookmark, StoreError> {
        let request = self
            .endpoint
            .client
            .post(self.endpoint.table_url.clone())
            .header("Prefer", "return=representation")
            .json(&[row]);
        let resp = self.endpoint.authorize(request).send().map_err(transport)?;

        first_created(check_status(resp)?.json()?)
    }

    fn delete(&self, id: &str, scope: &str) -> Result<(), StoreError> {
        let request = self
            .endpoint
            .client
            .delete(delete_url(&self.endpoint.table_url, id, scope))
            .header("Prefer", "return=representation");
        let resp = self.endpoint.authorize(request).send().map_err(transport)?;

        let deleted: Vec<Bookmark> = check_status(resp)?.json()?;
        check_deleted(&deleted)
    }

    fn subscribe_changes(
        &self,
        scope: &str,
        sink: ChangeSink,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        // Baseline taken before returning so nothing after subscribe() goes unseen
        let baseline = self.endpoint.fetch(scope)?;
        let endpoint = self.endpoint.clone();
        Ok(Box::new(poll::spawn(scope, sink, self.poll, baseline, move |scope| {
            endpoint.fetch(scope)
        })))
    }
}

fn table_url(base: &str, table: &str) -> Result<Url, SyncError> {
    let raw = format!("{}/rest/v1/{}", base.trim_end_matches('/'), table);
    Url::parse(&raw).map_err(|e| SyncError::Config(format!("Invalid backend URL '{}': {}", raw, e)))
}

fn fetch_url(table_url: &Url, scope: &str) -> Url {
    let mut url = table_url.clone();
    url.query_pairs_mut()
        .append_pair("select", "*")
        .append_pair("user_id", &format!("eq.{}", scope))
        .append_pair("order", "created_at.desc");
    url
}

fn delete_url(table_url: &Url, id: &str, scope: &str) -> Url {
    let mut url = table_url.clone();
    url.query_pairs_mut()
        .append_pair("id", &format!("eq.{}", id))
        .append_pair("user_id", &format!("eq.{}", scope));
    url
}

fn transport(e: reqwest::Error) -> StoreError {
    if e.is_connect() || e.is_timeout() {
        StoreError::Network(e.to_string())
    } else {
        StoreError::Http(e)
    }
}

fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized,
        _ => StoreError::Rejected(format!("HTTP {}: {}", status, body.trim())),
    }
}

fn first_created(mut created: Vec<Bookmark>) -> Result<Bookmark, StoreError> {
    if created.is_empty() {
        return Err(StoreError::Rejected("insert returned no row".to_string()));
    }
    Ok(created.swap_remove(0))
}

/// Row-level filters turn "not yours" into "nothing deleted"
fn check_deleted(deleted: &[Bookmark]) -> Result<(), StoreError> {
    if deleted.is_empty() {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn table() -> Url {
        table_url("https://proj.example.co/", "bookmarks").unwrap()
    }

    #[test]
    fn test_table_url_trims_slash() {
        assert_eq!(table().as_str(), "https://proj.example.co/rest/v1/bookmarks");
    }

    #[test]
    fn test_table_url_rejects_garbage() {
        assert!(matches!(table_url("not a url", "bookmarks"), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_fetch_url_is_scoped_and_ordered() {
        assert_eq!(
            fetch_url(&table(), "u1").as_str(),
            "https://proj.example.co/rest/v1/bookmarks?select=*&user_id=eq.u1&order=created_at.desc"
        );
    }

    #[test]
    fn test_delete_url_matches_id_and_owner() {
        assert_eq!(
            delete_url(&table(), "b2", "u1").as_str(),
            "https://proj.example.co/rest/v1/bookmarks?id=eq.b2&user_id=eq.u1"
        );
    }

    #[test]
    fn test_scope_is_encoded() {
        let url = fetch_url(&table(), "a&b");
        assert!(url.as_str().contains("user_id=eq.a%26b"));
    }

    #[rstest]
    #[case(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case(StatusCode::FORBIDDEN, "Unauthorized")]
    #[case(StatusCode::BAD_REQUEST, "Rejected")]
    #[case(StatusCode::CONFLICT, "Rejected")]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, "Rejected")]
    fn test_status_error_kind(#[case] status: StatusCode, #[case] kind: &str) {
        let err = status_error(status, "{}");
        let actual = match err {
            StoreError::Unauthorized => "Unauthorized",
            StoreError::Rejected(_) => "Rejected",
            _ => "other",
        };
        assert_eq!(actual, kind);
    }

    #[test]
    fn test_rejection_carries_status_and_body() {
        match status_error(StatusCode::CONFLICT, "  duplicate key\n") {
            StoreError::Rejected(msg) => assert_eq!(msg, "HTTP 409 Conflict: duplicate key"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_results() {
        assert!(matches!(check_deleted(&[]), Err(StoreError::NotFound)));
        assert!(matches!(first_created(Vec::new()), Err(StoreError::Rejected(_))));

        let row = Bookmark::new("b1", "u1", "https://go.dev", "Go", Utc::now());
        assert!(check_deleted(std::slice::from_ref(&row)).is_ok());
        assert_eq!(first_created(vec![row.clone()]).unwrap(), row);
    }

    #[test]
    fn test_new_rejects_missing_config() {
        let config = RemoteConfig::default();
        assert!(matches!(
            RestStore::new(&config, &Session::new("u1")),
            Err(SyncError::Config(_))
        ));
    }
}
