//! HTTP client for the commune data API

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::CommuneApi;
use crate::error::{AccessError, Result};
use crate::list::List;
use crate::membership::Membership;
use crate::role::Role;
use crate::session::Session;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the data API (e.g., "http://localhost:5000")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Membership status body returned by the data API
#[derive(Debug, Deserialize)]
struct MembershipResponse {
    #[serde(default)]
    role: Option<String>,
}

/// reqwest-backed [`CommuneApi`]
///
/// # Example
///
/// ```rust,no_run
/// use commune_access::api::{ApiConfig, CommuneApi, HttpCommuneApi};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = HttpCommuneApi::new(ApiConfig {
///     base_url: "http://localhost:5000".into(),
///     ..Default::default()
/// })?;
///
/// let lists = api.fetch_lists("12", None).await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpCommuneApi {
    config: ApiConfig,
    client: Client,
}

impl HttpCommuneApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/commune{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// GET with the session's bearer token, if there is a session
    fn get(&self, url: &str, session: Option<&Session>) -> RequestBuilder {
        let request = self.client.get(url);
        match session {
            Some(session) => request.header(header::AUTHORIZATION, session.bearer()),
            None => request,
        }
    }

    fn membership_from(
        commune_id: &str,
        session: &Session,
        body: MembershipResponse,
    ) -> Result<Option<Membership>> {
        let Some(name) = body.role else {
            return Ok(None);
        };
        let role = Role::parse(&name)
            .ok_or_else(|| AccessError::MembershipFetchFailed(format!("unknown role '{}'", name)))?;

        Ok(Some(Membership {
            user_id: session.user_id.clone(),
            commune_id: commune_id.to_string(),
            role,
        }))
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AccessError::Server {
                status,
                message: body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }
}

#[async_trait]
impl CommuneApi for HttpCommuneApi {
    async fn fetch_membership(
        &self,
        commune_id: &str,
        session: &Session,
    ) -> Result<Option<Membership>> {
        let url = self.url(&format!(
            "/membership/{}/{}",
            urlencoding::encode(commune_id),
            urlencoding::encode(&session.user_id)
        ));
        debug!(commune_id = commune_id, "Fetching membership");

        let response = self.get(&url, Some(session)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: MembershipResponse = self.handle_response(response).await?;
        Self::membership_from(commune_id, session, body)
    }

    async fn fetch_lists(&self, commune_id: &str, session: Option<&Session>) -> Result<Vec<List>> {
        let url = self.url(&format!("/{}/lists", urlencoding::encode(commune_id)));
        debug!(commune_id = commune_id, "Fetching lists");

        let response = self.get(&url, session).send().await?;
        self.handle_response(response).await
    }

    async fn fetch_list(&self, list_id: &str, session: Option<&Session>) -> Result<List> {
        let url = self.url(&format!("/list/{}", urlencoding::encode(list_id)));

        let response = self.get(&url, session).send().await?;
        self.handle_response(response).await
    }

    async fn join_commune(&self, commune_id: &str, session: &Session) -> Result<Membership> {
        let url = self.url(&format!("/membership/{}/join", urlencoding::encode(commune_id)));

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, session.bearer())
            .send()
            .await?;

        let body: MembershipResponse = self.handle_response(response).await?;
        // A bare acknowledgement means the user joined as a plain member
        let membership = Self::membership_from(commune_id, session, body)?.unwrap_or(Membership {
            user_id: session.user_id.clone(),
            commune_id: commune_id.to_string(),
            role: Role::Member,
        });
        Ok(membership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api_for(server: &MockServer) -> HttpCommuneApi {
        HttpCommuneApi::new(ApiConfig {
            base_url: format!("{}/", server.uri()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_membership_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/commune/membership/c1/u1"))
            .and(header_eq("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"role": "moderator"})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let membership = api
            .fetch_membership("c1", &Session::new("u1", "tok"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(membership.role, Role::Moderator);
        assert_eq!(membership.commune_id, "c1");
        assert_eq!(membership.user_id, "u1");
    }

    #[tokio::test]
    async fn test_fetch_membership_not_joined() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/commune/membership/c1/u1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/commune/membership/c2/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"role": null})))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let session = Session::new("u1", "tok");
        assert!(api.fetch_membership("c1", &session).await.unwrap().is_none());
        assert!(api.fetch_membership("c2", &session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_server_variant() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/commune/membership/c1/u1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let err = api
            .fetch_membership("c1", &Session::new("u1", "tok"))
            .await
            .unwrap_err();

        match err {
            AccessError::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "db down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_role_is_a_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/commune/membership/c1/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"role": "overlord"})))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let err = api
            .fetch_membership("c1", &Session::new("u1", "tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::MembershipFetchFailed(_)));
    }

    #[tokio::test]
    async fn test_fetch_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/commune/c1/lists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "metaData": {"post_id": 3, "title": "Seeds"},
                "columns": [{"attribute_name": "seed", "attribute_type": "text"}],
                "rows": [{"seed": "kale, chard"}]
            }])))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let lists = api.fetch_lists("c1", None).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].meta.post_id, "3");
        assert_eq!(lists[0].columns[0].attribute_name, "seed");
    }

    #[tokio::test]
    async fn test_list_requests_carry_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/commune/c1/lists"))
            .and(header_eq("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/commune/list/3"))
            .and(header_eq("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metaData": {"post_id": 3, "title": "Seeds"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let session = Session::new("u1", "tok");
        assert!(api.fetch_lists("c1", Some(&session)).await.unwrap().is_empty());
        let list = api.fetch_list("3", Some(&session)).await.unwrap();
        assert_eq!(list.meta.title, "Seeds");
    }

    #[tokio::test]
    async fn test_join_defaults_to_member() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/commune/membership/c1/join"))
            .and(header_eq("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "joined"})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let membership = api.join_commune("c1", &Session::new("u1", "tok")).await.unwrap();
        assert_eq!(membership.role, Role::Member);
    }
}
