use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub enum Auth {
    Basic { username: String, password: String },
    Token(String),
}

/// Thin JSON client over one base URL, shared by the Bitbucket and Gitea
/// bindings. Errors are returned as plain messages and mapped to the crate's
/// error taxonomy by the caller, which knows whether it was reading or writing.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

/// Outcome of a request that reached the server.
pub struct ApiResponse {
    pub status: StatusCode,
    response: Response,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<MessageBody>,
}

pub fn build_client(skip_verify: bool) -> Result<Client, String> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .danger_accept_invalid_certs(skip_verify)
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))
}

impl ApiClient {
    pub fn new(base_url: &str, auth: Auth, skip_verify: bool) -> Result<Self, String> {
        Ok(Self {
            client: build_client(skip_verify)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::Token(token) => {
                builder.header(reqwest::header::AUTHORIZATION, format!("token {token}"))
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, String> {
        let builder = self.client.get(self.url(path));
        self.send("GET", path, builder).await
    }

    pub async fn get_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, String> {
        let builder = self.client.get(self.url(path)).query(query);
        self.send("GET", path, builder).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse, String> {
        let builder = self.client.post(self.url(path)).json(body);
        self.send("POST", path, builder).await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse, String> {
        let builder = self.client.put(self.url(path)).json(body);
        self.send("PUT", path, builder).await
    }

    pub async fn put_empty(&self, path: &str) -> Result<ApiResponse, String> {
        let builder = self.client.put(self.url(path));
        self.send("PUT", path, builder).await
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<ApiResponse, String> {
        tracing::trace!(method, path, "sending request");
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| format!("{method} {path}: {e}"))?;
        Ok(ApiResponse {
            status: response.status(),
            response,
        })
    }
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T, String> {
        self.response
            .json()
            .await
            .map_err(|e| format!("invalid response body: {e}"))
    }

    /// Reads the error message out of a failed response. Gitea sends
    /// `{"message": ..}`, Bitbucket sends `{"errors": [{"message": ..}]}`.
    pub async fn error_message(self) -> String {
        let status = self.status;
        let text = self.response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<MessageBody>(&text)
            .ok()
            .and_then(|body| {
                body.message.or_else(|| {
                    let messages: Vec<String> =
                        body.errors.into_iter().filter_map(|e| e.message).collect();
                    (!messages.is_empty()).then(|| messages.join("; "))
                })
            })
            .unwrap_or(text);

        if detail.trim().is_empty() {
            status.to_string()
        } else {
            format!("{status}: {}", detail.trim())
        }
    }
}

/// Percent-encodes a single path segment.
#[must_use]
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
