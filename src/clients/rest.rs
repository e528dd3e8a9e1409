//! GitHub REST client bound to one credential.

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Credential;
use crate::clients::{ClientError, USER_AGENT};

/// Fixed REST API host.
pub const REST_API_URL: &str = "https://api.github.com/";

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// REST client that authenticates every call with its credential.
///
/// The credential is set once at construction and cannot be changed.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    credential: Credential,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &REST_API_URL)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    pub(crate) fn new(credential: Credential) -> Self {
        Self {
            http: reqwest::Client::new(),
            credential,
        }
    }

    /// Start a request to the API path made of `segments`, with the
    /// credential and GitHub headers already applied.
    ///
    /// Each segment is percent-encoded on its own, so a value such as
    /// `a/b` or `x?y` stays inside its segment.
    pub fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = api_url(segments)?;

        Ok(self
            .http
            .request(method, url)
            .bearer_auth(self.credential.expose())
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    /// `GET` the path and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let builder = self.request(Method::GET, segments)?;
        send_json(builder).await
    }

    /// `POST` a JSON body to the path and decode the JSON response.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError> {
        let builder = self.request(Method::POST, segments)?.json(body);
        send_json(builder).await
    }
}

fn api_url(segments: &[&str]) -> Result<Url, ClientError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(ClientError::InvalidRequest(format!(
            "invalid path segment `{}`",
            bad
        )));
    }

    let mut url = Url::parse(REST_API_URL)
        .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| ClientError::InvalidRequest("API URL cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
    let resp = builder.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.json::<T>().await?)
}
