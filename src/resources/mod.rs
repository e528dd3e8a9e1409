//! Repository content resources.
//!
//! Files and directories of a repository are exposed through one resource
//! template, `repo://{owner}/{repo}/contents{/path*}`. Reads go through the
//! REST client of the request's credential, so an anonymous read fails with
//! [`AuthError::MissingCredential`] before anything is sent.

use std::fmt;

use base64::Engine;
use rmcp::model::{
    AnnotateAble, RawResourceTemplate, ReadResourceResult, ResourceContents, ResourceTemplate,
};
use serde_json::Value;

use crate::auth::{AuthError, Context};
use crate::clients::{ClientError, ClientProvider};
use crate::translations::Translations;

/// URI template for repository files and directories.
pub const REPO_CONTENTS_TEMPLATE: &str = "repo://{owner}/{repo}/contents{/path*}";

const SCHEME: &str = "repo://";
const DIRECTORY_MIME_TYPE: &str = "text/directory";
const BINARY_MIME_TYPE: &str = "application/octet-stream";

/// Error types for resource reads.
#[derive(Debug)]
pub enum ResourceError {
    /// The URI does not match any template
    InvalidUri(String),
    /// GitHub has nothing at the URI
    NotFound(String),
    /// The request carries no credential
    Auth(AuthError),
    /// The API call failed
    Api(ClientError),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUri(uri) => write!(f, "Invalid URI: {}", uri),
            Self::NotFound(uri) => write!(f, "Resource not found: {}", uri),
            Self::Auth(e) => write!(f, "{}", e),
            Self::Api(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ResourceError {}

impl From<AuthError> for ResourceError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

/// A parsed `repo://` contents URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContentsUri {
    pub owner: String,
    pub repo: String,
    /// Path below the repository root; empty for the root itself.
    pub path: Vec<String>,
}

impl RepoContentsUri {
    pub fn parse(uri: &str) -> Result<Self, ResourceError> {
        let invalid = || ResourceError::InvalidUri(uri.to_string());
        let rest = uri.strip_prefix(SCHEME).ok_or_else(invalid)?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let mut parts = rest.split('/');
        let owner = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let repo = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        if parts.next() != Some("contents") {
            return Err(invalid());
        }

        let path: Vec<String> = parts.map(str::to_string).collect();
        if path
            .iter()
            .any(|s| s.is_empty() || s == "." || s == "..")
        {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path,
        })
    }

    /// REST path segments of the contents endpoint for this URI.
    pub fn segments(&self) -> Vec<&str> {
        let mut segments = vec!["repos", self.owner.as_str(), self.repo.as_str(), "contents"];
        segments.extend(self.path.iter().map(String::as_str));
        segments
    }
}

/// Resource templates and reads backed by the repository contents API.
#[derive(Debug, Clone)]
pub struct RepositoryResources {
    clients: ClientProvider,
    description: String,
}

impl RepositoryResources {
    pub fn new(clients: ClientProvider, t: &Translations) -> Self {
        Self {
            clients,
            description: t.get(
                "RESOURCE_REPOSITORY_CONTENT_DESCRIPTION",
                "Repository content: a file or the listing of a directory",
            ),
        }
    }

    pub fn templates(&self) -> Vec<ResourceTemplate> {
        vec![
            RawResourceTemplate {
                uri_template: REPO_CONTENTS_TEMPLATE.to_string(),
                name: "repository_content".to_string(),
                title: Some("Repository Content".to_string()),
                description: Some(self.description.clone()),
                mime_type: None,
                icons: None,
            }
            .no_annotation(),
        ]
    }

    /// Read the file or directory `uri` names, as the request's user.
    pub async fn read(&self, ctx: &Context, uri: &str) -> Result<ReadResourceResult, ResourceError> {
        let target = RepoContentsUri::parse(uri)?;
        let client = self.clients.rest(ctx)?;

        let body: Value = match client.get(&target.segments()).await {
            Ok(body) => body,
            Err(ClientError::Status { status: 404, .. }) => {
                return Err(ResourceError::NotFound(uri.to_string()));
            }
            Err(e) => return Err(ResourceError::Api(e)),
        };

        let contents = contents_from(uri, &body)?;
        Ok(ReadResourceResult { contents })
    }
}

/// Convert a contents API body into resource contents.
///
/// A directory lists one entry per child. A file is returned as text when it
/// decodes as UTF-8 and as a base64 blob otherwise.
pub fn contents_from(uri: &str, body: &Value) -> Result<Vec<ResourceContents>, ResourceError> {
    if let Some(entries) = body.as_array() {
        let base = uri.strip_suffix('/').unwrap_or(uri);
        return Ok(entries
            .iter()
            .filter_map(|entry| entry.get("name")?.as_str())
            .map(|name| ResourceContents::TextResourceContents {
                uri: format!("{}/{}", base, name),
                mime_type: Some(DIRECTORY_MIME_TYPE.to_string()),
                text: name.to_string(),
                meta: None,
            })
            .collect());
    }

    let encoded = match (
        body.get("encoding").and_then(Value::as_str),
        body.get("content").and_then(Value::as_str),
    ) {
        (Some("base64"), Some(content)) => content,
        _ => return Err(ResourceError::NotFound(uri.to_string())),
    };

    // GitHub wraps the encoded content at 60 columns.
    let cleaned: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&cleaned)
        .map_err(|e| ResourceError::Api(ClientError::Decode(e.to_string())))?;

    let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
    let content = match String::from_utf8(bytes) {
        Ok(text) => ResourceContents::TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some(text_mime_type(name).to_string()),
            text,
            meta: None,
        },
        Err(_) => ResourceContents::BlobResourceContents {
            uri: uri.to_string(),
            mime_type: Some(BINARY_MIME_TYPE.to_string()),
            blob: cleaned,
            meta: None,
        },
    };
    Ok(vec![content])
}

fn text_mime_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "md" || ext == "markdown" => "text/markdown",
        Some(ext) if ext == "json" => "application/json",
        Some(ext) if ext == "yaml" || ext == "yml" => "application/yaml",
        Some(ext) if ext == "html" || ext == "htm" => "text/html",
        _ => "text/plain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URI: &str = "repo://octo/hello/contents/docs/README.md";

    #[test]
    fn test_parse_file_uri() {
        let parsed = RepoContentsUri::parse(URI).unwrap();
        assert_eq!(parsed.owner, "octo");
        assert_eq!(parsed.repo, "hello");
        assert_eq!(parsed.path, vec!["docs", "README.md"]);
        assert_eq!(
            parsed.segments(),
            vec!["repos", "octo", "hello", "contents", "docs", "README.md"]
        );
    }

    #[test]
    fn test_parse_repository_root() {
        let parsed = RepoContentsUri::parse("repo://octo/hello/contents").unwrap();
        assert!(parsed.path.is_empty());
        assert_eq!(
            RepoContentsUri::parse("repo://octo/hello/contents/").unwrap(),
            parsed
        );
    }

    #[test]
    fn test_parse_rejects_other_uris() {
        for uri in [
            "file:///etc/passwd",
            "repo://octo",
            "repo://octo/hello",
            "repo://octo/hello/issues/1",
            "repo:///hello/contents",
            "repo://octo/hello/contents/../../user",
            "repo://octo/hello/contents/a//b",
        ] {
            assert!(
                matches!(RepoContentsUri::parse(uri), Err(ResourceError::InvalidUri(_))),
                "{} should be rejected",
                uri
            );
        }
    }

    #[tokio::test]
    async fn test_read_without_credential() {
        let resources = RepositoryResources::new(ClientProvider::default(), &Translations::default());
        let err = resources.read(&Context::background(), URI).await.unwrap_err();
        assert!(matches!(err, ResourceError::Auth(AuthError::MissingCredential)));
        assert!(err.to_string().starts_with("Authentication required"));
    }

    #[tokio::test]
    async fn test_invalid_uri_checked_before_credential() {
        let resources = RepositoryResources::new(ClientProvider::default(), &Translations::default());
        let err = resources
            .read(&Context::background(), "repo://octo")
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidUri(_)));
    }

    #[test]
    fn test_template_uses_translated_description() {
        let t = Translations::from_vars(vec![(
            "GITHUB_MCP_RESOURCE_REPOSITORY_CONTENT_DESCRIPTION".to_string(),
            "Files".to_string(),
        )]);
        let templates = RepositoryResources::new(ClientProvider::default(), &t).templates();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].raw.uri_template, REPO_CONTENTS_TEMPLATE);
        assert_eq!(templates[0].raw.description.as_deref(), Some("Files"));
    }

    #[test]
    fn test_directory_lists_entries() {
        let body = json!([
            {"name": "README.md", "type": "file"},
            {"name": "src", "type": "dir"},
        ]);
        let contents = contents_from("repo://octo/hello/contents/", &body).unwrap();
        assert_eq!(contents.len(), 2);
        match &contents[1] {
            ResourceContents::TextResourceContents {
                uri, mime_type, text, ..
            } => {
                assert_eq!(uri, "repo://octo/hello/contents/src");
                assert_eq!(mime_type.as_deref(), Some(DIRECTORY_MIME_TYPE));
                assert_eq!(text, "src");
            }
            other => panic!("unexpected contents: {:?}", other),
        }
    }

    #[test]
    fn test_text_file_is_decoded() {
        // "# Hello\n" wrapped the way the API wraps it
        let body = json!({
            "name": "README.md",
            "encoding": "base64",
            "content": "IyBI\nZWxsbwo=\n",
        });
        let contents = contents_from(URI, &body).unwrap();
        match &contents[0] {
            ResourceContents::TextResourceContents {
                uri, mime_type, text, ..
            } => {
                assert_eq!(uri, URI);
                assert_eq!(mime_type.as_deref(), Some("text/markdown"));
                assert_eq!(text, "# Hello\n");
            }
            other => panic!("unexpected contents: {:?}", other),
        }
    }

    #[test]
    fn test_binary_file_is_blob() {
        let body = json!({
            "name": "logo.png",
            "encoding": "base64",
            "content": "iVBO\nRw0K\n",
        });
        let contents = contents_from(URI, &body).unwrap();
        match &contents[0] {
            ResourceContents::BlobResourceContents { mime_type, blob, .. } => {
                assert_eq!(mime_type.as_deref(), Some(BINARY_MIME_TYPE));
                assert_eq!(blob, "iVBORw0K");
            }
            other => panic!("unexpected contents: {:?}", other),
        }
    }

    #[test]
    fn test_symlink_or_submodule_is_not_found() {
        let body = json!({"name": "vendor", "type": "submodule"});
        assert!(matches!(
            contents_from(URI, &body),
            Err(ResourceError::NotFound(_))
        ));
    }
}
