//! Credential extraction and request-scoped propagation.
//!
//! The HTTP layer turns the `Authorization` header into a [`Credential`] and
//! binds it to a [`Context`] before any MCP handler runs. Handlers only ever
//! see the context:
//!
//! ```ignore
//! let ctx = context_from_headers(&parts.headers, &request_ct);
//! let client = clients::rest_client(&ctx)?; // AuthError::MissingCredential when absent
//! ```
//!
//! ## Security Model
//!
//! - Only structural parsing happens here; tokens are not validated
//! - A credential lives on exactly one request's context and is never shared
//! - Credentials are never logged; `Debug` output is redacted

mod context;
mod extractor;

use http::HeaderMap;
use tokio_util::sync::CancellationToken;

pub use context::{AuthError, Context, attach, retrieve};
pub use extractor::{BEARER_PREFIX, Credential, credential_from_headers, extract_bearer};

/// Build the execution context for one inbound request.
///
/// The context is cancelled with `cancel`; a credential is attached when
/// the headers carry a usable bearer token.
pub fn context_from_headers(headers: &HeaderMap, cancel: &CancellationToken) -> Context {
    let ctx = Context::with_cancellation(cancel);
    match credential_from_headers(headers) {
        Some(credential) => attach(&ctx, credential),
        None => ctx,
    }
}
