//! Request-scoped execution context and the credential carried on it.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::extractor::Credential;

/// Errors raised when a handler needs a credential the request did not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credential bound anywhere on the context chain.
    MissingCredential,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => write!(
                f,
                "Authentication required: send an `Authorization: Bearer <token>` header"
            ),
        }
    }
}

impl std::error::Error for AuthError {}

struct Node {
    parent: Option<Arc<Node>>,
    key: TypeId,
    value: Box<dyn Any + Send + Sync>,
}

/// Per-request execution context.
///
/// A context is an immutable chain of typed values plus a cancellation
/// token. Deriving a child never changes the parent, and a lookup walks
/// from the newest binding back to the root, so a value bound closer to
/// the handler shadows one bound further out. Contexts are cheap to clone
/// and are dropped with the request that created them.
#[derive(Clone)]
pub struct Context {
    head: Option<Arc<Node>>,
    cancel: CancellationToken,
}

impl Context {
    /// An empty root context.
    pub fn background() -> Self {
        Self {
            head: None,
            cancel: CancellationToken::new(),
        }
    }

    /// A root context cancelled together with `token`.
    pub fn with_cancellation(token: &CancellationToken) -> Self {
        Self {
            head: None,
            cancel: token.child_token(),
        }
    }

    /// Derive a child context carrying `value`.
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(Node {
                parent: self.head.clone(),
                key: TypeId::of::<T>(),
                value: Box::new(value),
            })),
            cancel: self.cancel.child_token(),
        }
    }

    /// Nearest value of type `T` on the chain.
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        let key = TypeId::of::<T>();
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            if current.key == key {
                return current.value.downcast_ref::<T>();
            }
            node = current.parent.as_deref();
        }
        None
    }

    /// Cancellation token for work done on behalf of this request.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("authenticated", &retrieve(self).is_ok())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// Private key type: nothing outside this module can name it, so nothing else
// can read or shadow the credential binding.
struct CredentialKey(Credential);

/// Derive a context carrying `credential`.
pub fn attach(ctx: &Context, credential: Credential) -> Context {
    ctx.with_value(CredentialKey(credential))
}

/// The credential bound on `ctx` or any of its ancestors.
pub fn retrieve(ctx: &Context) -> Result<&Credential, AuthError> {
    ctx.value::<CredentialKey>()
        .map(|key| &key.0)
        .ok_or(AuthError::MissingCredential)
}
