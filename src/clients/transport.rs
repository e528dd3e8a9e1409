//! HTTP transport for outbound API calls and the bearer-auth decorator.
//!
//! A transport is any `tower::Service<http::Request<Bytes>>` that answers
//! with an `http::Response<Bytes>`. Middleware is a `tower::Layer`, so
//! decorators compose as `Transport -> Transport`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::{HeaderValue, Request, Response};
use tower::{Layer, Service};

use crate::auth::Credential;

/// Boxed error type shared by every transport in the stack.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Base transport backed by a `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Service<Request<Bytes>> for HttpTransport {
    type Response = Response<Bytes>;
    type Error = BoxError;
    type Future = BoxFuture<Result<Response<Bytes>, BoxError>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let req = reqwest::Request::try_from(req)?;
            let resp = client.execute(req).await?;

            let mut builder = Response::builder()
                .status(resp.status())
                .version(resp.version());
            if let Some(headers) = builder.headers_mut() {
                *headers = resp.headers().clone();
            }
            let body = resp.bytes().await?;
            Ok(builder.body(body)?)
        })
    }
}

/// Layer producing [`BearerAuth`] for a fixed credential.
#[derive(Clone)]
pub struct BearerAuthLayer {
    header: HeaderValue,
}

impl BearerAuthLayer {
    pub fn new(credential: &Credential) -> Self {
        Self {
            header: credential.bearer_header(),
        }
    }
}

impl fmt::Debug for BearerAuthLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuth {
            inner,
            header: self.header.clone(),
        }
    }
}

/// Decorator that presents a bearer credential on every outbound request.
///
/// The request handed to `call` is cloned and the header is set on the
/// clone only. The header value is fixed at construction, so clones of this
/// service can be driven concurrently.
#[derive(Clone)]
pub struct BearerAuth<S> {
    inner: S,
    header: HeaderValue,
}

impl<S> BearerAuth<S> {
    /// Clone `req` with the `Authorization` header replaced.
    pub fn authorize(&self, req: &Request<Bytes>) -> Request<Bytes> {
        let mut out = Request::new(req.body().clone());
        *out.method_mut() = req.method().clone();
        *out.uri_mut() = req.uri().clone();
        *out.version_mut() = req.version();
        *out.headers_mut() = req.headers().clone();
        out.headers_mut().insert(AUTHORIZATION, self.header.clone());
        out
    }
}

impl<S: fmt::Debug> fmt::Debug for BearerAuth<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S> Service<Request<Bytes>> for BearerAuth<S>
where
    S: Service<Request<Bytes>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let authorized = self.authorize(&req);
        self.inner.call(authorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::time::Duration;
    use tower::{ServiceBuilder, ServiceExt};

    fn cred(s: &str) -> Credential {
        Credential::new(s).unwrap()
    }

    /// Answers with the `Authorization` header it received as the body.
    #[derive(Clone)]
    struct EchoAuth;

    impl Service<Request<Bytes>> for EchoAuth {
        type Response = Response<Bytes>;
        type Error = Infallible;
        type Future = BoxFuture<Result<Response<Bytes>, Infallible>>;

        fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Bytes>) -> Self::Future {
            Box::pin(async move {
                // Yield so concurrent calls interleave.
                tokio::time::sleep(Duration::from_millis(1)).await;
                let auth = req
                    .headers()
                    .get(AUTHORIZATION)
                    .map(|v| Bytes::copy_from_slice(v.as_bytes()))
                    .unwrap_or_default();
                Ok(Response::new(auth))
            })
        }
    }

    fn echo_auth() -> EchoAuth {
        EchoAuth
    }

    #[tokio::test]
    async fn test_sets_bearer_header() {
        let svc = ServiceBuilder::new()
            .layer(BearerAuthLayer::new(&cred("abc123")))
            .service(echo_auth());

        let req = Request::post("https://api.github.com/graphql")
            .body(Bytes::from_static(b"{}"))
            .unwrap();
        let resp = svc.oneshot(req).await.unwrap();
        assert_eq!(resp.body().as_ref(), b"Bearer abc123");
    }

    #[tokio::test]
    async fn test_overrides_caller_supplied_header() {
        let svc = BearerAuthLayer::new(&cred("abc123")).layer(echo_auth());

        let req = Request::get("https://api.github.com/")
            .header(AUTHORIZATION, "Bearer someone-else")
            .body(Bytes::new())
            .unwrap();
        let resp = svc.oneshot(req).await.unwrap();
        assert_eq!(resp.body().as_ref(), b"Bearer abc123");
    }

    #[test]
    fn test_authorize_leaves_original_untouched() {
        let svc = BearerAuthLayer::new(&cred("abc123")).layer(echo_auth());

        let original = Request::post("https://api.github.com/graphql")
            .header("x-trace", "1")
            .body(Bytes::from_static(b"payload"))
            .unwrap();
        let authorized = svc.authorize(&original);

        assert!(original.headers().get(AUTHORIZATION).is_none());
        assert_eq!(authorized.headers()["authorization"], "Bearer abc123");
        assert_eq!(authorized.headers()["x-trace"], "1");
        assert_eq!(authorized.method(), original.method());
        assert_eq!(authorized.uri(), original.uri());
        assert_eq!(authorized.body(), original.body());
    }

    #[test]
    fn test_header_is_marked_sensitive() {
        let svc = BearerAuthLayer::new(&cred("abc123")).layer(echo_auth());
        let req = svc.authorize(&Request::new(Bytes::new()));
        assert!(req.headers()[AUTHORIZATION].is_sensitive());
    }

    #[tokio::test]
    async fn test_concurrent_credentials_do_not_leak() {
        let a = BearerAuthLayer::new(&cred("token-a")).layer(echo_auth());
        let b = BearerAuthLayer::new(&cred("token-b")).layer(echo_auth());

        let mut handles = Vec::new();
        for i in 0..64 {
            let (svc, expected) = if i % 2 == 0 {
                (a.clone(), "Bearer token-a")
            } else {
                (b.clone(), "Bearer token-b")
            };
            handles.push(tokio::spawn(async move {
                let req = Request::post("https://api.github.com/graphql")
                    .body(Bytes::new())
                    .unwrap();
                let resp = svc.oneshot(req).await.unwrap();
                assert_eq!(resp.body().as_ref(), expected.as_bytes());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
