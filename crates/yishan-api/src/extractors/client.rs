//! Client metadata extractor
//!
//! Captures the caller's address and user agent so they can be stored with
//! each issued token pair.

use std::net::{IpAddr, SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use axum_extra::{headers::UserAgent, TypedHeader};
use yishan_service::dto::ClientMeta;

/// Never rejects; unknown values are left empty
#[derive(Debug, Clone, Default)]
pub struct ClientInfo(pub ClientMeta);

/// First hop of `x-forwarded-for`, then `x-real-ip`. Values that do not
/// parse as an IP address are ignored.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    from_header("x-forwarded-for").or_else(|| from_header("x-real-ip"))
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ip = forwarded_ip(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .map(|ip| ip.to_string());

        let user_agent = TypedHeader::<UserAgent>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(agent)| agent.as_str().to_string());

        Ok(ClientInfo(ClientMeta::new(ip, user_agent)))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header::USER_AGENT, Request};

    use super::*;

    async fn extract(request: Request<()>) -> ClientMeta {
        let (mut parts, ()) = request.into_parts();
        let ClientInfo(meta) = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        meta
    }

    #[tokio::test]
    async fn test_forwarded_for_wins() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .header(USER_AGENT, "curl/8.4.0")
            .body(())
            .unwrap();

        let meta = extract(request).await;
        assert_eq!(meta.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.4.0"));
    }

    #[tokio::test]
    async fn test_falls_back_to_connect_info() {
        let mut request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 5000))));

        let meta = extract(request).await;
        assert_eq!(meta.ip.as_deref(), Some("127.0.0.1"));
        assert!(meta.user_agent.is_none());
    }

    #[tokio::test]
    async fn test_garbage_forwarded_header_ignored() {
        let oversized = "a".repeat(300);
        let mut request = Request::builder()
            .header("x-forwarded-for", format!("{oversized}, 10.0.0.1"))
            .header("x-real-ip", "not-an-ip")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 443))));

        let meta = extract(request).await;
        assert_eq!(meta.ip.as_deref(), Some("192.0.2.9"));
    }

    #[tokio::test]
    async fn test_real_ip_used_when_forwarded_for_invalid() {
        let request = Request::builder()
            .header("x-forwarded-for", "unknown")
            .header("x-real-ip", " 2001:db8::1 ")
            .body(())
            .unwrap();

        let meta = extract(request).await;
        assert_eq!(meta.ip.as_deref(), Some("2001:db8::1"));
    }

    #[tokio::test]
    async fn test_nothing_known() {
        let meta = extract(Request::builder().body(()).unwrap()).await;
        assert_eq!(meta, ClientMeta::default());
    }
}
