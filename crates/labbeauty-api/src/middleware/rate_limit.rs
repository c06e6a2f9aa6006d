use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Clients idle for longer than this are forgotten.
const IDLE_EVICTION: Duration = Duration::from_secs(180);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn full(burst: u32, now: Instant) -> Self {
        Self {
            tokens: f64::from(burst),
            last_refill: now,
            last_seen: now,
        }
    }

    /// Take one token, or report how long until one is available.
    fn take(&mut self, rps: f64, burst: u32, now: Instant) -> Result<u32, Duration> {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rps).min(f64::from(burst));
        self.last_refill = now;
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(self.tokens.floor() as u32)
        } else {
            let wait = (1.0 - self.tokens) / rps;
            Err(Duration::from_secs_f64(wait))
        }
    }
}

struct Buckets {
    clients: HashMap<String, TokenBucket>,
    last_sweep: Instant,
}

/// Per-client token bucket limiter: `rps` tokens per second, at most `burst` saved.
pub struct HttpRateLimiter {
    buckets: Mutex<Buckets>,
    rps: f64,
    burst: u32,
    enabled: bool,
}

impl HttpRateLimiter {
    pub fn new(rps: f64, burst: u32, enabled: bool) -> Self {
        Self {
            buckets: Mutex::new(Buckets {
                clients: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            rps: if rps > 0.0 { rps } else { 1.0 },
            burst: burst.max(1),
            enabled,
        }
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Remaining tokens on success, time until the next token when limited.
    pub async fn check(&self, client: &str) -> Result<u32, Duration> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;

        if now.saturating_duration_since(buckets.last_sweep) >= SWEEP_INTERVAL {
            let before = buckets.clients.len();
            buckets
                .clients
                .retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) < IDLE_EVICTION);
            buckets.last_sweep = now;
            let evicted = before - buckets.clients.len();
            if evicted > 0 {
                tracing::debug!(evicted, "Evicted idle rate limit buckets");
            }
        }

        buckets
            .clients
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::full(self.burst, now))
            .take(self.rps, self.burst, now)
    }
}

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then the socket.
pub fn client_ip(headers: &HeaderMap, socket: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| socket.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// HTTP rate limiting middleware
///
/// Adds `X-RateLimit-Limit` and `X-RateLimit-Remaining` to responses, and
/// `Retry-After` when answering `429 Too Many Requests`.
pub async fn rate_limit_middleware(
    State(rate_limiter): State<Arc<HttpRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !rate_limiter.enabled {
        return next.run(request).await;
    }

    let socket = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), socket);
    let limit = rate_limiter.burst();

    match rate_limiter.check(&ip).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            set_limit_headers(&mut response, limit, remaining);
            response
        }
        Err(retry_in) => {
            tracing::warn!(client_ip = %ip, path = %request.uri().path(), "Rate limit exceeded");

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                axum::Json(serde_json::json!({
                    "error": "rate limit exceeded"
                })),
            )
                .into_response();
            set_limit_headers(&mut response, limit, 0);
            let retry_secs = retry_in.as_secs_f64().ceil().max(1.0) as u64;
            if let Ok(header_value) = HeaderValue::from_str(&retry_secs.to_string()) {
                response.headers_mut().insert("Retry-After", header_value);
            }
            response
        }
    }
}

fn set_limit_headers(response: &mut Response, limit: u32, remaining: u32) {
    let headers = response.headers_mut();
    if let Ok(header_value) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert("X-RateLimit-Limit", header_value);
    }
    if let Ok(header_value) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", header_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_then_limited() {
        let limiter = HttpRateLimiter::new(2.0, 4, true);
        for expected in [3, 2, 1, 0] {
            assert_eq!(limiter.check("10.0.0.1").await, Ok(expected));
        }
        let wait = limiter.check("10.0.0.1").await.unwrap_err();
        assert!(wait <= Duration::from_millis(500));

        // Other clients have their own bucket.
        assert!(limiter.check("10.0.0.2").await.is_ok());
    }

    #[test]
    fn bucket_refills_over_time() {
        let start = Instant::now();
        let mut bucket = TokenBucket::full(1, start);
        assert!(bucket.take(2.0, 1, start).is_ok());
        assert!(bucket.take(2.0, 1, start).is_err());
        assert!(bucket
            .take(2.0, 1, start + Duration::from_millis(600))
            .is_ok());
    }

    #[test]
    fn forwarded_address_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        let socket: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(socket)), "203.0.113.9");
        assert_eq!(client_ip(&HeaderMap::new(), Some(socket)), "127.0.0.1");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }
}
