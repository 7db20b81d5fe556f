//! A small HTTP target for exercising gust scenarios without leaving the machine.
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Number of requests the service has answered, on any route.
pub type Hits = Arc<AtomicU64>;

/// A mock service running on a background task.
pub struct MockService {
    addr: SocketAddr,
    hits: Hits,
}

impl MockService {
    /// Bind to `addr` (port 0 picks a free port) and serve on a background task.
    pub async fn spawn(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let hits = Hits::default();

        let app = router(hits.clone());
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!("Mock service stopped: {err}");
            }
        });
        debug!("Mock service listening on {addr}");

        Ok(Self { addr, hits })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

/// Serve on `addr` until the process exits, logging the request rate every second.
pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Mock service listening on {}", listener.local_addr()?);

    let hits = Hits::default();
    tokio::spawn(tps_measure_task(hits.clone()));

    axum::serve(listener, router(hits)).await?;
    Ok(())
}

fn router(hits: Hits) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/status/:code", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(hits)
}

fn record_hit(hits: &Hits) {
    metrics::counter!("mock_service_requests").increment(1);
    hits.fetch_add(1, Ordering::Relaxed);
}

#[debug_handler]
async fn root(State(hits): State<Hits>) -> &'static str {
    record_hit(&hits);
    "ok"
}

#[debug_handler]
async fn delay(State(hits): State<Hits>, Path(delay_ms): Path<u64>) {
    record_hit(&hits);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

#[debug_handler]
async fn status(State(hits): State<Hits>, Path(code): Path<u16>) -> StatusCode {
    record_hit(&hits);
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn tps_measure_task(hits: Hits) {
    let mut last = 0;
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let total = hits.load(Ordering::Relaxed);
        info!("{} TPS", total - last);
        last = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn get(url: &str) -> u16 {
        reqwest::get(url).await.unwrap().status().as_u16()
    }

    #[tokio::test]
    async fn counts_hits_on_every_route() {
        let service = MockService::spawn("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        assert_eq!(get(&service.url("/")).await, 200);
        assert_eq!(get(&service.url("/delay/ms/5")).await, 200);
        assert_eq!(get(&service.url("/status/503")).await, 503);
        assert_eq!(service.hits(), 3);
    }
}
