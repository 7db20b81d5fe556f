//! Keeps 10 virtual users requesting the SSL demo site, one request per second each, for 50
//! minutes.
use gust::prelude::*;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const TARGET_URL: &str = "https://ssl-demo.kasunrajapakse.xyz";
const PAUSE: Duration = Duration::from_secs(1);

fn options() -> Options {
    Options {
        vus: Some(10),
        duration: Some(Duration::from_secs(3000)),
        // iterations: Some(40),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gust=info,ssl_demo=info")),
        )
        .init();

    if let Ok(addr) = std::env::var("GUST_PROMETHEUS_ADDR") {
        let addr: SocketAddr = addr.parse()?;
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("Serving metrics on http://{addr}/metrics");
    }

    let stats = ssl_demo().options(options()).with_args().await;
    println!("\n{stats}");

    Ok(())
}

#[scenario]
async fn ssl_demo() {
    let _ = gust::http::get(TARGET_URL).await;
    tokio::time::sleep(PAUSE).await;
}
