mod utils;
#[allow(unused)]
use utils::*;

use anyhow::anyhow;
use gust::prelude::*;
use std::sync::OnceLock;
use std::time::Duration;

const PAUSE: Duration = Duration::from_secs(1);

#[tokio::test]
#[ntest::timeout(10_000)]
async fn one_vu_for_three_seconds() {
    init();
    let service = mock_service().await;
    SINGLE_VU_URL.get_or_init(|| service.url("/"));

    let stats = single_vu()
        .vus(1)
        .duration(Duration::from_secs(3))
        .await;

    let hits = service.hits();
    assert!(dbg!(hits) >= 2 && hits <= 4);
    assert_eq!(stats.success_count, hits);
    assert_eq!(stats.iterations, hits);
    assert_eq!(stats.error_count, 0);
    assert_eq!(stats.interrupted_iterations, 0);
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn ten_vus_for_one_second() {
    init();
    let service = mock_service().await;
    TEN_VUS_URL.get_or_init(|| service.url("/"));

    let stats = ten_vus().vus(10).duration(Duration::from_secs(1)).await;

    assert!(dbg!(service.hits()) <= 10);
    assert_eq!(stats.vus, 10);
    assert_eq!(stats.success_count, service.hits());
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn unreachable_host_still_completes() {
    init();

    let stats = unreachable()
        .vus(2)
        .duration(Duration::from_millis(1500))
        .await;

    assert!(stats.iterations >= 2);
    assert_eq!(stats.success_count, 0);
    assert_eq!(stats.error_count, stats.iterations);
    assert_eq!(stats.interrupted_iterations, 0);
    assert!(stats.error_rate > 0.99);
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn server_errors_count_as_failures() {
    init();
    let service = mock_service().await;
    SERVER_ERROR_URL.get_or_init(|| service.url("/status/500"));

    let stats = server_error().vus(3).iterations(9).await;

    assert_eq!(service.hits(), 9);
    assert_eq!(stats.iterations, 9);
    assert_eq!(stats.error_count, 9);
    assert_eq!(stats.success_count, 0);
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn slow_responses_are_measured() {
    init();
    let service = mock_service().await;
    SLOW_URL.get_or_init(|| service.url("/delay/ms/100"));

    let stats = slow().iterations(5).await;

    assert_eq!(stats.success_count, 5);
    assert!(stats.latency_min >= Duration::from_millis(100));
    assert!(stats.latency_p50 >= Duration::from_millis(90));
    assert!(stats.latency_max < Duration::from_secs(2));
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn summary_export_from_options_file() {
    init();
    let service = mock_service().await;
    FROM_FILE_URL.get_or_init(|| service.url("/"));

    let dir = std::env::temp_dir();
    let config = dir.join(format!("gust-options-{}.json", std::process::id()));
    let summary = dir.join(format!("gust-summary-{}.json", std::process::id()));
    std::fs::write(&config, r#"{ "vus": 2, "iterations": 6 }"#).unwrap();

    let cli = gust::cli::GustCli {
        config: Some(config.clone()),
        summary_export: Some(summary.clone()),
        ..Default::default()
    };
    let stats = from_file().vus(10).with_cli(cli).await;

    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    std::fs::remove_file(&config).unwrap();
    std::fs::remove_file(&summary).unwrap();

    assert_eq!(stats.vus, 2);
    assert_eq!(stats.iterations, 6);
    assert_eq!(exported["iterations"], serde_json::json!(6));
    assert_eq!(exported["vus"], serde_json::json!(2));
}

#[cfg(feature = "integration")]
#[tokio::test]
async fn ssl_demo_host() {
    init();

    let stats = ssl_demo_once().iterations(1).await;

    assert_eq!(stats.iterations, 1);
    assert_eq!(stats.success_count, 1);
}

/* Scenario Helpers */

static SINGLE_VU_URL: OnceLock<String> = OnceLock::new();
static TEN_VUS_URL: OnceLock<String> = OnceLock::new();
static SERVER_ERROR_URL: OnceLock<String> = OnceLock::new();
static SLOW_URL: OnceLock<String> = OnceLock::new();
static FROM_FILE_URL: OnceLock<String> = OnceLock::new();

async fn get_then_pause(url: &OnceLock<String>) {
    if let Some(url) = url.get() {
        let _ = gust::http::get(url).await;
    }
    tokio::time::sleep(PAUSE).await;
}

#[scenario]
async fn single_vu() {
    get_then_pause(&SINGLE_VU_URL).await;
}

#[scenario]
async fn ten_vus() {
    get_then_pause(&TEN_VUS_URL).await;
}

#[scenario]
async fn unreachable() {
    let _ = gust::http::get("http://127.0.0.1:1/").await;
    tokio::time::sleep(PAUSE).await;
}

#[scenario]
async fn server_error() {
    if let Some(url) = SERVER_ERROR_URL.get() {
        let _ = gust::http::get(url).await;
    }
}

#[scenario]
async fn slow() {
    if let Some(url) = SLOW_URL.get() {
        let _ = slow_call(url).await;
    }
}

#[transaction]
async fn slow_call(url: &str) -> anyhow::Result<()> {
    let res = gust::http::client().get(url).send().await?;
    if res.status().is_server_error() {
        Err(anyhow!("Server error: {}", res.status()))
    } else {
        res.bytes().await?;
        Ok(())
    }
}

#[scenario]
async fn from_file() {
    if let Some(url) = FROM_FILE_URL.get() {
        let _ = gust::http::get(url).await;
    }
}

#[cfg(feature = "integration")]
#[scenario]
async fn ssl_demo_once() {
    let _ = gust::http::get("https://ssl-demo.kasunrajapakse.xyz").await;
}
