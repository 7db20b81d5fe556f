use mock_service::MockService;
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        FmtSubscriber::builder()
            .with_env_filter("gust=debug,mock_service=debug")
            .with_test_writer()
            .init();
    });
}

/// A fresh mock service for a single test, so hit counts are not shared.
#[allow(unused)]
pub async fn mock_service() -> MockService {
    MockService::spawn("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap()
}
