use std::time::Duration;

use cached::proc_macro::cached;
use config::{Config, Environment, File, FileFormat};
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;

static CONFIG_BUILDER: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new({
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../Safe.toml"),
            FileFormat::Toml,
        ));

        if std::path::Path::new("Safe.toml").exists() {
            builder = builder.add_source(File::new("Safe.toml", FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("SAFE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build().expect("default configuration is valid")
    })
});

#[derive(Deserialize, Debug, Clone)]
pub struct Gateway {
    pub url: String,
    pub timeout: u64,
    pub connect_timeout: u64,
}

impl Gateway {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Overviews {
    pub trusted: bool,
    pub exclude_spam: bool,
    pub max_batch_size: usize,
    pub flush_delay_ms: u64,
}

impl Overviews {
    /// Zero disables the cap
    pub fn max_batch_size(&self) -> Option<usize> {
        (self.max_batch_size > 0).then_some(self.max_batch_size)
    }

    /// Zero means flush on the next scheduler tick
    pub fn flush_delay(&self) -> Option<Duration> {
        (self.flush_delay_ms > 0).then(|| Duration::from_millis(self.flush_delay_ms))
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub gateway: Gateway,
    pub overviews: Overviews,
}

pub async fn init() {
    println!(
        ":: Safe Overviews Configuration ::\n\x1b[32m{:?}\x1b[0m",
        config().await
    );
}

pub async fn read() -> Config {
    CONFIG_BUILDER.read().await.clone()
}

#[cached(time = 30)]
pub async fn config() -> Settings {
    read()
        .await
        .try_deserialize::<Settings>()
        .expect("configuration matches Settings")
}

/// Configure logging and common Rust variables
pub fn setup_logging() {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    if pretty_env_logger::try_init().is_err() {
        log::debug!("Logger was already initialised.");
    }
}

#[cfg(test)]
mod tests {
    use crate::{config, init};

    #[tokio::test]
    async fn it_works() {
        init().await;
    }

    #[tokio::test]
    async fn loads_overview_defaults() {
        let settings = config().await;
        assert_eq!(settings.overviews.max_batch_size(), Some(10));
        assert!(settings.overviews.exclude_spam);
        assert!(settings.gateway.timeout().as_secs() > 0);
        assert!(settings.gateway.connect_timeout() <= settings.gateway.timeout());
    }

    #[test]
    fn logging_can_be_set_up_twice() {
        crate::setup_logging();
        crate::setup_logging();
        assert!(std::env::var("RUST_LOG").is_ok());
    }

    #[test]
    fn zero_values_disable_knobs() {
        let overviews = crate::Overviews {
            trusted: false,
            exclude_spam: true,
            max_batch_size: 0,
            flush_delay_ms: 0,
        };

        assert_eq!(overviews.max_batch_size(), None);
        assert_eq!(overviews.flush_delay(), None);
    }
}
