//! Ngcore Config provides a registry of typed configs that can be injected through `ngcore-di`.
//!
//! It is split into two parts:
//! 1. [`ConfigProvider`](provider::ConfigProvider): the registry, one config per type
//! 2. [`Config<T>`](config::Config): the shared handle classes receive
//!
//! # Examples
//!
//! ```rust
//! use ngcore_config::provider::ConfigProvider;
//!
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! let mut config_provider = ConfigProvider::new();
//! config_provider
//!     .add_config(AppConfig {
//!         host: "localhost".to_string(),
//!         port: 8080,
//!     })
//!     .unwrap();
//!
//! let config = config_provider.get_config::<AppConfig>().unwrap();
//! assert_eq!(config.host, "localhost");
//! assert_eq!(config.port, 8080);
//! ```

pub mod config;
pub mod errors;
pub mod provider;

pub use config::Config;
pub use errors::ConfigError;
pub use provider::ConfigProvider;
