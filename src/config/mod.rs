mod loader;
mod store;
mod types;

pub use loader::ConfigError;
pub use store::ConfigStore;
pub use types::{
    ApiConfig, CacheConfig, Config, DocumentsConfig, SessionConfig, DISPLAY_NAME_KEY,
};
