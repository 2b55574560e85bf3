pub mod factory;
pub mod http_client;
pub mod interceptors;
pub mod retry;

/// Re-export commonly used types from adapters
pub use factory::build_interceptor_service;
pub use http_client::HttpClientAdapter;
pub use interceptors::*;
pub use retry::RetryTransformer;
