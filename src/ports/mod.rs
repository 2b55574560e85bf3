pub mod http_client;
pub mod interceptor;
pub mod response_transformer;

pub use http_client::{HttpClient, HttpClientError, HttpClientResult, HttpResponse};
pub use interceptor::{HookResult, Interceptor};
pub use response_transformer::ResponseTransformer;
