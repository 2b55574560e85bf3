use async_trait::async_trait;

use crate::{
    core::{
        InterceptorService,
        direct::{HttpDirect, TransportCall},
        error::InterceptorResult,
        request::InterceptorRequest,
    },
    ports::http_client::HttpResponse,
};

/// ResponseTransformer defines the port for augmenting the raw transport call,
/// e.g. retrying it or refreshing credentials before a second attempt.
///
/// The transformer runs between the two interceptor phases. `http` and
/// `call` bypass the chain; `service` can be used to issue intercepted
/// requests of its own.
#[async_trait]
pub trait ResponseTransformer: Send + Sync + 'static {
    /// Produce the transport result for `request`, usually by sending `call`
    /// one or more times. `http` and `service` are there for side calls
    /// (fetching a token, probing an endpoint); a transformer that only
    /// resends `call` can ignore them.
    async fn transform(
        &self,
        call: TransportCall,
        request: &InterceptorRequest,
        http: &HttpDirect,
        service: &InterceptorService,
    ) -> InterceptorResult<HttpResponse>;
}
