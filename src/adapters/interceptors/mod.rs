//! Ready-made interceptors wired by [`build_interceptor_service`](crate::adapters::factory::build_interceptor_service).
//!
//! Each one is an ordinary [`Interceptor`](crate::ports::Interceptor)
//! implementation; the engine has no special knowledge of them.
pub mod headers;
pub mod request_id;
pub mod status;
pub mod stub;
pub mod timing;

pub use headers::HeadersInterceptor;
pub use request_id::{REQUEST_ID_KEY, RequestIdInterceptor};
pub use status::StatusErrorInterceptor;
pub use stub::{STUB_PREFIX_KEY, StubInterceptor};
pub use timing::{TIMING_ELAPSED_KEY, TIMING_STARTED_AT_KEY, TimingInterceptor};
