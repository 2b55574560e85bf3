pub mod direct;
pub mod error;
pub mod options;
pub mod request;
pub mod response;
pub mod service;
pub mod shared_data;

pub use direct::{HttpDirect, TransportCall};
pub use error::{InterceptorError, InterceptorResult};
pub use options::RequestOptions;
pub use request::InterceptorRequest;
pub use response::InterceptorResponse;
pub use service::InterceptorService;
pub use shared_data::SharedData;
