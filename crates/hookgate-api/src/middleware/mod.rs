//! Request middleware: request ids, security headers, rate limiting and
//! in-flight tracking.

pub mod connections;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use connections::track_connections;
pub use rate_limit::enforce_rate_limit;
pub use request_id::{inject_request_id, RequestId, REQUEST_ID_HEADER};
pub use security_headers::security_headers;
