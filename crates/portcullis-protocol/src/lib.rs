//! portcullis-protocol: the `app://` resource server and its service routes.

mod error;
pub mod layout;
mod path_guard;
pub mod request;
pub mod response;
pub mod routes;
mod server;

pub use error::ProtocolError;
pub use layout::{default_output_root, locate_bridge, PackagingLayout, PACKAGING_LAYOUT};
pub use request::{ProtocolRequest, QueryParams};
pub use response::{ProtocolResponse, ResponseBody};
pub use routes::{LogSinkRoute, RouteRegistry, ServiceRoute, TelemetryRoute, LOG_SINK_FILES};
pub use server::{file_relative_path, ProtocolResourceServer, DEFAULT_DOCUMENT, LEGACY_PREFIX};
