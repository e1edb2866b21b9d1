pub mod params;
pub mod schema;

pub use params::Params;
pub use schema::{BrowserConfig, Limits, NavigatorConfig, OracleConfig, Viewport};
