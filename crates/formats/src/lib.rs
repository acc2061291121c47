pub mod kml;
pub mod plan_json;
pub mod preferences;
pub mod wpml;
mod xml;

pub use kml::*;
pub use plan_json::*;
pub use preferences::*;
pub use wpml::*;
