//! Terrain elevation lookups and the altitude adaptation built on them.

pub mod altitude;
pub mod batch;
pub mod config;
pub mod http;
pub mod lookup;

pub use altitude::*;
pub use batch::*;
pub use config::*;
pub use http::*;
pub use lookup::*;
