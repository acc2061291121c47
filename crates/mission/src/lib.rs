pub mod error;
pub mod events;
pub mod model;
pub mod orbit;
pub mod path;
pub mod selection;
pub mod store;

pub use error::*;
pub use events::*;
pub use model::*;
pub use store::*;
