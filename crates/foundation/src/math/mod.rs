pub mod geodesy;
pub mod spline;

pub use geodesy::*;
pub use spline::*;
