//! Chart rendering: bar layout, drawing, and the interactive viewer.

pub mod chart;
pub mod window;

pub use window::show;
