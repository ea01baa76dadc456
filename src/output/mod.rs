// Output generation module

pub mod dot;
pub mod layout;

pub use dot::*;
pub use layout::*;
