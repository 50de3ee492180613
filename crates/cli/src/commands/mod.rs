pub mod instrument;

pub use instrument::*;
