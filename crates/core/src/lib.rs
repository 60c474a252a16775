#![forbid(unsafe_code)]

pub mod error;
pub mod eval;
pub mod model;
pub mod time;

pub use error::Error;
pub use eval::{EvalError, evaluate};
pub use time::Clock;
