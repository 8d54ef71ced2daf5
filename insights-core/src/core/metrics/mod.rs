pub use error::*;
pub use metric::*;
pub use provider::*;

mod error;
mod metric;
mod provider;
