pub use field::*;
pub use insights::*;
pub use record::*;
pub use schema::*;

mod field;
mod insights;
mod record;
mod schema;
