pub mod header;
pub mod record;

pub use header::*;
pub use record::*;
