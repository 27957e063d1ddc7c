//! Layout-driven reading and writing of fixed-size binary records
pub(crate) mod field;
pub(crate) mod record;
pub(crate) mod utils;

pub use field::{FieldSpec, Layout, Value, Width};
pub use record::{read_record, write_record, Fields, Record};
