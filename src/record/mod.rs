//! Country temperature-variation records

mod error;
mod record;

pub use error::{RecordError, RecordResult};
pub use record::{Key, Record, RecordId};
pub(crate) use record::mean;
