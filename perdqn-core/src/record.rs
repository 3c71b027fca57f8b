//! Types and traits for recording metrics during training.
//!
//! * [`Record`] - A container of key-value pairs
//! * [`RecordValue`] - Values that can be stored in a [`Record`]
//! * [`Recorder`] - Destination of records
//! * [`BufferedRecorder`] - Keeps records in memory
//! * [`NullRecorder`] - Discards records
//!
//! ```rust
//! use perdqn_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(1.0));
//! record.insert("reward", RecordValue::Scalar(-1.0));
//! record.insert("env", RecordValue::String("corridor".to_string()));
//! assert_eq!(record.get_scalar("reward").unwrap(), -1.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
