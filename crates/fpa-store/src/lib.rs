pub mod adapter;
pub mod error;
pub mod export;
pub mod processor;
pub mod schema;
pub mod store;

pub use adapter::{Eye, GazeRecording, GazeSample, load_gaze_csv, parse_recording};
pub use error::{Result, StoreError};
pub use export::{segments_to_csv, segments_to_json, write_csv, write_json};
pub use processor::{Processor, ProcessorConfig};
pub use store::{SegmentRecord, Store};
