pub mod ingest;
pub use ingest::IngestSink;
pub mod source;
pub use source::{open_source, ByteSource, FileSource, HttpSource, MemorySource};
