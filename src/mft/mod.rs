pub mod attributes;
pub mod content;
pub mod data_runs;
pub mod decoder;
pub mod entry;
pub mod fixup;
pub mod reader;
pub mod record;
pub mod utils;

pub use content::extract_resident;
pub use data_runs::{decode_data_runs, DataRun};
pub use decoder::{MftRecordDecoder, DEFAULT_RECORD_LENGTH};
pub use entry::{DataLocation, Entry, EntryMetadata, MetadataKey};
pub use fixup::{apply_fixups, FixupOutcome};
pub use reader::{read_record, RecordSource, RecordStream};
