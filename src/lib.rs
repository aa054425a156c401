//! Декодер записей NTFS MFT для конвейера обработки улик.
//!
//! Запись фиксированной длины превращается в неизменяемый [`Entry`]:
//! метаданные файла/папки, резидентное содержимое или список data runs.
//! Повреждённые атрибуты не прерывают разбор записи, а повреждённые записи
//! не прерывают пакет.

pub mod config;
pub mod error;
pub mod extraction;
pub mod mft;
pub mod models;
pub mod output;
pub mod pipeline;

pub use config::ParserConfig;
pub use error::{DecodeError, Error, Result};
pub use extraction::{
    ContentSink, DirectorySink, ExtractedItem, ExtractionBridge, HandOff, ParentMetadata,
};
pub use mft::{DataLocation, DataRun, Entry, EntryMetadata, MetadataKey, MftRecordDecoder};
pub use pipeline::{ParseSummary, Pipeline};
