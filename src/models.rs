use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::mft::{Entry, EntryMetadata, DEFAULT_RECORD_LENGTH};

/// Метаданные источника из файла-компаньона `<дамп>.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMeta {
    pub mft_record_size: u32,
    pub bytes_per_sector: u16,
    pub source: String,
    /// Собственная пометка карвинга у улики, из которой получен дамп
    pub carved_by: Option<String>,
}

impl Default for SourceMeta {
    fn default() -> Self {
        Self {
            mft_record_size: DEFAULT_RECORD_LENGTH as u32,
            bytes_per_sector: 512,
            source: String::new(),
            carved_by: None,
        }
    }
}

impl SourceMeta {
    pub fn sidecar_path(mft_path: &Path) -> std::path::PathBuf {
        let mut name = mft_path.as_os_str().to_owned();
        name.push(".meta.json");
        name.into()
    }

    /// Нет файла-компаньона или он нечитаем - значения по умолчанию.
    pub fn load_for(mft_path: &Path) -> Self {
        File::open(Self::sidecar_path(mft_path))
            .ok()
            .and_then(|f| serde_json::from_reader(f).ok())
            .unwrap_or_default()
    }

    pub fn record_length(&self) -> usize {
        self.mft_record_size as usize
    }
}

/// Одна строка JSONL-отчёта.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportLine {
    pub row_id: u64,
    pub sequence_number: u16,
    pub metadata: EntryMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl ReportLine {
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            row_id: entry.row_id(),
            sequence_number: entry.sequence_number(),
            metadata: entry.metadata(),
            diagnostics: entry.diagnostics().iter().map(DecodeError::to_string).collect(),
        }
    }
}
