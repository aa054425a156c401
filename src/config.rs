use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Настройки разбора записей, передаются конвейером извне.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserConfig {
    /// Передавать резидентное содержимое файлов во внешний экстрактор
    pub extract_resident_files: bool,
    /// Зарезервировано: извлечение non-resident содержимого не реализовано
    pub extract_non_resident_files: bool,
    /// Зарезервировано, -1 = без ограничения; не применяется
    pub non_resident_files_max_length: i64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            extract_resident_files: false,
            extract_non_resident_files: false,
            non_resident_files_max_length: -1,
        }
    }
}

impl ParserConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
