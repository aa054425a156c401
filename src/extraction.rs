use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use serde::Serialize;

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::mft::{extract_resident, Entry};

/// Метаданные извлечённого элемента для внешнего экстрактора.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemMetadata {
    pub row_id: u64,
    pub resource_name: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub carved: bool,
    pub carved_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedItem {
    pub content: Vec<u8>,
    pub metadata: ItemMetadata,
}

/// Собственные метаданные родительской улики (дампа MFT).
#[derive(Debug, Clone, Default)]
pub struct ParentMetadata {
    pub carved_by: Option<String>,
}

/// Внешний получатель извлечённого содержимого.
pub trait ContentSink {
    fn accept(&self, item: ExtractedItem) -> Result<()>;
}

impl ContentSink for Sender<ExtractedItem> {
    fn accept(&self, item: ExtractedItem) -> Result<()> {
        self.send(item).map_err(|_| Error::SinkClosed)
    }
}

impl<S: ContentSink + ?Sized> ContentSink for &S {
    fn accept(&self, item: ExtractedItem) -> Result<()> {
        (**self).accept(item)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandOff {
    Delivered,
    Disabled,
    /// Папка или нет резидентного $DATA
    NotApplicable,
}

/// Передаёт резидентное содержимое и метаданные записи внешнему экстрактору.
pub struct ExtractionBridge<S> {
    config: ParserConfig,
    sink: S,
}

impl<S: ContentSink> ExtractionBridge<S> {
    pub fn new(config: ParserConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// `record` - тот же буфер, из которого декодирована `entry`.
    /// Ошибка `Bounds` означает, что пропущено только извлечение.
    pub fn hand_off(
        &self,
        entry: &Entry,
        record: &[u8],
        parent: &ParentMetadata,
    ) -> Result<HandOff> {
        if !self.config.extract_resident_files {
            return Ok(HandOff::Disabled);
        }
        let Some(content) = extract_resident(entry, record)? else {
            return Ok(HandOff::NotApplicable);
        };

        let metadata = ItemMetadata {
            row_id: entry.row_id(),
            resource_name: entry.name().map(str::to_owned),
            created: entry.creation_date(),
            modified: entry.modification_date(),
            accessed: entry.access_date(),
            deleted: entry.is_inactive(),
            carved: parent.carved_by.is_some(),
            carved_by: parent.carved_by.clone(),
        };
        self.sink.accept(ExtractedItem {
            content: content.to_vec(),
            metadata,
        })?;
        Ok(HandOff::Delivered)
    }
}

/// Складывает содержимое в каталог: `<row>_<имя>` и `<row>_<имя>.meta.json`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn item_path(&self, metadata: &ItemMetadata) -> PathBuf {
        let name = metadata
            .resource_name
            .as_deref()
            .map(sanitize_file_name)
            .map(|n| truncate_to_bytes(&n, MAX_NAME_BYTES).to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| String::from("unnamed"));
        self.dir.join(format!("{:08}_{}", metadata.row_id, name))
    }
}

impl ContentSink for DirectorySink {
    fn accept(&self, item: ExtractedItem) -> Result<()> {
        let path = self.item_path(&item.metadata);
        fs::write(&path, &item.content)?;

        let mut meta_path = path.into_os_string();
        meta_path.push(".meta.json");
        fs::write(meta_path, serde_json::to_vec_pretty(&item.metadata)?)?;
        Ok(())
    }
}

/// Запас под префикс `<row>_` и суффикс `.meta.json` в пределах 255 байт.
const MAX_NAME_BYTES: usize = 200;

/// Обрезает строку до `max` байт по границе символа.
fn truncate_to_bytes(name: &str, max: usize) -> &str {
    if name.len() <= max {
        return name;
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}
