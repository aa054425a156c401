use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::attributes::{FileNameNamespace, FileReference};
use super::data_runs::{format_runs, DataRun};
use super::utils::format_datetime;
use crate::error::DecodeError;

/// Где лежит содержимое основного потока $DATA.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DataLocation {
    #[default]
    None,
    /// Байтовый диапазон внутри исходного буфера записи
    Resident { offset: usize, length: usize },
    NonResident {
        runs: Vec<DataRun>,
        allocated_size: u64,
        real_size: u64,
    },
}

/// Декодированная запись MFT. После создания не изменяется.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub(crate) row_id: u64,
    pub(crate) sequence_number: u16,
    pub(crate) record_number: Option<u32>,
    pub(crate) base_reference: u64,
    pub(crate) in_use: bool,
    pub(crate) directory: bool,
    pub(crate) name: Option<String>,
    pub(crate) namespace: Option<FileNameNamespace>,
    pub(crate) parent: Option<FileReference>,
    pub(crate) creation_date: Option<DateTime<Utc>>,
    pub(crate) modification_date: Option<DateTime<Utc>>,
    pub(crate) entry_modification_date: Option<DateTime<Utc>>,
    pub(crate) access_date: Option<DateTime<Utc>>,
    pub(crate) data: DataLocation,
    pub(crate) alternate_streams: Vec<String>,
    pub(crate) diagnostics: Vec<DecodeError>,
}

impl Entry {
    /// Индекс записи в источнике.
    pub fn row_id(&self) -> u64 {
        self.row_id
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    pub fn record_number(&self) -> Option<u32> {
        self.record_number
    }

    /// Ненулевая ссылка означает extension-запись другой базовой записи.
    pub fn base_reference(&self) -> Option<FileReference> {
        (self.base_reference != 0).then(|| FileReference::from(self.base_reference))
    }

    pub fn is_active(&self) -> bool {
        self.in_use
    }

    pub fn is_inactive(&self) -> bool {
        !self.in_use
    }

    pub fn is_folder(&self) -> bool {
        self.directory
    }

    pub fn is_file(&self) -> bool {
        !self.directory
    }

    pub fn has_resident_content(&self) -> bool {
        matches!(self.data, DataLocation::Resident { .. })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn namespace(&self) -> Option<FileNameNamespace> {
        self.namespace
    }

    pub fn parent(&self) -> Option<FileReference> {
        self.parent
    }

    /// Реальный размер содержимого; `None` - неизвестен.
    pub fn length(&self) -> Option<u64> {
        match &self.data {
            DataLocation::None => None,
            DataLocation::Resident { length, .. } => Some(*length as u64),
            DataLocation::NonResident { real_size, .. } => Some(*real_size),
        }
    }

    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.creation_date
    }

    pub fn modification_date(&self) -> Option<DateTime<Utc>> {
        self.modification_date
    }

    pub fn entry_modification_date(&self) -> Option<DateTime<Utc>> {
        self.entry_modification_date
    }

    pub fn access_date(&self) -> Option<DateTime<Utc>> {
        self.access_date
    }

    pub fn data(&self) -> &DataLocation {
        &self.data
    }

    /// (offset, length) резидентного содержимого.
    pub fn resident_content(&self) -> Option<(usize, usize)> {
        match self.data {
            DataLocation::Resident { offset, length } => Some((offset, length)),
            _ => None,
        }
    }

    /// Список runs; есть только у non-resident данных.
    pub fn data_runs(&self) -> Option<&[DataRun]> {
        match &self.data {
            DataLocation::NonResident { runs, .. } => Some(runs),
            _ => None,
        }
    }

    pub fn alternate_streams(&self) -> &[String] {
        &self.alternate_streams
    }

    /// Восстановимые сбои, случившиеся при декодировании атрибутов.
    pub fn diagnostics(&self) -> &[DecodeError] {
        &self.diagnostics
    }

    /// Нейтральное представление метаданных для внешнего рендерера.
    pub fn metadata(&self) -> EntryMetadata {
        let mut fields = Vec::with_capacity(11);
        let yes_no = |flag: bool| String::from(if flag { "yes" } else { "no" });

        if let Some(name) = &self.name {
            fields.push((MetadataKey::Name, name.clone()));
        }
        if let Some(length) = self.length() {
            fields.push((MetadataKey::Length, length.to_string()));
        }
        let dates = [
            (MetadataKey::CreationDate, self.creation_date),
            (MetadataKey::ModificationDate, self.modification_date),
            (MetadataKey::AccessDate, self.access_date),
            (MetadataKey::EntryModificationDate, self.entry_modification_date),
        ];
        for (key, date) in dates {
            if let Some(date) = date {
                fields.push((key, format_datetime(&date)));
            }
        }
        fields.push((MetadataKey::Active, yes_no(self.is_active())));
        let kind = if self.is_file() { "File" } else { "Folder" };
        fields.push((MetadataKey::Type, kind.to_string()));
        fields.push((MetadataKey::ResidentContent, yes_no(self.has_resident_content())));
        if let Some(runs) = self.data_runs() {
            fields.push((MetadataKey::Dataruns, format_runs(runs)));
        }
        if !self.alternate_streams.is_empty() {
            fields.push((MetadataKey::AlternateStreams, self.alternate_streams.join(", ")));
        }

        EntryMetadata { fields }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKey {
    Name,
    Length,
    CreationDate,
    ModificationDate,
    AccessDate,
    EntryModificationDate,
    Active,
    Type,
    ResidentContent,
    Dataruns,
    AlternateStreams,
}

impl MetadataKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKey::Name => "Name",
            MetadataKey::Length => "Length",
            MetadataKey::CreationDate => "CreationDate",
            MetadataKey::ModificationDate => "ModificationDate",
            MetadataKey::AccessDate => "AccessDate",
            MetadataKey::EntryModificationDate => "EntryModificationDate",
            MetadataKey::Active => "Active",
            MetadataKey::Type => "Type",
            MetadataKey::ResidentContent => "ResidentContent",
            MetadataKey::Dataruns => "Dataruns",
            MetadataKey::AlternateStreams => "AlternateStreams",
        }
    }
}

/// Упорядоченное отображение ключ -> значение. Порядок сохраняется и в JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    fields: Vec<(MetadataKey, String)>,
}

impl EntryMetadata {
    pub fn get(&self, key: MetadataKey) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = MetadataKey> + '_ {
        self.fields.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for EntryMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
