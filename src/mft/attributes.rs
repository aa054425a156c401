use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};
use encoding_rs::UTF_16LE;
use serde::Serialize;

use super::record::MftRecordHeader;
use super::utils::filetime_to_datetime;
use crate::error::DecodeError;

pub const ATTR_STANDARD_INFORMATION: u32 = 0x10;
pub const ATTR_ATTRIBUTE_LIST: u32 = 0x20;
pub const ATTR_FILE_NAME: u32 = 0x30;
pub const ATTR_DATA: u32 = 0x80;
pub const ATTR_END: u32 = 0xFFFF_FFFF;

const COMMON_HEADER_LEN: usize = 16;
const RESIDENT_HEADER_LEN: usize = 0x18;
const NON_RESIDENT_HEADER_LEN: usize = 0x40;

/// Расположение тела атрибута. Диапазоны абсолютные (от начала записи).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeForm {
    /// Диапазон значения не сверяется с буфером: это делает потребитель.
    Resident { content: Range<usize> },
    NonResident {
        runs: Range<usize>,
        allocated_size: u64,
        real_size: u64,
    },
}

/// Заголовок атрибута; живёт только во время декодирования записи.
#[derive(Debug, Clone)]
pub struct AttributeHeader {
    pub type_code: u32,
    pub offset: usize,
    pub length: usize,
    pub name: Option<String>,
    pub form: AttributeForm,
}

impl AttributeHeader {
    fn malformed(type_code: u32, offset: usize, reason: &'static str) -> DecodeError {
        DecodeError::MalformedAttribute { type_code, offset, reason }
    }

    /// Разбирает заголовок атрибута, длина которого уже сверена с записью.
    fn parse(record: &[u8], offset: usize, length: usize) -> Result<Self, DecodeError> {
        let attr = &record[offset..offset + length];
        let type_code = LittleEndian::read_u32(&attr[0..4]);
        let non_resident = attr[8] != 0;
        let name = read_attribute_name(attr)
            .ok_or_else(|| Self::malformed(type_code, offset, "имя атрибута вне его границ"))?;

        let form = if non_resident {
            if length < NON_RESIDENT_HEADER_LEN {
                return Err(Self::malformed(type_code, offset, "короткий non-resident заголовок"));
            }
            let run_offset = LittleEndian::read_u16(&attr[0x20..0x22]) as usize;
            if run_offset < NON_RESIDENT_HEADER_LEN {
                return Err(Self::malformed(type_code, offset, "список runs внутри заголовка"));
            }
            if run_offset > length {
                return Err(Self::malformed(type_code, offset, "список runs вне атрибута"));
            }
            AttributeForm::NonResident {
                runs: offset + run_offset..offset + length,
                allocated_size: LittleEndian::read_u64(&attr[0x28..0x30]),
                real_size: LittleEndian::read_u64(&attr[0x30..0x38]),
            }
        } else {
            if length < RESIDENT_HEADER_LEN {
                return Err(Self::malformed(type_code, offset, "короткий resident заголовок"));
            }
            let value_length = LittleEndian::read_u32(&attr[16..20]) as usize;
            let value_offset = LittleEndian::read_u16(&attr[20..22]) as usize;
            let start = offset + value_offset;
            AttributeForm::Resident {
                content: start..start.saturating_add(value_length),
            }
        };

        Ok(Self { type_code, offset, length, name, form })
    }

    /// Тело resident атрибута, ограниченное его собственной длиной.
    pub fn resident_value<'a>(&self, record: &'a [u8]) -> Result<&'a [u8], DecodeError> {
        match &self.form {
            AttributeForm::Resident { content } if content.end <= self.offset + self.length => {
                Ok(&record[content.clone()])
            }
            AttributeForm::Resident { .. } => Err(Self::malformed(
                self.type_code,
                self.offset,
                "значение выходит за границы атрибута",
            )),
            AttributeForm::NonResident { .. } => Err(Self::malformed(
                self.type_code,
                self.offset,
                "ожидался resident атрибут",
            )),
        }
    }
}

/// `None` - имя объявлено, но не помещается в атрибут; `Some(None)` - безымянный.
fn read_attribute_name(attr: &[u8]) -> Option<Option<String>> {
    let name_len = attr[9] as usize;
    if name_len == 0 {
        return Some(None);
    }
    let name_off = LittleEndian::read_u16(&attr[10..12]) as usize;
    let bytes = attr.get(name_off..name_off + name_len * 2)?;
    Some(Some(decode_utf16(bytes)))
}

fn decode_utf16(bytes: &[u8]) -> String {
    let (text, _had_errors) = UTF_16LE.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Обход атрибутов записи до маркера конца или границы used_size.
pub struct AttributeIter<'a> {
    record: &'a [u8],
    offset: usize,
    end: usize,
    done: bool,
}

impl<'a> AttributeIter<'a> {
    pub fn new(record: &'a [u8], header: &MftRecordHeader) -> Self {
        Self {
            record,
            offset: header.first_attribute_offset as usize,
            end: header.attribute_area_end(record.len()),
            done: false,
        }
    }
}

impl<'a> Iterator for AttributeIter<'a> {
    type Item = Result<AttributeHeader, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset.saturating_add(8) > self.end {
            return None;
        }
        let offset = self.offset;
        let type_code = LittleEndian::read_u32(&self.record[offset..offset + 4]);
        if type_code == ATTR_END {
            self.done = true;
            return None;
        }

        let length = LittleEndian::read_u32(&self.record[offset + 4..offset + 8]) as usize;
        if length < COMMON_HEADER_LEN {
            // Через такой атрибут нельзя перешагнуть
            self.done = true;
            return Some(Err(AttributeHeader::malformed(
                type_code,
                offset,
                "длина атрибута меньше заголовка",
            )));
        }
        self.offset = offset.saturating_add(length);

        if offset.saturating_add(length) > self.record.len() {
            return Some(Err(AttributeHeader::malformed(
                type_code,
                offset,
                "длина атрибута выходит за границы записи",
            )));
        }
        Some(AttributeHeader::parse(self.record, offset, length))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardInformation {
    pub creation_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    pub mft_modified_time: Option<DateTime<Utc>>,
    pub accessed_time: Option<DateTime<Utc>>,
}

impl StandardInformation {
    pub const MIN_LEN: usize = 48;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::MIN_LEN {
            return None;
        }

        Some(Self {
            creation_time: filetime_to_datetime(LittleEndian::read_u64(&data[0..8])),
            modified_time: filetime_to_datetime(LittleEndian::read_u64(&data[8..16])),
            mft_modified_time: filetime_to_datetime(LittleEndian::read_u64(&data[16..24])),
            accessed_time: filetime_to_datetime(LittleEndian::read_u64(&data[24..32])),
        })
    }
}

/// Пространство имён FILE_NAME.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileNameNamespace {
    Posix,
    Win32,
    Dos,
    Win32AndDos,
    Unknown(u8),
}

impl From<u8> for FileNameNamespace {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Posix,
            1 => Self::Win32,
            2 => Self::Dos,
            3 => Self::Win32AndDos,
            other => Self::Unknown(other),
        }
    }
}

/// Ссылка на запись MFT: 48 бит номера + 16 бит sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileReference {
    pub record: u64,
    pub sequence: u16,
}

impl From<u64> for FileReference {
    fn from(raw: u64) -> Self {
        Self {
            record: raw & 0x0000_FFFF_FFFF_FFFF,
            sequence: (raw >> 48) as u16,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileNameAttribute {
    pub parent: FileReference,
    pub namespace: FileNameNamespace,
    pub name: String,
}

impl FileNameAttribute {
    const NAME_OFFSET: usize = 66;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::NAME_OFFSET {
            return None;
        }

        let name_length = data[64] as usize;
        let name_bytes = data.get(Self::NAME_OFFSET..Self::NAME_OFFSET + name_length * 2)?;

        Some(Self {
            parent: FileReference::from(LittleEndian::read_u64(&data[0..8])),
            namespace: FileNameNamespace::from(data[65]),
            name: decode_utf16(name_bytes),
        })
    }
}

/// Выбор основного имени: первое не-DOS имя, иначе первое встреченное.
pub fn select_file_name(names: Vec<FileNameAttribute>) -> Option<FileNameAttribute> {
    let preferred = names
        .iter()
        .position(|f| f.namespace != FileNameNamespace::Dos)
        .unwrap_or(0);
    names.into_iter().nth(preferred)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_name_body(namespace: u8, name: &str) -> Vec<u8> {
        let units: Vec<u16> = name.encode_utf16().collect();
        let mut body = vec![0u8; 66];
        body[0..8].copy_from_slice(&(5u64 | (5u64 << 48)).to_le_bytes());
        body[64] = units.len() as u8;
        body[65] = namespace;
        for unit in units {
            body.extend_from_slice(&unit.to_le_bytes());
        }
        body
    }

    fn parsed(namespace: u8, name: &str) -> FileNameAttribute {
        FileNameAttribute::parse(&file_name_body(namespace, name)).unwrap()
    }

    #[test]
    fn file_name_fields() {
        let fname = parsed(1, "отчёт.docx");
        assert_eq!(fname.name, "отчёт.docx");
        assert_eq!(fname.namespace, FileNameNamespace::Win32);
        assert_eq!(fname.parent, FileReference { record: 5, sequence: 5 });
    }

    #[test]
    fn file_name_truncated_name_is_rejected() {
        let mut body = file_name_body(1, "abcdef");
        body.truncate(70);
        assert!(FileNameAttribute::parse(&body).is_none());
    }

    #[test]
    fn prefers_first_non_dos_name() {
        let names = vec![parsed(2, "PROGRA~1"), parsed(1, "Program Files"), parsed(0, "posix")];
        assert_eq!(select_file_name(names).unwrap().name, "Program Files");
    }

    #[test]
    fn only_dos_names_take_first() {
        let names = vec![parsed(2, "FIRST~1"), parsed(2, "SECOND~1")];
        assert_eq!(select_file_name(names).unwrap().name, "FIRST~1");
        assert!(select_file_name(Vec::new()).is_none());
    }

    #[test]
    fn standard_information_needs_48_bytes() {
        assert!(StandardInformation::parse(&[0u8; 47]).is_none());
        let si = StandardInformation::parse(&[0u8; 48]).unwrap();
        assert!(si.creation_time.is_none());
    }
}
