use std::io::Read;

use log::{debug, trace};

use super::attributes::{
    select_file_name, AttributeForm, AttributeHeader, AttributeIter, FileNameAttribute,
    StandardInformation, ATTR_ATTRIBUTE_LIST, ATTR_DATA, ATTR_FILE_NAME,
    ATTR_STANDARD_INFORMATION,
};
use super::data_runs::decode_data_runs;
use super::entry::{DataLocation, Entry};
use super::reader::read_record;
use super::record::MftRecordHeader;
use crate::error::{DecodeError, Result};

pub const DEFAULT_RECORD_LENGTH: usize = 1024;

/// Декодер записей MFT фиксированной длины. Не хранит состояния между записями.
#[derive(Debug, Clone, Copy)]
pub struct MftRecordDecoder {
    record_length: usize,
}

impl Default for MftRecordDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_LENGTH)
    }
}

impl MftRecordDecoder {
    pub fn new(record_length: usize) -> Self {
        Self { record_length }
    }

    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// Читает одну запись из потока и декодирует её.
    pub fn decode_from<R: Read>(&self, row_id: u64, reader: &mut R) -> Result<Entry> {
        let record = read_record(reader, self.record_length)?;
        Ok(self.decode(row_id, &record)?)
    }

    /// Декодирует запись. Ошибки атрибутов не прерывают разбор,
    /// они попадают в `Entry::diagnostics`.
    pub fn decode(&self, row_id: u64, record: &[u8]) -> std::result::Result<Entry, DecodeError> {
        if record.len() < self.record_length {
            return Err(DecodeError::TruncatedRecord {
                read: record.len(),
                expected: self.record_length,
            });
        }
        let record = &record[..self.record_length];
        let header = MftRecordHeader::parse(record)?;

        let mut state = DecodeState::default();
        for attribute in AttributeIter::new(record, &header) {
            match attribute {
                Ok(attr) => {
                    if let Err(fault) = state.apply(record, &attr) {
                        state.faults.push(fault);
                    }
                }
                Err(fault) => state.faults.push(fault),
            }
        }

        if !state.faults.is_empty() {
            debug!("запись {}: {} восстановимых сбоев", row_id, state.faults.len());
        }
        Ok(state.finish(row_id, &header))
    }
}

/// Промежуточные результаты разбора атрибутов одной записи.
#[derive(Default)]
struct DecodeState {
    standard_information: Option<StandardInformation>,
    file_names: Vec<FileNameAttribute>,
    data: Option<DataLocation>,
    alternate_streams: Vec<String>,
    faults: Vec<DecodeError>,
}

impl DecodeState {
    fn apply(
        &mut self,
        record: &[u8],
        attr: &AttributeHeader,
    ) -> std::result::Result<(), DecodeError> {
        let malformed = |reason: &'static str| DecodeError::MalformedAttribute {
            type_code: attr.type_code,
            offset: attr.offset,
            reason,
        };

        match attr.type_code {
            ATTR_STANDARD_INFORMATION => {
                let value = attr.resident_value(record)?;
                let si = StandardInformation::parse(value)
                    .ok_or_else(|| malformed("короткий $STANDARD_INFORMATION"))?;
                // Дубликаты возможны только в повреждённой записи
                self.standard_information.get_or_insert(si);
            }
            ATTR_FILE_NAME => {
                let value = attr.resident_value(record)?;
                let fname = FileNameAttribute::parse(value)
                    .ok_or_else(|| malformed("повреждённый $FILE_NAME"))?;
                self.file_names.push(fname);
            }
            ATTR_DATA => self.apply_data(record, attr),
            ATTR_ATTRIBUTE_LIST => {
                trace!("$ATTRIBUTE_LIST по смещению {} не раскрывается", attr.offset);
            }
            other => trace!("пропущен атрибут 0x{:X}", other),
        }
        Ok(())
    }

    fn apply_data(&mut self, record: &[u8], attr: &AttributeHeader) {
        if let Some(name) = &attr.name {
            self.alternate_streams.push(name.clone());
            return;
        }
        if self.data.is_some() {
            trace!("повторный безымянный $DATA по смещению {} пропущен", attr.offset);
            return;
        }

        let location = match &attr.form {
            AttributeForm::Resident { content } => DataLocation::Resident {
                offset: content.start,
                length: content.len(),
            },
            AttributeForm::NonResident {
                runs,
                allocated_size,
                real_size,
            } => {
                let decoded = decode_data_runs(&record[runs.clone()], runs.start);
                match decoded.fault {
                    Some(fault) => self.faults.push(fault),
                    // Пустой список допустим только для файла нулевой длины
                    None if decoded.runs.is_empty() && *real_size != 0 => {
                        self.faults.push(DecodeError::MalformedDataRun {
                            position: runs.start,
                            reason: "пустой список runs у непустого файла",
                        });
                    }
                    None => {}
                }
                DataLocation::NonResident {
                    runs: decoded.runs,
                    allocated_size: *allocated_size,
                    real_size: *real_size,
                }
            }
        };
        self.data = Some(location);
    }

    fn finish(self, row_id: u64, header: &MftRecordHeader) -> Entry {
        let si = self.standard_information;
        let file_name = select_file_name(self.file_names);

        Entry {
            row_id,
            sequence_number: header.sequence_number,
            record_number: header.record_number,
            base_reference: header.base_record_reference,
            in_use: header.is_in_use(),
            directory: header.is_directory(),
            namespace: file_name.as_ref().map(|f| f.namespace),
            parent: file_name.as_ref().map(|f| f.parent),
            name: file_name.map(|f| f.name),
            creation_date: si.as_ref().and_then(|s| s.creation_time),
            modification_date: si.as_ref().and_then(|s| s.modified_time),
            entry_modification_date: si.as_ref().and_then(|s| s.mft_modified_time),
            access_date: si.as_ref().and_then(|s| s.accessed_time),
            data: self.data.unwrap_or_default(),
            alternate_streams: self.alternate_streams,
            diagnostics: self.faults,
        }
    }
}
