use std::io::{Read, Write};

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{DecodeError, Error, Result};
use crate::extraction::{ContentSink, ExtractionBridge, HandOff, ParentMetadata};
use crate::mft::{apply_fixups, Entry, FixupOutcome, MftRecordDecoder, RecordStream};
use crate::models::ReportLine;
use crate::output::JsonlWriter;

pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// Результат обработки одной записи; буфер сохраняется для извлечения контента.
#[derive(Debug)]
pub struct DecodedRecord {
    pub row_id: u64,
    pub record: Vec<u8>,
    pub fixup: Option<FixupOutcome>,
    pub outcome: std::result::Result<Entry, DecodeError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseSummary {
    pub decoded: u64,
    pub empty_slots: u64,
    pub rejected: u64,
    pub truncated: u64,
    pub with_faults: u64,
    pub torn_writes: u64,
    pub extracted: u64,
    pub extraction_failed: u64,
}

/// Пакетная обработка дампа: чтение последовательное, декодирование параллельное,
/// вывод в исходном порядке записей.
#[derive(Debug, Clone)]
pub struct Pipeline {
    decoder: MftRecordDecoder,
    bytes_per_sector: Option<u16>,
    batch_size: usize,
}

impl Pipeline {
    pub fn new(decoder: MftRecordDecoder) -> Self {
        Self {
            decoder,
            bytes_per_sector: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_fixups(mut self, bytes_per_sector: u16) -> Self {
        self.bytes_per_sector = Some(bytes_per_sector);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn decode_record(&self, row_id: u64, mut record: Vec<u8>) -> DecodedRecord {
        let fixup = self
            .bytes_per_sector
            .map(|bps| apply_fixups(&mut record, bps));
        let outcome = self.decoder.decode(row_id, &record);
        DecodedRecord {
            row_id,
            record,
            fixup,
            outcome,
        }
    }

    pub fn decode_batch(&self, batch: Vec<(u64, Vec<u8>)>) -> Vec<DecodedRecord> {
        batch
            .into_par_iter()
            .map(|(row_id, record)| self.decode_record(row_id, record))
            .collect()
    }

    pub fn run<R, W, S>(
        &self,
        mut stream: RecordStream<R>,
        writer: &mut JsonlWriter<W>,
        bridge: Option<&ExtractionBridge<S>>,
        parent: &ParentMetadata,
    ) -> Result<ParseSummary>
    where
        R: Read,
        W: Write,
        S: ContentSink,
    {
        let mut summary = ParseSummary::default();
        let mut exhausted = false;

        while !exhausted {
            let mut batch = Vec::with_capacity(self.batch_size);
            let mut stream_error = None;

            while batch.len() < self.batch_size {
                match stream.next() {
                    Some(Ok(item)) => batch.push(item),
                    Some(Err(Error::Decode(e))) => {
                        warn!("обрезанный хвост дампа: {}", e);
                        summary.truncated += 1;
                    }
                    Some(Err(e)) => {
                        stream_error = Some(e);
                        exhausted = true;
                        break;
                    }
                    None => {
                        exhausted = true;
                        break;
                    }
                }
            }

            for decoded in self.decode_batch(batch) {
                self.consume(decoded, writer, bridge, parent, &mut summary)?;
            }
            if let Some(e) = stream_error {
                writer.flush()?;
                return Err(e);
            }
        }

        writer.flush()?;
        Ok(summary)
    }

    fn consume<W: Write, S: ContentSink>(
        &self,
        decoded: DecodedRecord,
        writer: &mut JsonlWriter<W>,
        bridge: Option<&ExtractionBridge<S>>,
        parent: &ParentMetadata,
        summary: &mut ParseSummary,
    ) -> Result<()> {
        let row_id = decoded.row_id;
        let entry = match decoded.outcome {
            Ok(entry) => entry,
            Err(e) if e.is_empty_slot() => {
                debug!("запись {}: пустой слот", row_id);
                summary.empty_slots += 1;
                return Ok(());
            }
            Err(e) => {
                warn!("запись {} отброшена: {}", row_id, e);
                summary.rejected += 1;
                return Ok(());
            }
        };

        if decoded.fixup == Some(FixupOutcome::TornWrite) {
            warn!("запись {}: незавершённая запись сектора (torn write)", row_id);
            summary.torn_writes += 1;
        }
        if !entry.diagnostics().is_empty() {
            summary.with_faults += 1;
            for fault in entry.diagnostics() {
                debug!("запись {}: {}", row_id, fault);
            }
        }

        writer.write(&ReportLine::from_entry(&entry))?;
        summary.decoded += 1;

        let Some(bridge) = bridge else {
            return Ok(());
        };
        match bridge.hand_off(&entry, &decoded.record, parent) {
            Ok(HandOff::Delivered) => summary.extracted += 1,
            Ok(_) => {}
            Err(Error::SinkClosed) => return Err(Error::SinkClosed),
            Err(e) => {
                warn!("запись {}: извлечение содержимого пропущено: {}", row_id, e);
                summary.extraction_failed += 1;
            }
        }
        Ok(())
    }
}
