use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{DecodeError, Result};

/// Дочитывает буфер до конца, переживая короткие чтения.
/// Возвращает число реально прочитанных байт (меньше длины буфера только на EOF).
fn fill_buffer<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(read)
}

/// Читает ровно одну запись фиксированной длины.
pub fn read_record<R: Read>(reader: &mut R, record_length: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; record_length];
    let read = fill_buffer(reader, &mut buf)?;
    if read < record_length {
        return Err(DecodeError::TruncatedRecord {
            read,
            expected: record_length,
        }
        .into());
    }
    Ok(buf)
}

/// Последовательный поток записей: `(row_id, буфер)`.
///
/// Чистый EOF на границе записи завершает поток, обрезанный хвост
/// выдаётся как `TruncatedRecord` и тоже завершает его.
pub struct RecordStream<R> {
    reader: R,
    record_length: usize,
    next_row: u64,
    finished: bool,
}

impl<R: Read> RecordStream<R> {
    pub fn new(reader: R, record_length: usize) -> Self {
        Self {
            reader,
            record_length,
            next_row: 0,
            finished: false,
        }
    }
}

impl<R: Read> Iterator for RecordStream<R> {
    type Item = Result<(u64, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.record_length == 0 {
            return None;
        }
        let mut buf = vec![0u8; self.record_length];
        let read = match fill_buffer(&mut self.reader, &mut buf) {
            Ok(read) => read,
            Err(e) => {
                self.finished = true;
                return Some(Err(e.into()));
            }
        };

        if read == 0 {
            self.finished = true;
            return None;
        }
        if read < self.record_length {
            self.finished = true;
            return Some(Err(DecodeError::TruncatedRecord {
                read,
                expected: self.record_length,
            }
            .into()));
        }

        let row = self.next_row;
        self.next_row += 1;
        Some(Ok((row, buf)))
    }
}

/// Файл дампа MFT: произвольный доступ к записям и последовательный обход.
pub struct RecordSource {
    reader: BufReader<File>,
    file_size: u64,
    record_length: usize,
}

impl RecordSource {
    pub fn open(path: impl AsRef<Path>, record_length: usize) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        Ok(Self {
            reader: BufReader::new(file),
            file_size,
            record_length,
        })
    }

    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// Число полных записей в дампе (обрезанный хвост не считается).
    pub fn total_records(&self) -> u64 {
        if self.record_length == 0 {
            return 0;
        }
        self.file_size / self.record_length as u64
    }

    pub fn fetch(&mut self, row_id: u64) -> Result<Vec<u8>> {
        let offset = row_id.saturating_mul(self.record_length as u64);
        self.reader.seek(SeekFrom::Start(offset))?;
        read_record(&mut self.reader, self.record_length)
    }

    pub fn into_stream(mut self) -> Result<RecordStream<BufReader<File>>> {
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(RecordStream::new(self.reader, self.record_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Cursor;

    /// Отдаёт данные кусками по `chunk` байт и иногда прерывается.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
        interrupted: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.interrupted = false;
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn loops_over_short_reads() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
        let mut reader = Trickle { data: data.clone(), pos: 0, chunk: 7, interrupted: false };
        assert_eq!(read_record(&mut reader, 1024).unwrap(), data);
    }

    #[test]
    fn short_stream_is_truncated() {
        let mut reader = Cursor::new(vec![0u8; 600]);
        match read_record(&mut reader, 1024) {
            Err(Error::Decode(DecodeError::TruncatedRecord { read, expected })) => {
                assert_eq!((read, expected), (600, 1024));
            }
            other => panic!("unexpected: {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn stream_yields_rows_then_truncated_tail() {
        let stream = RecordStream::new(Cursor::new(vec![1u8; 2 * 16 + 5]), 16);
        let items: Vec<_> = stream.collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().0, 0);
        assert_eq!(items[1].as_ref().unwrap().0, 1);
        assert!(matches!(
            items[2],
            Err(Error::Decode(DecodeError::TruncatedRecord { read: 5, expected: 16 }))
        ));
    }

    #[test]
    fn stream_ends_cleanly_on_boundary() {
        let stream = RecordStream::new(Cursor::new(vec![1u8; 32]), 16);
        assert_eq!(stream.count(), 2);
    }
}
