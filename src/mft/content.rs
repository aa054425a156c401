use super::entry::Entry;
use crate::error::DecodeError;

/// Вырезает резидентное содержимое файла из исходного буфера записи.
///
/// `Ok(None)` - у записи нет резидентного содержимого или это папка.
pub fn extract_resident<'a>(
    entry: &Entry,
    record: &'a [u8],
) -> Result<Option<&'a [u8]>, DecodeError> {
    if !entry.is_file() {
        return Ok(None);
    }
    let Some((offset, length)) = entry.resident_content() else {
        return Ok(None);
    };

    match offset.checked_add(length) {
        Some(end) if end <= record.len() => Ok(Some(&record[offset..end])),
        _ => Err(DecodeError::Bounds {
            offset,
            length,
            available: record.len(),
        }),
    }
}
