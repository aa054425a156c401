use chrono::{DateTime, TimeZone, Utc};

/// Количество 100-нс интервалов между 1601-01-01 и 1970-01-01 (Unix Epoch)
const FILETIME_UNIX_EPOCH: i64 = 116_444_736_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Формат дат в метаданных записи (UTC)
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Конвертирует Windows FILETIME (100-нс интервалы с 1601-01-01) в DateTime<Utc>.
///
/// Ноль и значения со старшим битом (недопустимые для FILETIME) считаются
/// отсутствующей меткой времени.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    if filetime == 0 {
        return None;
    }
    let ticks = i64::try_from(filetime).ok()?;
    let unix_ticks = ticks - FILETIME_UNIX_EPOCH;
    let seconds = unix_ticks.div_euclid(TICKS_PER_SECOND);
    let nanoseconds = (unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;

    Utc.timestamp_opt(seconds, nanoseconds).single()
}

pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Беззнаковое little-endian число переменной ширины (до 8 байт).
pub fn read_uint_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (b as u64) << (i * 8))
}

/// Знаковое little-endian число переменной ширины с расширением знака.
pub fn read_int_le(bytes: &[u8]) -> i64 {
    let width = bytes.len();
    if width == 0 {
        return 0;
    }
    let raw = read_uint_le(bytes);
    if width >= 8 {
        return raw as i64;
    }
    let shift = 64 - width * 8;
    ((raw << shift) as i64) >> shift
}
