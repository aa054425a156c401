use std::fmt;

use serde::Serialize;

use super::utils::{read_int_le, read_uint_le};
use crate::error::DecodeError;

/// Непрерывный экстент кластеров non-resident атрибута.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataRun {
    /// Абсолютный номер кластера (LCN), накопленный из дельт
    pub offset: i64,
    /// Длина в кластерах, всегда > 0
    pub length: u64,
    /// Разреженный run: поле смещения отсутствует, кластеры не выделены
    pub sparse: bool,
}

impl fmt::Display for DataRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sparse {
            write!(f, "(sparse, length={})", self.length)
        } else {
            write!(f, "(offset={}, length={})", self.offset, self.length)
        }
    }
}

/// Результат декодирования списка runs: всё, что удалось прочитать до сбоя.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedRuns {
    pub runs: Vec<DataRun>,
    pub fault: Option<DecodeError>,
}

/// Диагностическая строка списка экстентов, например `[(offset=5, length=3)]`.
pub fn format_runs(runs: &[DataRun]) -> String {
    let items: Vec<String> = runs.iter().map(|r| r.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Декодирует список data runs.
///
/// `base` - абсолютная позиция `bytes` внутри записи, только для диагностики.
/// При ошибке уже прочитанные runs сохраняются, остаток списка отбрасывается.
pub fn decode_data_runs(bytes: &[u8], base: usize) -> DecodedRuns {
    let mut decoded = DecodedRuns::default();
    let mut pos = 0usize;
    let mut current_lcn: i64 = 0;

    let fail = |pos: usize, reason: &'static str| DecodeError::MalformedDataRun {
        position: base + pos,
        reason,
    };

    while pos < bytes.len() {
        let control = bytes[pos];
        if control == 0 {
            break;
        }
        let len_bytes = (control & 0x0F) as usize;
        let off_bytes = (control >> 4) as usize;

        if len_bytes > 8 || off_bytes > 8 {
            decoded.fault = Some(fail(pos, "ширина поля больше 8 байт"));
            break;
        }
        let field_start = pos + 1;
        if field_start + len_bytes + off_bytes > bytes.len() {
            decoded.fault = Some(fail(pos, "поля run выходят за границы списка"));
            break;
        }

        let length = read_uint_le(&bytes[field_start..field_start + len_bytes]);
        if length == 0 {
            decoded.fault = Some(fail(pos, "длина run равна 0"));
            break;
        }

        let delta_start = field_start + len_bytes;
        let delta = read_int_le(&bytes[delta_start..delta_start + off_bytes]);
        current_lcn = match current_lcn.checked_add(delta) {
            Some(lcn) => lcn,
            None => {
                decoded.fault = Some(fail(pos, "переполнение абсолютного смещения"));
                break;
            }
        };

        decoded.runs.push(DataRun {
            offset: current_lcn,
            length,
            sparse: off_bytes == 0,
        });
        pos = delta_start + off_bytes;
    }

    decoded
}
