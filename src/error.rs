use thiserror::Error;

/// Ошибки декодирования одной записи MFT.
///
/// `TruncatedRecord` и `InvalidRecord` прерывают запись целиком.
/// Остальные локальны: атрибут, хвост списка data runs или извлечение контента.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("запись MFT обрезана: прочитано {read} байт из {expected}")]
    TruncatedRecord { read: usize, expected: usize },

    #[error("неверная сигнатура записи MFT: \"{}\"", .signature.escape_ascii())]
    InvalidRecord { signature: [u8; 4] },

    #[error("повреждённый атрибут 0x{type_code:X} по смещению {offset}: {reason}")]
    MalformedAttribute {
        type_code: u32,
        offset: usize,
        reason: &'static str,
    },

    #[error("повреждённый список data runs (позиция {position}): {reason}")]
    MalformedDataRun { position: usize, reason: &'static str },

    #[error("резидентный контент [{offset}; +{length}) вне записи ({available} байт)")]
    Bounds {
        offset: usize,
        length: usize,
        available: usize,
    },
}

impl DecodeError {
    /// Ошибка уровня записи: Entry не создаётся.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            DecodeError::TruncatedRecord { .. } | DecodeError::InvalidRecord { .. }
        )
    }

    /// Запись помечена драйвером NTFS как повреждённая ("BAAD").
    pub fn is_marked_corrupt(&self) -> bool {
        matches!(self, DecodeError::InvalidRecord { signature } if signature == b"BAAD")
    }

    /// Пустой (обнулённый) слот в дампе MFT.
    pub fn is_empty_slot(&self) -> bool {
        matches!(self, DecodeError::InvalidRecord { signature } if signature == &[0u8; 4])
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("ошибка JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("не удалось создать пул потоков: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("получатель извлечённого контента закрыт")]
    SinkClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
