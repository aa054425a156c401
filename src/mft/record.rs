use byteorder::{ByteOrder, LittleEndian};

use crate::error::DecodeError;

pub const FILE_SIGNATURE: &[u8; 4] = b"FILE";
pub const HEADER_LEN: usize = 48;

const FLAG_IN_USE: u16 = 0x01;
const FLAG_DIRECTORY: u16 = 0x02;

/// Заголовок записи MFT (первые 48-56 байт).
#[derive(Debug, Clone)]
pub struct MftRecordHeader {
    pub sequence_number: u16,
    pub first_attribute_offset: u16,
    pub flags: u16,
    pub used_size: u32,
    pub base_record_reference: u64,
    /// Номер записи из заголовка (есть начиная с NTFS 3.1)
    pub record_number: Option<u32>,
}

impl MftRecordHeader {
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < HEADER_LEN {
            return Err(DecodeError::TruncatedRecord {
                read: data.len(),
                expected: HEADER_LEN,
            });
        }

        let mut signature = [0u8; 4];
        signature.copy_from_slice(&data[0..4]);
        // "BAAD" тоже отбрасывается: запись помечена как повреждённая
        if &signature != FILE_SIGNATURE {
            return Err(DecodeError::InvalidRecord { signature });
        }

        let first_attribute_offset = LittleEndian::read_u16(&data[20..22]);
        let record_number = if first_attribute_offset as usize >= 0x30 {
            Some(LittleEndian::read_u32(&data[44..48]))
        } else {
            None
        };

        Ok(Self {
            sequence_number: LittleEndian::read_u16(&data[16..18]),
            first_attribute_offset,
            flags: LittleEndian::read_u16(&data[22..24]),
            used_size: LittleEndian::read_u32(&data[24..28]),
            base_record_reference: LittleEndian::read_u64(&data[32..40]),
            record_number,
        })
    }

    pub fn is_in_use(&self) -> bool {
        self.flags & FLAG_IN_USE != 0
    }

    pub fn is_directory(&self) -> bool {
        self.flags & FLAG_DIRECTORY != 0
    }

    /// Граница итерации атрибутов.
    /// Битый used_size (меньше смещения первого атрибута) заменяется размером записи.
    pub fn attribute_area_end(&self, record_len: usize) -> usize {
        let used_end = std::cmp::min(self.used_size as usize, record_len);
        if used_end < self.first_attribute_offset as usize {
            record_len
        } else {
            used_end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(signature: &[u8; 4]) -> Vec<u8> {
        let mut data = vec![0u8; 1024];
        data[0..4].copy_from_slice(signature);
        data[20..22].copy_from_slice(&0x38u16.to_le_bytes());
        data[22..24].copy_from_slice(&0x03u16.to_le_bytes());
        data[24..28].copy_from_slice(&0x100u32.to_le_bytes());
        data[44..48].copy_from_slice(&77u32.to_le_bytes());
        data
    }

    #[test]
    fn parses_flags_and_record_number() {
        let header = MftRecordHeader::parse(&blank(b"FILE")).unwrap();
        assert!(header.is_in_use());
        assert!(header.is_directory());
        assert_eq!(header.record_number, Some(77));
        assert_eq!(header.attribute_area_end(1024), 0x100);
    }

    #[test]
    fn rejects_corrupt_marker() {
        let err = MftRecordHeader::parse(&blank(b"BAAD")).unwrap_err();
        assert!(err.is_marked_corrupt());
        assert!(err.is_record_level());
    }

    #[test]
    fn rejects_short_header() {
        let err = MftRecordHeader::parse(&[0u8; 20]).unwrap_err();
        assert_eq!(err, DecodeError::TruncatedRecord { read: 20, expected: HEADER_LEN });
    }

    #[test]
    fn broken_used_size_falls_back_to_record_len() {
        let mut data = blank(b"FILE");
        data[24..28].copy_from_slice(&0x10u32.to_le_bytes());
        let header = MftRecordHeader::parse(&data).unwrap();
        assert_eq!(header.attribute_area_end(1024), 1024);
    }
}
