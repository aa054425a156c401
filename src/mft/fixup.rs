use byteorder::{ByteOrder, LittleEndian};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixupOutcome {
    Applied,
    /// Хвосты секторов не совпали с USN: запись была записана не полностью
    TornWrite,
    /// Массив USA отсутствует или битый; буфер не тронут
    Skipped,
}

/// Восстанавливает последние 2 байта каждого сектора из массива update sequence.
///
/// Никогда не отвергает запись: при битом массиве возвращает `Skipped`,
/// и запись декодируется как есть.
pub fn apply_fixups(data: &mut [u8], bytes_per_sector: u16) -> FixupOutcome {
    let bytes_per_sector = bytes_per_sector as usize;
    if data.len() < 8 || bytes_per_sector < 2 || data.len() % bytes_per_sector != 0 {
        return FixupOutcome::Skipped;
    }
    let usa_offset = LittleEndian::read_u16(&data[4..6]) as usize;
    let usa_count = LittleEndian::read_u16(&data[6..8]) as usize;
    if usa_count < 2 || usa_offset + usa_count * 2 > data.len() {
        return FixupOutcome::Skipped;
    }

    let sectors = data.len() / bytes_per_sector;
    let fixups = std::cmp::min(usa_count - 1, sectors);
    // Хвост сектора не должен попадать в сам массив USA
    if (1..=fixups).any(|i| {
        let tail = i * bytes_per_sector - 2;
        tail < usa_offset + usa_count * 2 && tail + 2 > usa_offset
    }) {
        return FixupOutcome::Skipped;
    }

    let usn = [data[usa_offset], data[usa_offset + 1]];
    let mut torn_write = false;

    for i in 1..=fixups {
        let tail = i * bytes_per_sector - 2;
        if data[tail..tail + 2] != usn {
            torn_write = true;
        }
        let fixup = usa_offset + i * 2;
        data[tail] = data[fixup];
        data[tail + 1] = data[fixup + 1];
    }

    if torn_write {
        FixupOutcome::TornWrite
    } else {
        FixupOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protected_record() -> Vec<u8> {
        let mut data = vec![0u8; 1024];
        data[0..4].copy_from_slice(b"FILE");
        data[4..6].copy_from_slice(&0x30u16.to_le_bytes());
        data[6..8].copy_from_slice(&3u16.to_le_bytes());
        // USN = 0x0007, исходные хвосты секторов: AA BB и CC DD
        data[0x30..0x36].copy_from_slice(&[0x07, 0x00, 0xAA, 0xBB, 0xCC, 0xDD]);
        data[510..512].copy_from_slice(&[0x07, 0x00]);
        data[1022..1024].copy_from_slice(&[0x07, 0x00]);
        data
    }

    #[test]
    fn restores_sector_tails() {
        let mut data = protected_record();
        assert_eq!(apply_fixups(&mut data, 512), FixupOutcome::Applied);
        assert_eq!(&data[510..512], &[0xAA, 0xBB]);
        assert_eq!(&data[1022..1024], &[0xCC, 0xDD]);
    }

    #[test]
    fn detects_torn_write() {
        let mut data = protected_record();
        data[1022] = 0x99;
        assert_eq!(apply_fixups(&mut data, 512), FixupOutcome::TornWrite);
        assert_eq!(&data[1022..1024], &[0xCC, 0xDD]);
    }

    #[test]
    fn missing_array_leaves_buffer_untouched() {
        let mut data = vec![0u8; 1024];
        data[0..4].copy_from_slice(b"FILE");
        let before = data.clone();
        assert_eq!(apply_fixups(&mut data, 512), FixupOutcome::Skipped);
        assert_eq!(data, before);
    }
}
