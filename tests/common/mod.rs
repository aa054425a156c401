#![allow(dead_code)]

pub const RECORD_LEN: usize = 1024;
pub const SECTOR_LEN: usize = 512;
const FIRST_ATTRIBUTE: usize = 0x38;
const USA_OFFSET: usize = 0x30;

/// FILETIME для 2021-03-04 05:06:07 UTC
pub const SAMPLE_FILETIME: u64 = 132_593_079_670_000_000;

fn align8(n: usize) -> usize {
    (n + 7) & !7
}

/// Сборщик синтетических записей MFT для тестов.
pub struct RecordBuilder {
    buf: Vec<u8>,
    cursor: usize,
    flags: u16,
    terminated: bool,
    next_id: u16,
    usn: Option<u16>,
    torn: bool,
}

impl RecordBuilder {
    pub fn new() -> Self {
        let mut buf = vec![0u8; RECORD_LEN];
        buf[0..4].copy_from_slice(b"FILE");
        buf[4..6].copy_from_slice(&0x30u16.to_le_bytes());
        buf[16..18].copy_from_slice(&1u16.to_le_bytes());
        buf[20..22].copy_from_slice(&(FIRST_ATTRIBUTE as u16).to_le_bytes());
        buf[28..32].copy_from_slice(&(RECORD_LEN as u32).to_le_bytes());
        Self {
            buf,
            cursor: FIRST_ATTRIBUTE,
            flags: 0x01,
            terminated: true,
            next_id: 0,
            usn: None,
            torn: false,
        }
    }

    pub fn signature(mut self, signature: &[u8; 4]) -> Self {
        self.buf[0..4].copy_from_slice(signature);
        self
    }

    pub fn in_use(mut self, in_use: bool) -> Self {
        self.flags = (self.flags & !0x01) | u16::from(in_use);
        self
    }

    pub fn directory(mut self, directory: bool) -> Self {
        self.flags = (self.flags & !0x02) | (u16::from(directory) << 1);
        self
    }

    pub fn sequence(mut self, sequence: u16) -> Self {
        self.buf[16..18].copy_from_slice(&sequence.to_le_bytes());
        self
    }

    /// Защищает хвосты секторов значением USN (update sequence array).
    pub fn protect(mut self, usn: u16) -> Self {
        self.usn = Some(usn);
        self
    }

    /// Хвост последнего сектора не совпадает с USN, как при прерванной записи.
    pub fn torn(mut self) -> Self {
        self.torn = true;
        self
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn write_common(
        &mut self,
        type_code: u32,
        length: usize,
        non_resident: bool,
        name: Option<&str>,
        name_offset: usize,
    ) {
        let at = self.cursor;
        let units: Vec<u16> = name.map(|n| n.encode_utf16().collect()).unwrap_or_default();
        self.buf[at..at + 4].copy_from_slice(&type_code.to_le_bytes());
        self.buf[at + 4..at + 8].copy_from_slice(&(length as u32).to_le_bytes());
        self.buf[at + 8] = u8::from(non_resident);
        self.buf[at + 9] = units.len() as u8;
        self.buf[at + 10..at + 12].copy_from_slice(&(name_offset as u16).to_le_bytes());
        self.buf[at + 14..at + 16].copy_from_slice(&self.next_id.to_le_bytes());
        for (i, unit) in units.iter().enumerate() {
            let pos = at + name_offset + i * 2;
            self.buf[pos..pos + 2].copy_from_slice(&unit.to_le_bytes());
        }
        self.next_id += 1;
    }

    /// Resident атрибут; значение кладётся по абсолютному смещению `value_at`.
    pub fn resident_at(
        mut self,
        type_code: u32,
        name: Option<&str>,
        value_at: usize,
        value: &[u8],
    ) -> Self {
        let at = self.cursor;
        let value_offset = value_at - at;
        let length = align8(value_offset + value.len());
        self.write_common(type_code, length, false, name, 0x18);
        self.buf[at + 16..at + 20].copy_from_slice(&(value.len() as u32).to_le_bytes());
        self.buf[at + 20..at + 22].copy_from_slice(&(value_offset as u16).to_le_bytes());
        self.buf[value_at..value_at + value.len()].copy_from_slice(value);
        self.cursor = at + length;
        self
    }

    pub fn resident(self, type_code: u32, name: Option<&str>, value: &[u8]) -> Self {
        let name_units = name.map(|n| n.encode_utf16().count()).unwrap_or(0);
        let value_at = self.cursor + align8(0x18 + name_units * 2);
        self.resident_at(type_code, name, value_at, value)
    }

    pub fn standard_information(self, times: [u64; 4]) -> Self {
        let mut body = vec![0u8; 72];
        for (i, t) in times.iter().enumerate() {
            body[i * 8..i * 8 + 8].copy_from_slice(&t.to_le_bytes());
        }
        self.resident(0x10, None, &body)
    }

    pub fn file_name(self, parent: u64, namespace: u8, name: &str) -> Self {
        let units: Vec<u16> = name.encode_utf16().collect();
        let mut body = vec![0u8; 66];
        body[0..8].copy_from_slice(&parent.to_le_bytes());
        body[64] = units.len() as u8;
        body[65] = namespace;
        for unit in units {
            body.extend_from_slice(&unit.to_le_bytes());
        }
        self.resident(0x30, None, &body)
    }

    pub fn resident_data(self, content: &[u8]) -> Self {
        self.resident(0x80, None, content)
    }

    pub fn named_resident_data(self, name: &str, content: &[u8]) -> Self {
        self.resident(0x80, Some(name), content)
    }

    pub fn non_resident_data(mut self, runs: &[u8], real_size: u64) -> Self {
        let at = self.cursor;
        let length = align8(0x40 + runs.len());
        self.write_common(0x80, length, true, None, 0x40);
        self.buf[at + 0x20..at + 0x22].copy_from_slice(&0x40u16.to_le_bytes());
        let allocated = align8(real_size as usize) as u64;
        self.buf[at + 0x28..at + 0x30].copy_from_slice(&allocated.to_le_bytes());
        self.buf[at + 0x30..at + 0x38].copy_from_slice(&real_size.to_le_bytes());
        self.buf[at + 0x38..at + 0x40].copy_from_slice(&real_size.to_le_bytes());
        self.buf[at + 0x40..at + 0x40 + runs.len()].copy_from_slice(runs);
        self.cursor = at + length;
        self
    }

    /// Атрибут неизвестного типа с произвольным телом.
    pub fn unknown_attribute(self, type_code: u32) -> Self {
        self.resident(type_code, None, &[0xAB; 16])
    }

    /// Заголовок атрибута с заявленной длиной, выходящей за пределы записи.
    /// Маркер конца после него не пишется.
    pub fn overrunning_attribute(mut self, type_code: u32) -> Self {
        let at = self.cursor;
        self.write_common(type_code, 0x1000, false, None, 0x18);
        self.buf[at + 16..at + 20].copy_from_slice(&5u32.to_le_bytes());
        self.buf[at + 20..at + 22].copy_from_slice(&0x18u16.to_le_bytes());
        self.terminated = false;
        self
    }

    /// Заголовок атрибута с длиной меньше общего заголовка (16 байт).
    /// Курсор сдвигается на 16, чтобы за ним можно было разместить ещё атрибуты.
    pub fn short_attribute(mut self, type_code: u32, length: u32) -> Self {
        let at = self.cursor;
        self.buf[at..at + 4].copy_from_slice(&type_code.to_le_bytes());
        self.buf[at + 4..at + 8].copy_from_slice(&length.to_le_bytes());
        self.cursor = at + 16;
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.buf[22..24].copy_from_slice(&self.flags.to_le_bytes());
        let used = if self.terminated {
            let at = self.cursor;
            self.buf[at..at + 4].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
            at + 8
        } else {
            RECORD_LEN
        };
        self.buf[24..28].copy_from_slice(&(used as u32).to_le_bytes());
        if let Some(usn) = self.usn {
            self.apply_protection(usn);
        }
        self.buf
    }

    fn apply_protection(&mut self, usn: u16) {
        let sectors = RECORD_LEN / SECTOR_LEN;
        self.buf[6..8].copy_from_slice(&((sectors + 1) as u16).to_le_bytes());
        self.buf[USA_OFFSET..USA_OFFSET + 2].copy_from_slice(&usn.to_le_bytes());
        for i in 1..=sectors {
            let tail = i * SECTOR_LEN - 2;
            let slot = USA_OFFSET + i * 2;
            let original = [self.buf[tail], self.buf[tail + 1]];
            self.buf[slot..slot + 2].copy_from_slice(&original);
            let marker = if self.torn && i == sectors { !usn } else { usn };
            self.buf[tail..tail + 2].copy_from_slice(&marker.to_le_bytes());
        }
    }
}

/// Типичная запись активного файла с именем и резидентным содержимым.
pub fn sample_file(name: &str, content: &[u8]) -> Vec<u8> {
    RecordBuilder::new()
        .standard_information([SAMPLE_FILETIME; 4])
        .file_name(5 | (5 << 48), 1, name)
        .resident_data(content)
        .build()
}
