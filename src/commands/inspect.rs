use std::path::Path;

use mft_entry_forge::mft::{extract_resident, FixupOutcome, MftRecordDecoder, RecordSource};
use mft_entry_forge::models::SourceMeta;
use mft_entry_forge::{Pipeline, Result};

pub fn run(path: &str, row: u64, no_fixups: bool) -> Result<()> {
    let mft_path = Path::new(path);
    let meta = SourceMeta::load_for(mft_path);
    let mut source = RecordSource::open(mft_path, meta.record_length())?;
    let record = source.fetch(row)?;

    let mut pipeline = Pipeline::new(MftRecordDecoder::new(meta.record_length()));
    if !no_fixups {
        pipeline = pipeline.with_fixups(meta.bytes_per_sector);
    }
    let decoded = pipeline.decode_record(row, record);
    if decoded.fixup == Some(FixupOutcome::TornWrite) {
        println!("[!] Запись {}: torn write", row);
    }
    let entry = decoded.outcome?;

    println!("[*] Запись {} (sequence {})", entry.row_id(), entry.sequence_number());
    for (key, value) in entry.metadata().iter() {
        println!("    {:<22} {}", key, value);
    }
    if let Some(parent) = entry.parent() {
        println!("    {:<22} {} (seq {})", "Parent", parent.record, parent.sequence);
    }
    if let Some(base) = entry.base_reference() {
        println!("    {:<22} {} (seq {})", "BaseRecord", base.record, base.sequence);
    }
    match extract_resident(&entry, &decoded.record) {
        Ok(Some(content)) => println!("    {:<22} {} байт", "ResidentBytes", content.len()),
        Ok(None) => {}
        Err(e) => println!("[!] {}", e),
    }
    for fault in entry.diagnostics() {
        println!("[!] {}", fault);
    }
    Ok(())
}
