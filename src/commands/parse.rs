use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::info;

use mft_entry_forge::extraction::{DirectorySink, ExtractionBridge, ParentMetadata};
use mft_entry_forge::mft::{MftRecordDecoder, RecordSource};
use mft_entry_forge::models::SourceMeta;
use mft_entry_forge::output::JsonlWriter;
use mft_entry_forge::{ParserConfig, Pipeline, Result};

pub struct ParseArgs<'a> {
    pub path: &'a str,
    pub out_json: &'a str,
    pub config: Option<&'a str>,
    pub resident_out: Option<&'a str>,
    pub threads: Option<usize>,
    pub no_fixups: bool,
}

pub fn run(args: ParseArgs<'_>) -> Result<()> {
    println!("[*] Запуск Parse");

    let mft_path = Path::new(args.path);
    let meta = SourceMeta::load_for(mft_path);
    let mut config = match args.config {
        Some(path) => ParserConfig::from_json_file(path)?,
        None => ParserConfig::default(),
    };
    if args.resident_out.is_some() {
        config.extract_resident_files = true;
    }
    if config.extract_non_resident_files {
        info!(
            "extractNonResidentFiles (лимит {}) зарезервирован и не применяется",
            config.non_resident_files_max_length
        );
    }

    let source = RecordSource::open(mft_path, meta.record_length())?;
    println!(
        " -> Записей: {} (размер записи {} байт)",
        source.total_records(),
        source.record_length()
    );

    let mut pipeline = Pipeline::new(MftRecordDecoder::new(meta.record_length()));
    if !args.no_fixups {
        pipeline = pipeline.with_fixups(meta.bytes_per_sector);
    }

    let bridge = match (config.extract_resident_files, args.resident_out) {
        (true, Some(dir)) => {
            Some(ExtractionBridge::new(config.clone(), DirectorySink::create(dir)?))
        }
        (true, None) => {
            info!("extractResidentFiles включён, но каталог не задан (--resident-out)");
            None
        }
        _ => None,
    };
    let parent = ParentMetadata {
        carved_by: meta.carved_by.clone(),
    };

    let mut writer = JsonlWriter::new(BufWriter::new(File::create(args.out_json)?));
    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = args.threads {
        pool = pool.num_threads(threads);
    }
    let pool = pool.build()?;

    let stream = source.into_stream()?;
    let summary = pool.install(|| pipeline.run(stream, &mut writer, bridge.as_ref(), &parent))?;

    println!("[+] Декодировано записей: {}", summary.decoded);
    println!(
        "    пустых слотов: {}, отброшено: {}, обрезано: {}",
        summary.empty_slots, summary.rejected, summary.truncated
    );
    println!(
        "    с повреждёнными атрибутами: {}, torn write: {}",
        summary.with_faults, summary.torn_writes
    );
    if bridge.is_some() {
        println!(
            "    извлечено файлов: {}, пропущено: {}",
            summary.extracted, summary.extraction_failed
        );
    }
    println!("[+] Отчёт: {}", args.out_json);
    Ok(())
}
