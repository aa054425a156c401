use clap::{Parser, Subcommand};

const EXAMPLES: &str = r#"
ПРИМЕРЫ ИСПОЛЬЗОВАНИЯ:

  1. АНАЛИЗ (Parse)
     Декодировать дамп MFT в JSONL и выгрузить резидентные файлы:
     mft_entry_forge parse --path mft.raw --out-json report.jsonl --resident-out resident\

     Или коротко, с настройками из файла и 4 потоками:
     mft_entry_forge parse -p mft.raw -j report.jsonl -c parser.json -t 4

  2. ОДНА ЗАПИСЬ (Inspect)
     Показать метаданные записи номер 42:
     mft_entry_forge inspect -p mft.raw -n 42

Размер записи и сектора берутся из mft.raw.meta.json (по умолчанию 1024 и 512).
Подробность журнала задаётся переменной RUST_LOG (например RUST_LOG=debug).
"#;

#[derive(Parser, Debug)]
#[command(name = "mft_entry_forge")]
#[command(version)]
#[command(about = "Декодер записей NTFS MFT: метаданные, data runs, резидентное содержимое")]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Декодирует все записи дампа MFT в JSONL (1 строка - 1 запись)
    Parse {
        /// Путь к raw MFT
        #[arg(short, long)]
        path: String,
        /// Путь к итоговому JSONL
        #[arg(short = 'j', long)]
        out_json: String,
        /// JSON с настройками разбора (extractResidentFiles, ...)
        #[arg(short, long)]
        config: Option<String>,
        /// Каталог для резидентных файлов; включает их извлечение
        #[arg(short, long)]
        resident_out: Option<String>,
        /// Число потоков декодирования (по умолчанию - по числу ядер)
        #[arg(short, long)]
        threads: Option<usize>,
        /// Не применять fixups (update sequence array)
        #[arg(long)]
        no_fixups: bool,
    },
    /// Декодирует одну запись и печатает её метаданные
    Inspect {
        /// Путь к raw MFT
        #[arg(short, long)]
        path: String,
        /// Номер записи в дампе
        #[arg(short = 'n', long)]
        row: u64,
        /// Не применять fixups (update sequence array)
        #[arg(long)]
        no_fixups: bool,
    },
}
