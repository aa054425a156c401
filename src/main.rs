mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Parse {
            path,
            out_json,
            config,
            resident_out,
            threads,
            no_fixups,
        } => commands::parse::run(commands::parse::ParseArgs {
            path,
            out_json,
            config: config.as_deref(),
            resident_out: resident_out.as_deref(),
            threads: *threads,
            no_fixups: *no_fixups,
        }),
        Commands::Inspect { path, row, no_fixups } => {
            commands::inspect::run(path, *row, *no_fixups)
        }
    };

    if let Err(e) = result {
        eprintln!("[!] КРИТИЧЕСКАЯ ОШИБКА: {}", e);
        std::process::exit(1);
    }
}
