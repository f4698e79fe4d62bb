use clap::Parser;
use groutpdf::{transpile, FontDirs};
use std::io::{stdin, stdout};

#[derive(Parser)]
#[command(
    name = "groutpdf",
    about = "Translate typesetter intermediate output on stdin into PDF on stdout"
)]
struct Args {
    /// Enable debug diagnostics on standard error
    #[arg(short = 'd')]
    debug: bool,
    /// Enable warning diagnostics on standard error
    #[arg(short = 'w')]
    warnings: bool,
}

fn main() {
    // Unknown options are warned about and dropped rather than refused;
    // the filter must keep running under wrapper scripts that pass
    // device options through.
    let mut known: Vec<String> = vec!["groutpdf".to_string()];
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-d" | "-w" | "-dw" | "-wd" | "-h" | "--help" => known.push(arg),
            _ => eprintln!("groutpdf: ignoring unknown option '{}'", arg),
        }
    }
    let args = Args::parse_from(known);

    let level = if args.debug {
        log::LevelFilter::Debug
    } else if args.warnings {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Error
    };
    env_logger::Builder::new().filter_level(level).init();

    let stdin = stdin();
    let stdout = stdout();
    if let Err(err) = transpile(stdin.lock(), stdout.lock(), FontDirs::system()) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
