use std::env;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;

fn main() -> ExitCode {
    let argv: Vec<String> = env::args().skip(1).collect();

    let debug_hits = argv.iter().filter(|a| a.as_str() == "-d").count();
    let level = match debug_hits {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    match jsonwalk::driver::run(&argv) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
