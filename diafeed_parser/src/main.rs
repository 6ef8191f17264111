use clap::Parser;
use diafeed_parser::{DiafeedConverter, Opt};
use log::LevelFilter;

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        _ => {
            builder.filter_level(LevelFilter::Debug);
        }
    }
    builder.init();
}

fn main() -> std::process::ExitCode {
    let opt = Opt::parse();
    init_logging(opt.verbose);
    log::debug!("{opt}");

    let mut converter = DiafeedConverter::new();
    match converter.run_with_opt(&opt) {
        Ok(_) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            std::process::ExitCode::FAILURE
        }
    }
}
