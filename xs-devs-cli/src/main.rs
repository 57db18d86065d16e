use clap::Parser;
use std::io::{self, Write};
use std::process;
use xs_devs_cli::{run, usage, Cli};
use xs_devs_core::config::Config;
use xs_devs_core::{logging, MarkerStore};
use xs_devs_hal::LinuxHal;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(_) => {
            let prog = args.first().map(String::as_str).unwrap_or("xs-devs");
            print!("{}", usage(prog));
            let _ = io::stdout().flush();
            process::exit(1);
        }
    };

    let (config, config_err) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) if cli.command.is_best_effort() => (Config::fallback(), Some(err)),
        Err(err) => return Err(err),
    };
    logging::init(config.log_file.as_deref());
    if let Some(err) = config_err {
        log::warn!("{:#}; continuing with default configuration", err);
    }
    log::debug!("config: {:?}", config);

    let hal = LinuxHal::new(config.hal_paths());
    let store = MarkerStore::new(&config.marker_root);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&cli.command, &hal, &store, &mut out)
}
