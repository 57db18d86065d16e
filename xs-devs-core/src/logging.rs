use std::path::Path;

/// Initialise `env_logger`. `RUST_LOG` wins over the default `warn` filter.
///
/// Output goes to `log_file` when it can be opened for append, else stderr;
/// stdout is reserved for command results.
pub fn init(log_file: Option<&Path>) {
    use env_logger::Target;
    use std::fs;

    let target = log_file
        .and_then(|path| {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).ok()?;
            }
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        })
        .map(|file| Target::Pipe(Box::new(file)))
        .unwrap_or(Target::Stderr);

    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .target(target)
        .try_init();
}
