use svn_agent::{cli, config, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());

    let loaded = config::load_or_default(cli.config.as_deref());
    let cfg = loaded.config;
    let _telemetry_guard = init_tracing(cli.verbose, &cfg);
    if let Some(err) = loaded.error {
        eprintln!("config load failed, using defaults: {err}");
        tracing::warn!("config load failed, using defaults: {err}");
    }
    for warning in &loaded.warnings {
        eprintln!("svn-agent: {warning}");
        tracing::warn!("{warning}");
    }

    if let Err(e) = cli::run(cli, &cfg) {
        tracing::error!("error: {}", e);
        eprintln!("svn-agent: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, cfg: &config::Config) -> telemetry::TelemetryGuard {
    let mut logging = cfg.logging.clone();
    telemetry::apply_agent_logging_defaults(&mut logging);
    telemetry::init(telemetry::TelemetryConfig::new(verbose, logging))
}
