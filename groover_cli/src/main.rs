mod cli;
mod error_fmt;
mod rt;
mod run;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use groover_core::StopCause;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = cli::Args::parse();

    let cfg = match &args.config {
        Some(path) => {
            let cfg = groover_config::Config::load(path)?;
            cfg.validate()?;
            cfg
        }
        None => groover_config::Config::default(),
    };

    // Keep the guard alive for the process lifetime; dropping it would lose
    // buffered log lines.
    let _log_guard = init_tracing(&args, &cfg.logging)?;
    rt::setup_rt_once(args.rt);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || {
            tracing::info!("ctrl-c received, shutting down");
            flag.store(true, Ordering::Relaxed);
        })?;
    }

    match run::run(&args, &cfg, shutdown) {
        Ok(summary) => {
            report(&args, &summary);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", error_fmt::humanize(&err));
            Err(err)
        }
    }
}

fn report(args: &cli::Args, summary: &groover_core::RunSummary) {
    let cause = match summary.cause {
        StopCause::Shutdown => "shutdown",
        StopCause::Expired => "expired",
    };
    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "mode": args.mode.name(),
                "cause": cause,
                "blocks": summary.blocks,
                "beats": summary.beats,
                "commands": summary.commands,
                "stabilizer_ticks": summary.stabilizer_ticks,
            })
        );
    } else {
        println!(
            "{} finished ({cause}): {} blocks, {} beats, {} commands, {} stabilizer ticks",
            args.mode.name(),
            summary.blocks,
            summary.beats,
            summary.commands,
            summary.stabilizer_ticks
        );
    }
}

fn init_tracing(
    args: &cli::Args,
    logging: &groover_config::Logging,
) -> eyre::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::EnvFilter;

    let level = args
        .log_level
        .as_deref()
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file = args
        .log_file
        .clone()
        .or_else(|| logging.file.as_ref().map(PathBuf::from));
    if let Some(path) = file {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let name = path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| "groover.log".into());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(writer)
            .init();
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(None)
    }
}
