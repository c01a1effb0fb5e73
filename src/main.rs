use arrango::cinfo;
use arrango::param;
use arrango::{load_instance, run_on_instance};
use flexi_logger::{Duplicate, FileSpec, Logger, LoggerHandle};
use log::{debug, error, info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn start_logger(param: &param::Param) -> Result<LoggerHandle, Box<dyn Error>> {
    let logger = Logger::try_with_str(&param.general.log_level)?;
    let handle = if param.general.log_base.is_empty() {
        logger.log_to_stderr().start()?
    } else {
        logger
            .log_to_file(
                FileSpec::default()
                    .basename(&param.general.log_base)
                    .suffix(&param.general.log_suffix),
            )
            .duplicate_to_stderr(Duplicate::Info)
            .start()?
    };
    Ok(handle)
}

/// Clears the running flag on SIGINT or SIGTERM; the evolution stops at the next generation
fn watch_signals(running: Arc<AtomicBool>) -> Result<(), Box<dyn Error>> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::spawn(move || {
        for signal in signals.forever() {
            warn!("Received signal {}, stopping after the current generation...", signal);
            running.store(false, Ordering::Relaxed);
        }
    });
    Ok(())
}

fn main() {
    let param_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "param.yaml".to_string());

    let param = match param::get(param_path.clone()) {
        Ok(param) => param,
        Err(e) => {
            eprintln!("Unable to read parameters from {}: {}", param_path, e);
            std::process::exit(1);
        }
    };

    let _logger = match start_logger(&param) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Unable to start logger: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "arrango {} | parameters {}",
        arrango::experiment::version(),
        param_path
    );

    let running = Arc::new(AtomicBool::new(true));
    if let Err(e) = watch_signals(Arc::clone(&running)) {
        warn!("Signal handling unavailable: {}", e);
    }

    let instance = match load_instance(&param) {
        Ok(instance) => instance,
        Err(e) => {
            error!("Unable to load instance {}: {}", param.data.instance, e);
            std::process::exit(1);
        }
    };

    let exp = match run_on_instance(&instance, &param, running) {
        Ok(exp) => exp,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    debug!("{}", exp.best.display(&instance));
    cinfo!(param.general.display_colorful, "{}", exp.display_results(&instance));

    if !param.data.output.is_empty() {
        match exp.to_output().save_json(&param.data.output) {
            Ok(_) => info!("Timetables saved to {}", param.data.output),
            Err(e) => error!("Unable to save timetables to {}: {}", param.data.output, e),
        }
    }

    if !param.general.save_exp.is_empty() {
        match exp.save_auto(&param.general.save_exp) {
            Ok(_) => info!("Experiment saved to {}", param.general.save_exp),
            Err(e) => error!("Unable to save experiment to {}: {}", param.general.save_exp, e),
        }
    }
}
