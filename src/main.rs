use std::sync::Arc;

use anyhow::Context;
use goatd_usb::log_collector::{ensure_logs_dir_exists, get_global_logs_path};
use goatd_usb::system::tools::{self, REQUIRED_TOOLS};
use goatd_usb::{
    ConsoleEcho, LogCollector, PipelineOutcome, ProvisionError, ProvisioningPipeline, SettingsManager,
    SystemRunner, TerminalPrompter,
};

#[tokio::main]
async fn main() {
    // =========================================================================
    // LOGGING INITIALIZATION - MUST BE FIRST
    // =========================================================================
    let log_collector = match init_logging() {
        Ok(collector) => Some(collector),
        Err(e) => {
            eprintln!("Warning: session logging disabled: {:#}", e);
            // Milestones still reach the terminal
            if log::set_boxed_logger(Box::new(ConsoleEcho)).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
            None
        }
    };

    println!("GOATd USB {} - Windows 11 bootable USB creator", goatd_usb::VERSION);
    println!("Ensure wimlib is installed (`brew install wimlib`)");

    let code = match run().await {
        Ok(PipelineOutcome::Completed(report)) => {
            for chunk in &report.chunks {
                log::info!("[Main] Chunk written: {}", chunk.display());
            }
            println!("Success! The USB is now bootable with Windows 11.");
            0
        }
        Ok(PipelineOutcome::Aborted) => 0,
        Err(e) => {
            match e.downcast_ref::<ProvisionError>() {
                Some(err) => eprintln!("Error: {}", err.user_message()),
                None => eprintln!("Error: {:#}", e),
            }
            1
        }
    };

    // =========================================================================
    // SHUTDOWN - flush session logs before the process exits
    // =========================================================================
    if let Some(collector) = log_collector {
        log::info!("[Main] Exiting with status {}", code);
        if let Err(e) = collector.wait_for_empty().await {
            eprintln!("Warning: failed to flush session log: {}", e);
        }
    }
    std::process::exit(code);
}

/// Wire a `LogCollector` in as the global logger for the `log` crate.
fn init_logging() -> anyhow::Result<LogCollector> {
    let log_dir = get_global_logs_path().map_err(anyhow::Error::msg)?;
    ensure_logs_dir_exists(&log_dir).map_err(anyhow::Error::msg)?;
    let collector = LogCollector::new(log_dir, true).map_err(anyhow::Error::msg)?;

    log::set_boxed_logger(Box::new(collector.clone()))
        .map(|()| log::set_max_level(log::LevelFilter::Debug))
        .context("failed to register session logger")?;

    log::info!(
        "[Main] Session log: {}",
        collector.full_log_path().display()
    );
    Ok(collector)
}

async fn run() -> anyhow::Result<PipelineOutcome> {
    let config = SettingsManager::load().context("failed to load settings")?;
    let runner = Arc::new(SystemRunner::new(config.tool_timeout()));

    let missing = tools::missing_tools(runner.as_ref(), &REQUIRED_TOOLS).await;
    if missing.contains(&tools::WIMLIB.to_string()) {
        log::warn!("wimlib-imagex not found; install it with `brew install wimlib`");
    }

    let mut pipeline = ProvisioningPipeline::new(config, runner)?;
    let mut prompt = TerminalPrompter::new();
    let outcome = pipeline.run_interactive(&mut prompt).await?;
    Ok(outcome)
}
