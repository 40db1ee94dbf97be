use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use lib_gobblers::prelude::*;

fn main() -> Result<()> {
    // Initialize program options and environment.
    let _ = dotenvy::dotenv();
    let options = GobblersOptions::parse();
    let _logger = Logger::try_with_env_or_str(options.log_level.clone().unwrap_or("info".into()).as_str())?
        .write_mode(WriteMode::BufferAndFlush)
        .log_to_stderr()
        .adaptive_format_for_stderr(match cfg!(debug_assertions) {
            true => AdaptiveFormat::WithThread,
            _ => AdaptiveFormat::Default,
        })
        .set_palette("b196;208;195;111;67".to_owned())
        .start()?;

    let store: Option<Box<dyn CheckpointStore>> = match &options.checkpoint_path {
        Some(path) => match SledCheckpointStore::open(path) {
            Ok(store) => Some(Box::new(store)),
            Err(e) => {
                log::warn!("failed to open checkpoint store at {path}, proceeding with an empty table: {e}");
                None
            }
        },
        None => None,
    };

    let mut server = GobblersServer::new(options, store)?;

    let cancel = server.cancel_flag();
    ctrlc::set_handler(move || {
        log::info!("shutdown requested, finishing the current frame then checkpointing");
        request_shutdown(&cancel);
    })
    .context("failed to install signal handler")?;

    if let Err(e) = server.run() {
        log::error!("fatal error: {e}");
        return Err(e);
    }
    Ok(())
}
