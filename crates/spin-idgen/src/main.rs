//! Prints distributed ids for this host.
//!
//! ```bash
//! MACHINE_ID_PROVIDER=property MACHINE_ID_INIT_PARAMS=machineId=7 spin-idgen -n 3 --explain
//! ```

mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};
use std::time::UNIX_EPOCH;

use clap::Parser;
use config::{CliArgs, IdGenConfig};
use spin_pk::{Backoff, DistributedIdGenerator, SystemClock, SystemEnv};
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = IdGenConfig::try_from(args)?;

    init_telemetry(config.log_format)?;

    let generator = DistributedIdGenerator::from_config(&config.generator, &SystemEnv, SystemClock)?;
    log_startup_info(&config, &generator);

    let mut out = BufWriter::new(io::stdout().lock());
    for _ in 0..config.count {
        let id = generator.next_id(Backoff::Yield)?;
        if config.explain {
            let expanded = generator.expand_id(id)?;
            let issued_at = generator
                .trans_time(expanded.time())
                .duration_since(UNIX_EPOCH)?
                .as_millis();
            writeln!(out, "{id}\t{expanded}\tissued_at_ms={issued_at}")?;
        } else {
            writeln!(out, "{id}")?;
        }
    }
    out.flush()?;
    Ok(())
}

fn log_startup_info(config: &IdGenConfig, generator: &DistributedIdGenerator<SystemClock>) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting id generator with full config: {:#?}", config);
    }
    tracing::info!(
        machine_id = generator.machine_id(),
        id_type = %generator.id_type(),
        provider = %config.generator.provider,
        "Resolved machine id"
    );
}
