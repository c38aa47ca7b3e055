//! Entrypoint for the `clatxlat` binary.
//!
//! This binary drives the CLAT translation engine offline: it loads a mapping table from a config
//! file, then translates hex-encoded packets read from a file or STDIN.

use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use args::clatxlat::{Args, Command, TrafficDirection};
use clap::Parser;
use clat_map::{MappingStore, MappingTable};
use clat_xlat::{PacketView, Translator, MAX_HEADER_GROWTH};
use common::{config::Config, hex, logging::enable_logger, profiler::start_puffin_server};
use pnet::packet::ethernet::EtherTypes;

mod args;
mod common;

/// The largest packet an IP length field can describe
const MAX_PACKET_LEN: usize = u16::MAX as usize;

pub fn main() {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    if let Err(error) = enable_logger(args.verbose) {
        eprintln!("Failed to initialize logging: {error}");
    }

    // Start the profiler if enabled
    let _server = start_puffin_server(&args.profiler_args);

    // Build the mapping table
    let store = match load_table(&args) {
        Ok(table) => MappingStore::new(table),
        Err(error) => {
            log::error!("{}", error);
            std::process::exit(1);
        }
    };

    let result = match &args.command {
        Command::Translate {
            device,
            direction,
            input,
        } => translate(&store, *device, *direction, input.as_deref()),
        Command::Show => {
            show(&store.snapshot());
            Ok(())
        }
    };

    // Dump metrics if requested
    if args.metrics {
        eprint!("{}", clat_metrics::render());
    }

    if let Err(error) = result {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

/// Loads the config file, applying any overrides from the command line
fn load_table(args: &Args) -> Result<MappingTable, common::config::ConfigError> {
    let config = Config::load(&args.config_file)?;
    let mut table = config.build_table()?;
    if let Some(plat) = args.plat {
        log::info!("Overriding PLAT prefix with {}", plat);
        table.set_plat_network(plat)?;
    }
    Ok(table)
}

/// Translates every packet in the input, writing successes to STDOUT
fn translate(
    store: &MappingStore,
    device: usize,
    direction: TrafficDirection,
    input: Option<&Path>,
) -> std::io::Result<()> {
    let translator = Translator::new(store.reader());
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(std::io::stdin().lock()),
    };
    let mut stdout = std::io::stdout().lock();

    // Every packet is staged behind enough headroom to grow into IPv6
    let mut buffer = vec![0u8; MAX_HEADER_GROWTH + MAX_PACKET_LEN];
    let ethertype = match direction {
        TrafficDirection::Inbound => EtherTypes::Ipv6,
        TrafficDirection::Outbound => EtherTypes::Ipv4,
    };

    let mut translated = 0usize;
    let mut rejected = 0usize;
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let packet = match hex::decode(line) {
            Ok(packet) if packet.len() <= MAX_PACKET_LEN => packet,
            Ok(packet) => {
                log::warn!(
                    "Line {}: {} byte packet is too large",
                    line_number + 1,
                    packet.len()
                );
                rejected += 1;
                continue;
            }
            Err(error) => {
                log::warn!("Line {}: {}", line_number + 1, error);
                rejected += 1;
                continue;
            }
        };
        buffer[MAX_HEADER_GROWTH..MAX_HEADER_GROWTH + packet.len()].copy_from_slice(&packet);

        let result = PacketView::new(&mut buffer, MAX_HEADER_GROWTH, packet.len(), ethertype)
            .and_then(|mut view| {
                match direction {
                    TrafficDirection::Inbound => translator.translate_inbound(device, &mut view),
                    TrafficDirection::Outbound => translator.translate_outbound(device, &mut view),
                }?;
                Ok(hex::encode(view.bytes()))
            });

        match result {
            Ok(output) => {
                writeln!(stdout, "{output}")?;
                translated += 1;
            }
            Err(reason) => {
                log::warn!("Line {}: packet rejected: {}", line_number + 1, reason);
                rejected += 1;
            }
        }

        profiling::finish_frame!();
    }

    log::info!("Translated {} packets, rejected {}", translated, rejected);
    Ok(())
}

/// Prints a summary of the mapping table
fn show(table: &MappingTable) {
    println!("PLAT prefix: {}/96", table.plat_prefix());
    for (index, mapping) in table.devices() {
        println!(
            "Device {}: {} <-> {} via {} ({})",
            index,
            mapping.client_ipv4,
            mapping.client_ipv6,
            mapping.forwarding_target.as_deref().unwrap_or("-"),
            if mapping.enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
    }
}
