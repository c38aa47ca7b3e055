use std::path::PathBuf;

use ipnet::Ipv6Net;

use super::ProfilerArgs;
use crate::common::plat::parse_plat_prefix;

#[derive(Debug, clap::Parser)]
#[clap(author, version, about="Stateless CLAT header translator", long_about = None)]
pub struct Args {
    /// Path to the JSON file describing the address mapping table
    #[clap(short = 'c', long = "config")]
    pub config_file: PathBuf,

    /// Override the PLAT prefix from the config file
    #[clap(long, value_parser = parse_plat_prefix)]
    pub plat: Option<Ipv6Net>,

    /// Print prometheus metrics to STDERR before exiting
    #[clap(long)]
    pub metrics: bool,

    #[command(flatten)]
    pub profiler_args: ProfilerArgs,

    /// Enable verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Translate hex-encoded packets, one per line, printing the results as hex
    Translate {
        /// Index of the device the packets belong to
        #[clap(short, long, default_value_t = 0)]
        device: usize,

        /// Which way the packets are travelling
        #[clap(long, value_enum)]
        direction: TrafficDirection,

        /// File to read packets from. Packets are read from STDIN if omitted
        input: Option<PathBuf>,
    },

    /// Print the mapping table described by the config file
    Show,
}

/// Direction of traffic relative to the local applications
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TrafficDirection {
    /// IPv6 packets arriving from the network
    Inbound,
    /// IPv4 packets sent by applications
    Outbound,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_parse_translate() {
        let args = Args::try_parse_from([
            "clatxlat",
            "--config",
            "clat.json",
            "--plat",
            "2001:db8:64::/96",
            "translate",
            "--device",
            "2",
            "--direction",
            "inbound",
            "packets.txt",
        ])
        .unwrap();

        assert_eq!(args.config_file, PathBuf::from("clat.json"));
        assert_eq!(args.plat, Some("2001:db8:64::/96".parse().unwrap()));
        match args.command {
            Command::Translate {
                device,
                direction,
                input,
            } => {
                assert_eq!(device, 2);
                assert_eq!(direction, TrafficDirection::Inbound);
                assert_eq!(input, Some(PathBuf::from("packets.txt")));
            }
            Command::Show => panic!("Expected the translate subcommand"),
        }
    }

    #[test]
    fn test_rejects_non_96_plat() {
        assert!(Args::try_parse_from([
            "clatxlat",
            "-c",
            "clat.json",
            "--plat",
            "64:ff9b::/64",
            "show"
        ])
        .is_err());
    }
}
