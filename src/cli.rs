use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// fragscope: find and repair application messages split over several TCP
/// segments in capture files
#[derive(Parser, Debug)]
#[command(name = "fragscope", version, about)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report fragments and their distance to the segment they continue
    Check {
        /// Capture file to inspect
        trace: PathBuf,

        /// Largest payload length treated as a fragment
        #[arg(short, long)]
        fraglen: Option<usize>,

        /// Number of earlier packets searched for a predecessor
        #[arg(short, long)]
        number: Option<usize>,

        /// Never match a fragment against the previous payload-bearing
        /// packet. Off by default, so a fragment directly behind its
        /// predecessor is reported with separation 0; turn it on to match
        /// the older check script, which always skipped that packet
        #[arg(long)]
        exclude_newest: bool,

        /// Write the report as JSON to this file
        #[arg(long)]
        report_json: Option<PathBuf>,
    },

    /// Move fragments back behind the segment they continue
    Repair {
        /// Capture file to repair
        input: PathBuf,

        /// Output capture file
        output: PathBuf,

        /// Largest payload length treated as a fragment
        #[arg(short, long)]
        fraglen: Option<usize>,

        /// Number of earlier packets searched for a predecessor
        #[arg(short, long)]
        window: Option<usize>,

        /// Write the report as JSON to this file
        #[arg(long)]
        report_json: Option<PathBuf>,
    },

    /// Send every captured payload as one UDP datagram
    Replay {
        /// Capture file to replay
        trace: PathBuf,

        /// Destination address (IPv4 or IPv6)
        ip: IpAddr,

        /// Destination UDP port
        port: u16,

        /// Pause between datagrams in milliseconds (0 = none)
        #[arg(short, long)]
        delay: Option<u64>,
    },

    /// Echo stdin and collect its JSON log records into a new file
    CollectLogs {
        /// Output file; must not exist yet
        file: PathBuf,
    },
}
