//! Replay of captured application payloads as UDP datagrams.
//!
//! Each payload-bearing packet becomes exactly one datagram, sent in trace
//! order with a fixed pause between sends.

use crate::packet::Packet;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const PROGRESS_TEMPLATE: &str =
    "{bar:40.cyan/blue} {pos}/{len} packets [{elapsed_precise}<{eta_precise}]";

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("cannot reach {target}: {source}")]
    Connect {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("send failed: {0}")]
    Send(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct ReplayConfig {
    pub target: SocketAddr,
    /// Pause after every datagram; zero sends back to back.
    pub delay: Duration,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub sent: u64,
    /// Packets skipped because they carried no payload.
    pub ignored: u64,
}

#[derive(Debug)]
pub struct Replayer {
    socket: UdpSocket,
    delay: Duration,
    stats: ReplayStats,
}

impl Replayer {
    /// Bind an ephemeral socket of the target's address family and connect it.
    pub fn connect(config: &ReplayConfig) -> Result<Self, ReplayError> {
        let target = config.target;
        let local = match target.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let connect_err = |source| ReplayError::Connect { target, source };
        let socket = UdpSocket::bind(local).map_err(connect_err)?;
        socket.connect(target).map_err(connect_err)?;

        tracing::info!(%target, delay_ms = config.delay.as_millis() as u64, "replay socket ready");
        Ok(Replayer {
            socket,
            delay: config.delay,
            stats: ReplayStats::default(),
        })
    }

    /// Send the packet's payload, if it has one. Returns whether a datagram
    /// went out.
    pub fn send(&mut self, packet: &Packet) -> Result<bool, ReplayError> {
        let Some(payload) = packet.payload() else {
            self.stats.ignored += 1;
            return Ok(false);
        };
        self.socket.send(payload)?;
        self.stats.sent += 1;
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(true)
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }
}

/// Replay a whole sequence, stopping early once `running` is cleared.
pub fn replay<P: AsRef<Packet>>(
    packets: &[P],
    config: &ReplayConfig,
    running: &AtomicBool,
) -> Result<ReplayStats, ReplayError> {
    let mut replayer = Replayer::connect(config)?;
    let progress = progress_bar(packets.len(), config.progress);
    for (index, packet) in packets.iter().enumerate() {
        if !running.load(Ordering::SeqCst) {
            progress.abandon();
            tracing::warn!(index, "replay interrupted");
            return Ok(replayer.stats());
        }
        replayer.send(packet.as_ref())?;
        progress.inc(1);
    }
    progress.finish();
    let stats = replayer.stats();
    tracing::info!(sent = stats.sent, ignored = stats.ignored, "replay finished");
    Ok(stats)
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    match ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        Ok(style) => pb.set_style(style),
        Err(e) => tracing::debug!(error = %e, "default progress style"),
    }
    pb
}
