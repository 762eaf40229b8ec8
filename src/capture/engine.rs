//! Capture file engine: loads a pcap/pcapng trace into memory and writes a
//! (possibly reordered) trace back out.

use crate::packet::Packet;
use crate::protocol::LinkType;
use pcap::{Capture, Linktype, Offline, PacketHeader};
use std::path::{Path, PathBuf};

/// Errors from the capture engine.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("cannot open trace {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: pcap::Error,
    },
    #[error("cannot write trace {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: pcap::Error,
    },
    #[error("pcap error: {0}")]
    Pcap(#[from] pcap::Error),
}

/// One record of a trace: the original pcap header and bytes, plus the
/// decoded view the fragment engine works on.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub header: PacketHeader,
    pub data: Vec<u8>,
    pub packet: Packet,
}

impl AsRef<Packet> for CapturedFrame {
    fn as_ref(&self) -> &Packet {
        &self.packet
    }
}

/// A whole capture held in memory, in file order.
#[derive(Debug, Clone)]
pub struct Trace {
    pub linktype: Linktype,
    pub frames: Vec<CapturedFrame>,
}

impl Trace {
    pub fn link_type(&self) -> LinkType {
        LinkType::from(self.linktype.0)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn open_offline(path: &Path) -> Result<Capture<Offline>, CaptureError> {
    Capture::from_file(path).map_err(|source| CaptureError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Read every record of a capture file and decode it.
pub fn read_trace(path: &Path) -> Result<Trace, CaptureError> {
    let mut cap = open_offline(path)?;
    let linktype = cap.get_datalink();
    let link = LinkType::from(linktype.0);

    tracing::info!(
        path = %path.display(),
        linktype = linktype.0,
        link = %link,
        "trace opened"
    );
    if let LinkType::Unknown(v) = link {
        tracing::warn!(linktype = v, "unsupported link type, no packet will carry a payload");
    }

    let mut frames = Vec::new();
    loop {
        let record = match cap.next_packet() {
            Ok(record) => record,
            Err(pcap::Error::NoMorePackets) => break,
            Err(e) => return Err(CaptureError::Pcap(e)),
        };
        let data = record.data.to_vec();
        let packet = Packet::decode(link, &data);
        frames.push(CapturedFrame {
            header: *record.header,
            data,
            packet,
        });
    }

    tracing::info!(packets = frames.len(), "trace loaded");
    Ok(Trace { linktype, frames })
}

/// Write a trace with the link type and record headers it was read with.
pub fn write_trace(path: &Path, trace: &Trace) -> Result<(), CaptureError> {
    let write_err = |source| CaptureError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dead = Capture::dead(trace.linktype)?;
    let mut savefile = dead.savefile(path).map_err(write_err)?;
    for frame in &trace.frames {
        savefile.write(&pcap::Packet::new(&frame.header, &frame.data));
    }
    savefile.flush().map_err(write_err)?;

    tracing::info!(path = %path.display(), packets = trace.len(), "trace written");
    Ok(())
}
