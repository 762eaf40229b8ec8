//! fragscope library crate: capture decoding, fragment detection and repair,
//! plus the replay and log collection helpers used by the binary.
//!
//! The engine in [`fragment`] works on any sequence of items that expose a
//! decoded [`packet::Packet`]; [`capture`] supplies such sequences from pcap
//! files and writes reordered ones back.

pub mod capture;
pub mod config;
pub mod display;
pub mod flow;
pub mod fragment;
pub mod logs;
pub mod packet;
pub mod protocol;
pub mod replay;
