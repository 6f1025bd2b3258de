use std::net::SocketAddr;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use rdt_lab_transport::{Endpoint, TransportError};
use rdt_lab_wire::{
    FRAME_CAPACITY, NetworkHeader, Segment, SegmentKind, SeqBit, WireError, pack_frame,
    unpack_frame,
};

use crate::SHUTDOWN_SENTINEL;

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub frame_capacity: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            frame_capacity: FRAME_CAPACITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to encode acknowledgment frame")]
    Wire(#[from] WireError),
}

/// Outcome summary of a receiver run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReceiverReport {
    pub messages: u64,
    pub segments_accepted: u64,
    pub duplicates: u64,
}

/// Receives segments through the relay, acknowledges each one, discards
/// duplicates, and reassembles full messages on the terminal flag.
pub struct ReceiverAgent<E> {
    endpoint: E,
    config: ReceiverConfig,
    fragments: Vec<Bytes>,
    last_accepted: Option<SeqBit>,
}

impl<E: Endpoint> ReceiverAgent<E> {
    pub fn new(endpoint: E, config: ReceiverConfig) -> Self {
        Self {
            endpoint,
            config,
            fragments: Vec::new(),
            last_accepted: None,
        }
    }

    /// Receive until the shutdown sentinel arrives as a complete message.
    /// Every reassembled message is handed to `deliver`.
    pub async fn run<F>(&mut self, mut deliver: F) -> Result<ReceiverReport, ReceiverError>
    where
        F: FnMut(Vec<u8>),
    {
        let mut report = ReceiverReport::default();

        loop {
            let mut buf = vec![0u8; self.config.frame_capacity];
            let (len, relay_addr) = self.endpoint.recv_from(&mut buf).await?;

            let header = match unpack_frame(&buf[..len]) {
                Ok(header) => header,
                Err(err) => {
                    warn!(%err, %relay_addr, "skipping frame with malformed header");
                    continue;
                }
            };

            let SegmentKind::Data { last, payload } = header.segment.kind.clone() else {
                debug!("ignoring stray acknowledgment segment");
                continue;
            };
            let seq = header.segment.seq;

            // Acknowledge first, echoing the received status; a corrupted
            // segment is the sender's problem to resolve by retransmitting.
            self.acknowledge(&header, relay_addr).await?;

            if self.last_accepted == Some(seq) {
                report.duplicates += 1;
                debug!(seq = ?seq, "discarding duplicate segment");
                continue;
            }
            self.last_accepted = Some(seq);
            self.fragments.push(payload);
            report.segments_accepted += 1;

            if last {
                let mut message = Vec::new();
                for fragment in self.fragments.drain(..) {
                    message.extend_from_slice(&fragment);
                }
                self.last_accepted = None;
                report.messages += 1;
                info!(bytes = message.len(), "message reassembled");

                let is_shutdown = message == SHUTDOWN_SENTINEL;
                deliver(message);
                if is_shutdown {
                    info!("shutdown sentinel received, stopping");
                    return Ok(report);
                }
            }
        }
    }

    /// Reply `<seq><status>ACK<seq>` addressed to the original sender,
    /// routed back through the relay the segment arrived from.
    async fn acknowledge(
        &self,
        header: &NetworkHeader,
        relay_addr: SocketAddr,
    ) -> Result<(), ReceiverError> {
        let ack = Segment::ack(header.segment.seq, header.segment.status);
        let reply = NetworkHeader::new(header.dst, header.src, ack);
        let frame = pack_frame(&reply, self.config.frame_capacity)?;
        self.endpoint.send_to(&frame, relay_addr).await?;
        Ok(())
    }
}
