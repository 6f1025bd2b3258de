use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use rdt_lab_transport::{Endpoint, TransportError};
use rdt_lab_wire::{NetworkHeader, SeqBit, corrupt_frame_in_place, unpack_frame};

use crate::config::ImpairmentProfile;
use crate::impairment::{Decision, ImpairmentEngine};
use crate::stats::RelayStats;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Receive failure on the relay's own socket; aborts the relay loop.
    #[error("transport failure in relay loop")]
    Transport(#[from] TransportError),
}

/// The man-in-the-middle node. Receives a packet, rewrites its destination
/// from the embedded header, applies the impairment decision and forwards,
/// drops, corrupts or delays it. Knows nothing about message semantics: it
/// only distinguishes data from acks to attribute traffic to a direction.
pub struct RelayNode<E> {
    endpoint: Arc<E>,
    engine: ImpairmentEngine,
    stats: RelayStats,
    frame_capacity: usize,
    // Test hooks: drop the next data segment / ack with the given seq bit.
    drop_data_once: Vec<SeqBit>,
    drop_ack_once: Vec<SeqBit>,
}

impl<E: Endpoint + 'static> RelayNode<E> {
    pub fn new(endpoint: E, profile: ImpairmentProfile, frame_capacity: usize) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            engine: ImpairmentEngine::new(profile),
            stats: RelayStats::default(),
            frame_capacity,
            drop_data_once: Vec::new(),
            drop_ack_once: Vec::new(),
        }
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Deterministic fault: drop the next sender data segment with `seq`.
    pub fn add_drop_data_once(&mut self, seq: SeqBit) {
        self.drop_data_once.push(seq);
    }

    /// Deterministic fault: drop the next receiver ack with `seq`.
    pub fn add_drop_ack_once(&mut self, seq: SeqBit) {
        self.drop_ack_once.push(seq);
    }

    /// Run until a transport receive failure. The relay has no terminal
    /// condition of its own.
    pub async fn run(&mut self) -> Result<(), RelayError> {
        info!(
            local = %self.endpoint.local_addr()?,
            "relay listening"
        );
        loop {
            self.process_one().await?;
        }
    }

    /// Receive and handle exactly one inbound packet.
    pub async fn process_one(&mut self) -> Result<(), RelayError> {
        let mut frame = vec![0u8; self.frame_capacity];
        let (len, src) = self.endpoint.recv_from(&mut frame).await?;
        frame.truncate(len);

        let header = match unpack_frame(&frame) {
            Ok(header) => header,
            Err(err) => {
                warn!(%err, %src, "dropping frame with malformed header");
                self.stats.lost += 1;
                return Ok(());
            }
        };

        if header.segment.is_ack() {
            self.stats.from_receiver += 1;
        } else {
            self.stats.from_sender += 1;
        }
        let dest = header.dst;
        debug!(%src, %dest, ack = header.segment.is_ack(), "packet received");

        if self.take_forced_drop(&header) {
            info!(%dest, "packet dropped (forced)");
            self.stats.lost += 1;
        } else {
            match self.engine.decide() {
                Decision::Delay => {
                    self.stats.delayed += 1;
                    let delay = self.engine.delay();
                    info!(%dest, ?delay, "packet delayed");
                    let endpoint = Arc::clone(&self.endpoint);
                    // Fire and forget: the main loop resumes listening
                    // immediately, so delayed packets may arrive out of order.
                    tokio::spawn(async move {
                        sleep(delay).await;
                        if let Err(err) = endpoint.send_to(&frame, dest).await {
                            warn!(%err, %dest, "delayed forward failed");
                        }
                    });
                }
                Decision::Drop => {
                    info!(%dest, "packet lost");
                    self.stats.lost += 1;
                }
                Decision::Corrupt => {
                    self.stats.corrupted += 1;
                    info!(%dest, "packet corrupted");
                    if let Err(err) = corrupt_frame_in_place(&mut frame) {
                        warn!(%err, "could not corrupt frame, forwarding unchanged");
                    }
                    self.forward(&frame, dest).await;
                }
                Decision::Forward => {
                    self.forward(&frame, dest).await;
                }
            }
        }

        if self.stats.due_for_report() {
            self.stats.log_report();
        }
        Ok(())
    }

    /// Forward failures are reported but do not stop the relay loop.
    async fn forward(&mut self, frame: &[u8], dest: SocketAddr) {
        match self.endpoint.send_to(frame, dest).await {
            Ok(()) => {
                self.stats.forwarded += 1;
                debug!(%dest, "packet forwarded");
            }
            Err(err) => warn!(%err, %dest, "failed to forward packet"),
        }
    }

    fn take_forced_drop(&mut self, header: &NetworkHeader) -> bool {
        let pending = if header.segment.is_ack() {
            &mut self.drop_ack_once
        } else {
            &mut self.drop_data_once
        };
        if let Some(pos) = pending.iter().position(|seq| *seq == header.segment.seq) {
            pending.remove(pos);
            true
        } else {
            false
        }
    }
}
