use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use rdt_lab_transport::{Endpoint, TransportError};
use rdt_lab_wire::{
    FRAME_CAPACITY, MAX_PAYLOAD, NetworkHeader, Segment, SegmentStatus, SeqBit, WireError,
    pack_frame, unpack_frame,
};

#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Return address advertised in outgoing headers; acknowledgments come
    /// back to it through the relay.
    pub return_addr: SocketAddr,
    /// Final destination written into outgoing headers.
    pub receiver_addr: SocketAddr,
    /// Where datagrams are actually sent.
    pub relay_addr: SocketAddr,
    pub ack_timeout: Duration,
    /// Per-segment transmission bound; `None` retries forever.
    pub max_attempts: Option<u32>,
    pub frame_capacity: usize,
}

impl SenderConfig {
    pub fn new(return_addr: SocketAddr, receiver_addr: SocketAddr, relay_addr: SocketAddr) -> Self {
        Self {
            return_addr,
            receiver_addr,
            relay_addr,
            ack_timeout: Duration::from_millis(4000),
            max_attempts: None,
            frame_capacity: FRAME_CAPACITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum SenderError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to encode outgoing frame")]
    Wire(#[from] WireError),

    /// The configured retry bound was exhausted for one segment.
    #[error("gave up on segment {segment_index} after {attempts} attempts")]
    GiveUp { segment_index: usize, attempts: u32 },
}

/// Classification of one wait-for-acknowledgment round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Echoed sequence bit matches and the status is clean.
    Acknowledged,
    /// Wrong sequence bit, corrupted status, or an unparseable reply.
    Mismatch,
    /// No reply within the configured timeout.
    TimedOut,
}

/// Outcome summary of a completed transfer.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TransferReport {
    pub segments: usize,
    pub transmissions: u64,
    pub retransmissions: u64,
    pub timeouts: u64,
    pub mismatches: u64,
}

/// Stop-and-wait sender: one outstanding segment at a time, retransmitted on
/// timeout or on a mismatched acknowledgment until acknowledged clean.
pub struct SenderAgent<E> {
    endpoint: E,
    config: SenderConfig,
}

impl<E: Endpoint> SenderAgent<E> {
    pub fn new(endpoint: E, config: SenderConfig) -> Self {
        Self { endpoint, config }
    }

    /// Split a message into data segments of at most `max_payload` bytes,
    /// sequence bits alternating from zero, terminal flag on the last chunk.
    pub fn segment_message(message: &[u8], max_payload: usize) -> Vec<Segment> {
        let chunks: Vec<&[u8]> = message.chunks(max_payload).collect();
        let total = chunks.len();
        let mut seq = SeqBit::Zero;
        let mut segments = Vec::with_capacity(total);
        for (index, chunk) in chunks.into_iter().enumerate() {
            segments.push(Segment::data(
                seq,
                index == total - 1,
                Bytes::copy_from_slice(chunk),
            ));
            seq = seq.flip();
        }
        segments
    }

    /// Transfer one message through the relay, stop-and-wait per segment.
    pub async fn send_message(&self, message: &[u8]) -> Result<TransferReport, SenderError> {
        let segments = Self::segment_message(message, MAX_PAYLOAD);
        let mut report = TransferReport {
            segments: segments.len(),
            ..Default::default()
        };

        for (index, segment) in segments.iter().enumerate() {
            info!(packet = index + 1, total = segments.len(), "sending segment");
            let mut attempts: u32 = 0;
            loop {
                self.transmit(segment).await?;
                attempts += 1;
                report.transmissions += 1;
                if attempts > 1 {
                    report.retransmissions += 1;
                }

                match self
                    .await_acknowledgment(segment.seq, self.config.ack_timeout)
                    .await?
                {
                    AckOutcome::Acknowledged => {
                        debug!(packet = index + 1, "segment acknowledged");
                        break;
                    }
                    AckOutcome::Mismatch => {
                        report.mismatches += 1;
                        warn!(
                            packet = index + 1,
                            "acknowledgment mismatch or corruption, resending"
                        );
                    }
                    AckOutcome::TimedOut => {
                        report.timeouts += 1;
                        warn!(packet = index + 1, "timed out waiting for acknowledgment, resending");
                    }
                }

                if let Some(max) = self.config.max_attempts
                    && attempts >= max
                {
                    return Err(SenderError::GiveUp {
                        segment_index: index,
                        attempts,
                    });
                }
            }
        }

        info!(
            segments = report.segments,
            retransmissions = report.retransmissions,
            "transfer complete"
        );
        Ok(report)
    }

    /// Send the shutdown sentinel as a regular message, stopping the
    /// receiver once it is delivered.
    pub async fn shutdown(&self) -> Result<TransferReport, SenderError> {
        self.send_message(crate::SHUTDOWN_SENTINEL).await
    }

    /// Encode and send one segment toward the relay. A send failure is
    /// fatal to the whole transfer.
    pub async fn transmit(&self, segment: &Segment) -> Result<(), SenderError> {
        let header = NetworkHeader::new(
            self.config.return_addr,
            self.config.receiver_addr,
            segment.clone(),
        );
        let frame = pack_frame(&header, self.config.frame_capacity)?;
        self.endpoint.send_to(&frame, self.config.relay_addr).await?;
        Ok(())
    }

    /// Wait up to `timeout` for the acknowledgment of `expected` and
    /// classify the reply. Transport receive failures abort the run.
    pub async fn await_acknowledgment(
        &self,
        expected: SeqBit,
        timeout: Duration,
    ) -> Result<AckOutcome, SenderError> {
        let mut buf = vec![0u8; self.config.frame_capacity];
        let (len, _src) = match tokio::time::timeout(timeout, self.endpoint.recv_from(&mut buf))
            .await
        {
            Ok(received) => received?,
            Err(_elapsed) => return Ok(AckOutcome::TimedOut),
        };

        let header = match unpack_frame(&buf[..len]) {
            Ok(header) => header,
            Err(err) => {
                warn!(%err, "discarding malformed acknowledgment frame");
                return Ok(AckOutcome::Mismatch);
            }
        };

        let segment = header.segment;
        if !segment.is_ack() {
            debug!("expected an ack, got a data segment");
            return Ok(AckOutcome::Mismatch);
        }
        if segment.seq == expected && segment.status == SegmentStatus::Clean {
            Ok(AckOutcome::Acknowledged)
        } else {
            Ok(AckOutcome::Mismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEndpoint;
    use rdt_lab_wire::SegmentKind;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    fn config() -> SenderConfig {
        let mut config = SenderConfig::new(
            addr("127.0.0.1:5000"),
            addr("127.0.0.1:6000"),
            addr("127.0.0.1:7000"),
        );
        config.ack_timeout = Duration::from_millis(20);
        config
    }

    fn payloads(segments: &[Segment]) -> Vec<Vec<u8>> {
        segments
            .iter()
            .map(|s| match &s.kind {
                SegmentKind::Data { payload, .. } => payload.to_vec(),
                SegmentKind::Ack => panic!("unexpected ack"),
            })
            .collect()
    }

    #[test]
    fn two_byte_message_is_a_single_terminal_segment() {
        let segments = SenderAgent::<ScriptedEndpoint>::segment_message(b"hi", MAX_PAYLOAD);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].encode_text(), b"001hi");
    }

    #[test]
    fn ten_byte_message_splits_into_two_segments() {
        let segments = SenderAgent::<ScriptedEndpoint>::segment_message(b"0123456789", MAX_PAYLOAD);
        assert_eq!(segments.len(), 2);
        assert_eq!(payloads(&segments), vec![b"0123456".to_vec(), b"789".to_vec()]);
        assert_eq!(segments[0].seq, SeqBit::Zero);
        assert_eq!(segments[1].seq, SeqBit::One);
        assert!(matches!(segments[0].kind, SegmentKind::Data { last: false, .. }));
        assert!(matches!(segments[1].kind, SegmentKind::Data { last: true, .. }));
    }

    #[test]
    fn segmentation_covers_the_whole_message() {
        let message = b"the quick brown fox jumps over the lazy dog";
        let segments = SenderAgent::<ScriptedEndpoint>::segment_message(message, MAX_PAYLOAD);
        assert_eq!(segments.len(), message.len().div_ceil(MAX_PAYLOAD));
        let rejoined: Vec<u8> = payloads(&segments).concat();
        assert_eq!(rejoined, message);

        let mut expected = SeqBit::Zero;
        for segment in &segments {
            assert_eq!(segment.seq, expected);
            expected = expected.flip();
        }
    }

    #[test]
    fn empty_message_produces_no_segments() {
        let segments = SenderAgent::<ScriptedEndpoint>::segment_message(b"", MAX_PAYLOAD);
        assert!(segments.is_empty());
    }

    fn ack_frame(seq: SeqBit, status: SegmentStatus) -> Vec<u8> {
        let header = NetworkHeader::new(
            addr("127.0.0.1:6000"),
            addr("127.0.0.1:5000"),
            Segment::ack(seq, status),
        );
        pack_frame(&header, FRAME_CAPACITY).unwrap()
    }

    #[tokio::test]
    async fn clean_matching_ack_is_acknowledged() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_inbound(ack_frame(SeqBit::Zero, SegmentStatus::Clean), addr("127.0.0.1:7000"));
        let agent = SenderAgent::new(endpoint, config());

        let outcome = agent
            .await_acknowledgment(SeqBit::Zero, Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(outcome, AckOutcome::Acknowledged);
    }

    #[tokio::test]
    async fn corrupted_ack_classifies_as_mismatch() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_inbound(
            ack_frame(SeqBit::Zero, SegmentStatus::Corrupted),
            addr("127.0.0.1:7000"),
        );
        let agent = SenderAgent::new(endpoint, config());

        let outcome = agent
            .await_acknowledgment(SeqBit::Zero, Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(outcome, AckOutcome::Mismatch);
    }

    #[tokio::test]
    async fn wrong_sequence_bit_classifies_as_mismatch() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_inbound(ack_frame(SeqBit::One, SegmentStatus::Clean), addr("127.0.0.1:7000"));
        let agent = SenderAgent::new(endpoint, config());

        let outcome = agent
            .await_acknowledgment(SeqBit::Zero, Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(outcome, AckOutcome::Mismatch);
    }

    #[tokio::test]
    async fn silence_classifies_as_timeout() {
        let agent = SenderAgent::new(ScriptedEndpoint::new(), config());
        let outcome = agent
            .await_acknowledgment(SeqBit::Zero, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(outcome, AckOutcome::TimedOut);
    }

    #[tokio::test]
    async fn bounded_retries_surface_give_up() {
        let mut cfg = config();
        cfg.max_attempts = Some(3);
        cfg.ack_timeout = Duration::from_millis(5);
        let agent = SenderAgent::new(ScriptedEndpoint::new(), cfg);

        let err = agent.send_message(b"hi").await.unwrap_err();
        match err {
            SenderError::GiveUp {
                segment_index,
                attempts,
            } => {
                assert_eq!(segment_index, 0);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected GiveUp, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mismatched_then_clean_ack_completes_the_transfer() {
        let endpoint = ScriptedEndpoint::new();
        let relay = addr("127.0.0.1:7000");
        endpoint.push_inbound(ack_frame(SeqBit::Zero, SegmentStatus::Corrupted), relay);
        endpoint.push_inbound(ack_frame(SeqBit::Zero, SegmentStatus::Clean), relay);
        let agent = SenderAgent::new(endpoint, config());

        let report = agent.send_message(b"hi").await.unwrap();
        assert_eq!(report.segments, 1);
        assert_eq!(report.transmissions, 2);
        assert_eq!(report.retransmissions, 1);
        assert_eq!(report.mismatches, 1);
        assert_eq!(report.timeouts, 0);
    }
}
