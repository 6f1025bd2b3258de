use bytes::Bytes;

use crate::error::WireError;

/// Maximum number of message bytes carried by a single data segment.
pub const MAX_PAYLOAD: usize = 7;

/// Alternating-bit sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqBit {
    Zero,
    One,
}

impl SeqBit {
    pub fn flip(self) -> Self {
        match self {
            SeqBit::Zero => SeqBit::One,
            SeqBit::One => SeqBit::Zero,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            SeqBit::Zero => b'0',
            SeqBit::One => b'1',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(SeqBit::Zero),
            b'1' => Some(SeqBit::One),
            _ => None,
        }
    }
}

/// Per-segment error marker. Stands in for a computed checksum: the relay
/// flips it to `Corrupted` to simulate a damaged packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    Clean,
    Corrupted,
}

impl SegmentStatus {
    pub fn as_byte(self) -> u8 {
        match self {
            SegmentStatus::Clean => b'0',
            SegmentStatus::Corrupted => b'1',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(SegmentStatus::Clean),
            b'1' => Some(SegmentStatus::Corrupted),
            _ => None,
        }
    }
}

/// What the segment carries: a chunk of application data or an acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    Data {
        /// Set on the final segment of a message; tells the receiver to
        /// reassemble and flush.
        last: bool,
        payload: Bytes,
    },
    Ack,
}

/// A logical protocol unit. Flag bytes exist only on the wire; the API
/// surface uses the typed forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub seq: SeqBit,
    pub status: SegmentStatus,
    pub kind: SegmentKind,
}

impl Segment {
    pub fn data(seq: SeqBit, last: bool, payload: Bytes) -> Self {
        Self {
            seq,
            status: SegmentStatus::Clean,
            kind: SegmentKind::Data { last, payload },
        }
    }

    pub fn ack(seq: SeqBit, status: SegmentStatus) -> Self {
        Self {
            seq,
            status,
            kind: SegmentKind::Ack,
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self.kind, SegmentKind::Ack)
    }

    /// Render the segment text portion of the wire header.
    pub fn encode_text(&self) -> Vec<u8> {
        let mut text = vec![self.seq.as_byte(), self.status.as_byte()];
        match &self.kind {
            SegmentKind::Data { last, payload } => {
                text.push(if *last { b'1' } else { b'0' });
                text.extend_from_slice(payload);
            }
            SegmentKind::Ack => {
                text.extend_from_slice(b"ACK");
                text.push(self.seq.as_byte());
            }
        }
        text
    }

    /// Parse a segment text. Acks are recognized by the literal `ACK` in the
    /// position a data segment reserves for its terminal flag, which is
    /// unambiguous because the terminal flag is always `0` or `1`.
    pub fn decode_text(text: &[u8]) -> Result<Self, WireError> {
        if text.len() < 3 {
            return Err(WireError::MalformedSegment);
        }
        let seq = SeqBit::from_byte(text[0]).ok_or(WireError::MalformedSegment)?;
        let status = SegmentStatus::from_byte(text[1]).ok_or(WireError::MalformedSegment)?;

        if text.len() >= 5 && &text[2..5] == b"ACK" {
            return Ok(Segment {
                seq,
                status,
                kind: SegmentKind::Ack,
            });
        }

        let last = match text[2] {
            b'0' => false,
            b'1' => true,
            _ => return Err(WireError::MalformedSegment),
        };
        Ok(Segment {
            seq,
            status,
            kind: SegmentKind::Data {
                last,
                payload: Bytes::copy_from_slice(&text[3..]),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_segment_text_round_trips() {
        let segment = Segment::data(SeqBit::Zero, true, Bytes::from_static(b"hi"));
        let text = segment.encode_text();
        assert_eq!(text, b"001hi");
        assert_eq!(Segment::decode_text(&text).unwrap(), segment);
    }

    #[test]
    fn ack_segment_text_round_trips() {
        let segment = Segment::ack(SeqBit::One, SegmentStatus::Clean);
        let text = segment.encode_text();
        assert_eq!(text, b"10ACK1");
        assert_eq!(Segment::decode_text(&text).unwrap(), segment);
    }

    #[test]
    fn corrupted_ack_keeps_its_status() {
        let segment = Segment::ack(SeqBit::Zero, SegmentStatus::Corrupted);
        let decoded = Segment::decode_text(&segment.encode_text()).unwrap();
        assert_eq!(decoded.status, SegmentStatus::Corrupted);
    }

    #[test]
    fn payload_may_start_with_ack_lookalike() {
        // A data payload spelling "CK.." cannot be confused with an ack
        // because the terminal flag byte is never 'A'.
        let segment = Segment::data(SeqBit::Zero, false, Bytes::from_static(b"ACKACK"));
        let decoded = Segment::decode_text(&segment.encode_text()).unwrap();
        assert_eq!(decoded, segment);
    }

    #[test]
    fn short_or_garbled_text_is_rejected() {
        assert!(matches!(
            Segment::decode_text(b"00"),
            Err(WireError::MalformedSegment)
        ));
        assert!(matches!(
            Segment::decode_text(b"0x1hi"),
            Err(WireError::MalformedSegment)
        ));
        assert!(matches!(
            Segment::decode_text(b"00Zhi"),
            Err(WireError::MalformedSegment)
        ));
    }

    #[test]
    fn empty_payload_is_allowed() {
        let segment = Segment::data(SeqBit::One, true, Bytes::new());
        let decoded = Segment::decode_text(&segment.encode_text()).unwrap();
        assert_eq!(decoded, segment);
    }
}
