//! Wire model for the RDT lab: segments, network headers and frame packing.
//!
//! The wire format is textual and delimiter-joined:
//!
//! ```text
//! <src_ip>-<src_port>-<dst_ip>-<dst_port>-<segment_text>
//! ```
//!
//! where `segment_text` is `<seq:1><status:1><last:1><payload:0..=7>` for a
//! data segment and `<seq:1><status:1>ACK<seq:1>` for an acknowledgment.
//! Frames are NUL-padded to a fixed capacity before hitting the socket.

pub mod error;
pub mod frame;
pub mod header;
pub mod segment;

pub use error::WireError;
pub use frame::{FRAME_CAPACITY, corrupt_frame_in_place, pack_frame, unpack_frame};
pub use header::{DELIMITER, NetworkHeader};
pub use segment::{MAX_PAYLOAD, Segment, SegmentKind, SegmentStatus, SeqBit};
