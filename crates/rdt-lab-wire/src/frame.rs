use crate::error::WireError;
use crate::header::{DELIMITER, NetworkHeader};

/// Default datagram capacity, sized for loopback addresses plus the largest
/// segment text.
pub const FRAME_CAPACITY: usize = 54;

/// Encode a header and NUL-pad it to exactly `capacity` bytes.
///
/// A header longer than the capacity is an error; the frame is never
/// silently truncated.
pub fn pack_frame(header: &NetworkHeader, capacity: usize) -> Result<Vec<u8>, WireError> {
    let mut frame = header.encode();
    if frame.len() > capacity {
        return Err(WireError::FrameOverflow {
            len: frame.len(),
            capacity,
        });
    }
    frame.resize(capacity, 0);
    Ok(frame)
}

/// Strip the NUL padding and decode the embedded header.
pub fn unpack_frame(frame: &[u8]) -> Result<NetworkHeader, WireError> {
    let end = frame
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |pos| pos + 1);
    NetworkHeader::decode(&frame[..end])
}

/// Overwrite the status byte of the embedded segment text with `'1'`,
/// simulating corruption without a full decode. The status byte sits one
/// past the sequence byte, which follows the fourth delimiter.
pub fn corrupt_frame_in_place(frame: &mut [u8]) -> Result<(), WireError> {
    let mut delimiters = 0usize;
    for index in 0..frame.len() {
        if frame[index] == DELIMITER {
            delimiters += 1;
            if delimiters == 4 {
                let status = index + 2;
                if status < frame.len() && frame[status] != 0 {
                    frame[status] = b'1';
                    return Ok(());
                }
                return Err(WireError::MalformedSegment);
            }
        }
    }
    Err(WireError::MissingFields {
        found: delimiters + 1,
    })
}
