use std::net::{IpAddr, SocketAddr};
use std::str;

use crate::error::WireError;
use crate::segment::Segment;

/// Field separator of the textual wire header.
pub const DELIMITER: u8 = b'-';

/// Wire envelope carrying routing metadata and one segment.
///
/// Addresses and ports are typed fields; the free-text join only exists on
/// the wire. The segment text is the last field, so decoding splits at most
/// four times and the payload may itself contain the delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHeader {
    pub src: SocketAddr,
    pub dst: SocketAddr,
    pub segment: Segment,
}

impl NetworkHeader {
    pub fn new(src: SocketAddr, dst: SocketAddr, segment: Segment) -> Self {
        Self { src, dst, segment }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!(
            "{}-{}-{}-{}-",
            self.src.ip(),
            self.src.port(),
            self.dst.ip(),
            self.dst.port()
        )
        .into_bytes();
        out.extend_from_slice(&self.segment.encode_text());
        out
    }

    pub fn decode(raw: &[u8]) -> Result<Self, WireError> {
        let fields: Vec<&[u8]> = raw.splitn(5, |&b| b == DELIMITER).collect();
        if fields.len() < 5 {
            return Err(WireError::MissingFields {
                found: fields.len(),
            });
        }

        let src_ip = parse_addr(fields[0], "src_ip")?;
        let src_port = parse_port(fields[1], "src_port")?;
        let dst_ip = parse_addr(fields[2], "dst_ip")?;
        let dst_port = parse_port(fields[3], "dst_port")?;

        Ok(Self {
            src: SocketAddr::new(src_ip, src_port),
            dst: SocketAddr::new(dst_ip, dst_port),
            segment: Segment::decode_text(fields[4])?,
        })
    }
}

fn parse_addr(field: &[u8], name: &'static str) -> Result<IpAddr, WireError> {
    let text = field_text(field, name)?;
    text.parse().map_err(|_| WireError::InvalidAddress {
        value: text.to_string(),
    })
}

fn parse_port(field: &[u8], name: &'static str) -> Result<u16, WireError> {
    let text = field_text(field, name)?;
    text.parse().map_err(|_| WireError::InvalidPort {
        value: text.to_string(),
    })
}

fn field_text<'a>(field: &'a [u8], name: &'static str) -> Result<&'a str, WireError> {
    str::from_utf8(field).map_err(|_| WireError::FieldNotText { field: name })
}
