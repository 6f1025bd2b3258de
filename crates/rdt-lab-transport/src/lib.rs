//! Datagram endpoint seam.
//!
//! The agents and the relay only ever need "send these bytes to that
//! address" and "give me the next datagram". [`Endpoint`] captures exactly
//! that, so protocol logic can be exercised against scripted endpoints in
//! tests while production code uses [`UdpEndpoint`] over tokio UDP.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use thiserror::Error;

mod udp;

pub use udp::UdpEndpoint;

/// Errors from the underlying datagram transport. All of these are fatal to
/// the component that owns the endpoint; an elapsed receive timeout is not a
/// transport error and is handled by callers via `tokio::time::timeout`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind UDP socket to {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to send datagram to {dest}")]
    Send {
        dest: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to receive datagram")]
    Recv(#[source] io::Error),

    #[error("socket has no local address")]
    LocalAddr(#[source] io::Error),
}

/// A bound datagram endpoint.
///
/// Futures are `Send` so an endpoint shared behind an `Arc` can be used from
/// spawned tasks (the relay's delayed forwards rely on this).
pub trait Endpoint: Send + Sync {
    /// Send one datagram to `dest`.
    fn send_to(
        &self,
        frame: &[u8],
        dest: SocketAddr,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receive the next datagram into `buf`, returning its length and source.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(usize, SocketAddr), TransportError>> + Send;

    /// The address this endpoint is bound to.
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}
