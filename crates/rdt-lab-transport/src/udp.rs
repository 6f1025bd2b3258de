use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::{Endpoint, TransportError};

/// [`Endpoint`] over a tokio UDP socket.
///
/// All methods take `&self`, so the endpoint can be shared across tasks.
#[derive(Debug)]
pub struct UdpEndpoint {
    local_addr: SocketAddr,
    socket: UdpSocket,
}

impl UdpEndpoint {
    /// Bind to `addr`. Port 0 asks the OS for an ephemeral port; the chosen
    /// address is available through [`Endpoint::local_addr`].
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = socket.local_addr().map_err(TransportError::LocalAddr)?;
        Ok(Self { local_addr, socket })
    }
}

impl Endpoint for UdpEndpoint {
    async fn send_to(&self, frame: &[u8], dest: SocketAddr) -> Result<(), TransportError> {
        self.socket
            .send_to(frame, dest)
            .await
            .map_err(|source| TransportError::Send { dest, source })?;
        Ok(())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
        self.socket.recv_from(buf).await.map_err(TransportError::Recv)
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn bind_assigns_an_ephemeral_port() {
        let endpoint = UdpEndpoint::bind(loopback()).await.unwrap();
        assert_ne!(endpoint.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn datagrams_travel_between_endpoints() {
        let a = UdpEndpoint::bind(loopback()).await.unwrap();
        let b = UdpEndpoint::bind(loopback()).await.unwrap();

        a.send_to(b"ping", b.local_addr().unwrap()).await.unwrap();

        let mut buf = [0u8; 16];
        let (len, src) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ping");
        assert_eq!(src, a.local_addr().unwrap());
    }
}
