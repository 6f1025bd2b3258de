//! Scripted endpoint for unit tests: inbound datagrams are queued up front,
//! outbound datagrams are recorded, and an empty inbound queue blocks
//! forever so receive timeouts can fire.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Mutex;

use rdt_lab_transport::{Endpoint, TransportError};

pub struct ScriptedEndpoint {
    inbound: Mutex<VecDeque<(Vec<u8>, SocketAddr)>>,
    outbound: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    local: SocketAddr,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(VecDeque::new()),
            outbound: Mutex::new(Vec::new()),
            local: "127.0.0.1:5000".parse().unwrap(),
        }
    }

    pub fn push_inbound(&self, frame: Vec<u8>, src: SocketAddr) {
        self.inbound.lock().unwrap().push_back((frame, src));
    }

    pub fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.outbound.lock().unwrap().clone()
    }
}

impl Endpoint for ScriptedEndpoint {
    async fn send_to(&self, frame: &[u8], dest: SocketAddr) -> Result<(), TransportError> {
        self.outbound.lock().unwrap().push((frame.to_vec(), dest));
        Ok(())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
        let next = self.inbound.lock().unwrap().pop_front();
        match next {
            Some((frame, src)) => {
                let len = frame.len().min(buf.len());
                buf[..len].copy_from_slice(&frame[..len]);
                Ok((len, src))
            }
            None => std::future::pending().await,
        }
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.local)
    }
}
