use std::{
    net::{Ipv4Addr, SocketAddrV4, UdpSocket},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, info, warn};

use crate::{
    constants::{DISCOVERY_CLIENT_CODE, DISCOVERY_PROBE, DISCOVERY_SERVER_CODE},
    error::TransportError,
    types::HostType,
};

const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Answers discovery probes on a UDP port with this host's type.
/// Stops when dropped
pub struct DiscoveryResponder {
    running: Arc<AtomicBool>,
    local_port: u16,
    handle: Option<JoinHandle<()>>,
}

impl DiscoveryResponder {
    /// Binds `0.0.0.0:port`. Port 0 picks a free port, see `local_port`
    pub fn bind(port: u16, host_type: HostType) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)).map_err(
            |error| TransportError::BindFailed {
                reason: error.to_string(),
            },
        )?;
        socket
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|error| TransportError::BindFailed {
                reason: error.to_string(),
            })?;
        let local_port = socket
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or(port);

        let reply = match host_type {
            HostType::Server => DISCOVERY_SERVER_CODE,
            HostType::Client => DISCOVERY_CLIENT_CODE,
        };
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();

        let handle = thread::spawn(move || {
            let mut buffer = [0u8; 16];
            while thread_running.load(Ordering::Acquire) {
                let Ok((len, from)) = socket.recv_from(&mut buffer) else {
                    continue;
                };
                if buffer[..len] != DISCOVERY_PROBE {
                    continue;
                }
                if let Err(error) = socket.send_to(&[reply], from) {
                    debug!("Discovery reply to {} failed: {}", from, error);
                }
            }
        });

        info!("Discovery responder listening on port {}", local_port);
        Ok(Self {
            running,
            local_port,
            handle: Some(handle),
        })
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            warn!("Discovery responder thread panicked");
        } else {
            debug!("Discovery responder on port {} stopped", self.local_port);
        }
    }
}

impl Drop for DiscoveryResponder {
    fn drop(&mut self) {
        self.stop();
    }
}
