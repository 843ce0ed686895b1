use std::net::SocketAddr;

use crate::constants::{DISCOVERY_CLIENT_CODE, DISCOVERY_SERVER_CODE};

/// A peer found on the local network
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalEndpoint {
    pub address: String,
    pub port: u16,
    pub is_server: bool,
}

impl LocalEndpoint {
    /// Parses a discovery reply. `code` is the single byte the peer answered
    /// with and `sender` the reply's origin written as `"address+port"`.
    /// Returns None for unknown codes or malformed senders
    pub fn from_reply(code: u8, sender: &str) -> Option<Self> {
        let is_server = match code {
            DISCOVERY_SERVER_CODE => true,
            DISCOVERY_CLIENT_CODE => false,
            _ => return None,
        };

        let (address, port) = sender.rsplit_once('+')?;
        if address.is_empty() {
            return None;
        }
        let port = port.parse::<u16>().ok()?;

        Some(Self {
            address: address.to_string(),
            port,
            is_server,
        })
    }
}

/// Renders a socket address in the `"address+port"` form discovery uses
pub fn endpoint_key(addr: &SocketAddr) -> String {
    format!("{}+{}", addr.ip(), addr.port())
}
