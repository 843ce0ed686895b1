use std::{
    collections::HashSet,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use if_addrs::IfAddr;
use log::{debug, info};

use crate::{
    constants::DISCOVERY_PROBE,
    discovery::{endpoint_key, LocalEndpoint},
    session::SessionContext,
};

const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Where one discovery socket binds and where it sends the probe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoveryProbe {
    pub local: Ipv4Addr,
    pub target: SocketAddrV4,
}

impl DiscoveryProbe {
    pub fn new(local: Ipv4Addr, target: SocketAddrV4) -> Self {
        Self { local, target }
    }
}

/// One probe per broadcast-capable IPv4 interface, aimed at that
/// interface's broadcast address. Loopback and point-to-point links are
/// skipped. Interfaces that are down fail the probe send and get no socket.
///
/// Falls back to the host's LAN address and the limited broadcast address
/// when no interface qualifies.
pub fn interface_probes(port: u16) -> Vec<DiscoveryProbe> {
    let interfaces = if_addrs::get_if_addrs().unwrap_or_else(|error| {
        debug!("Listing network interfaces failed: {}", error);
        Vec::new()
    });

    let mut probes = Vec::new();
    for interface in interfaces.iter().filter(|interface| !interface.is_loopback()) {
        let IfAddr::V4(address) = &interface.addr else {
            continue;
        };
        let Some(broadcast) = address.broadcast else {
            continue;
        };
        let probe = DiscoveryProbe::new(address.ip, SocketAddrV4::new(broadcast, port));
        if !probes.contains(&probe) {
            debug!("Probing interface {} ({})", interface.name, address.ip);
            probes.push(probe);
        }
    }

    if probes.is_empty() {
        let local = local_ipaddress::get()
            .and_then(|address| address.parse::<Ipv4Addr>().ok())
            .filter(|address| !address.is_loopback())
            .unwrap_or(Ipv4Addr::UNSPECIFIED);
        debug!("No broadcast interface found, probing from {}", local);
        probes.push(DiscoveryProbe::new(
            local,
            SocketAddrV4::new(Ipv4Addr::BROADCAST, port),
        ));
    }
    probes
}

/// Probes every local interface on `port` and collects replies for `window`.
/// See `refresh_udp_listings`
pub fn refresh_local_udp_listings(
    session: Arc<SessionContext>,
    port: u16,
    window: Duration,
) -> JoinHandle<Vec<LocalEndpoint>> {
    refresh_udp_listings(session, interface_probes(port), window)
}

/// Opens one socket per probe, sends the discovery probe and collects
/// replies until `window` has passed on the session clock or the session
/// starts ending.
///
/// Runs on its own thread. The sockets are dropped when the thread returns.
/// Endpoints are published on the session as they answer and also returned
/// through the handle. Network errors are logged and otherwise ignored.
pub fn refresh_udp_listings(
    session: Arc<SessionContext>,
    probes: Vec<DiscoveryProbe>,
    window: Duration,
) -> JoinHandle<Vec<LocalEndpoint>> {
    thread::spawn(move || {
        let clock = session.clock().clone();
        let deadline = clock.now() + window;
        let sockets: Vec<UdpSocket> = probes.iter().filter_map(open_probe_socket).collect();
        let mut seen = HashSet::new();
        let mut endpoints = Vec::new();
        let mut buffer = [0u8; 16];
        session.set_local_endpoints(Vec::new());

        while clock.now() < deadline && !session.is_ending_session() {
            for socket in &sockets {
                let (len, from) = match socket.recv_from(&mut buffer) {
                    Ok(received) => received,
                    Err(_) => continue,
                };
                if len == 0 {
                    continue;
                }
                let Some(endpoint) = LocalEndpoint::from_reply(buffer[0], &endpoint_key(&from))
                else {
                    debug!("Ignoring unrecognized discovery reply from {}", from);
                    continue;
                };
                if seen.insert(endpoint.clone()) {
                    endpoints.push(endpoint);
                    session.set_local_endpoints(endpoints.clone());
                }
            }
            if sockets.is_empty() {
                thread::sleep(READ_TIMEOUT);
            }
        }

        info!("Local discovery found {} endpoint(s)", endpoints.len());
        endpoints
    })
}

fn open_probe_socket(probe: &DiscoveryProbe) -> Option<UdpSocket> {
    let socket = UdpSocket::bind(SocketAddrV4::new(probe.local, 0))
        .map_err(|error| debug!("Discovery bind on {} failed: {}", probe.local, error))
        .ok()?;
    socket.set_broadcast(true).ok()?;
    socket.set_read_timeout(Some(READ_TIMEOUT)).ok()?;
    let target = SocketAddr::V4(probe.target);
    if let Err(error) = socket.send_to(&DISCOVERY_PROBE, target) {
        debug!("Discovery probe to {} failed: {}", target, error);
        return None;
    }
    Some(socket)
}
