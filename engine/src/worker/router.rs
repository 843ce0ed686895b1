use std::sync::Arc;

use log::{debug, info, warn};

use crate::{
    cache::{CacheRequest, CacheResponse},
    codec::{ByteReader, Serde},
    events::{BinaryMessageEvent, MessageEvent, PongEvent, TextMessageEvent},
    frame::{Frame, FrameBody, GroupId, Receivers, RouterId},
    player::NetworkingPlayer,
    worker::{
        net_worker::{elapsed_since, encode},
        AuthDecision, IdentityReply, IdentityRequest, NetWorker,
    },
};

impl NetWorker {
    /// Classifies one incoming frame and hands it to the matching handler.
    /// The first match wins: identification, ping/pong, binary routing,
    /// text, then the engine's Disconnect and Cache groups, and finally the
    /// generic message event
    pub fn on_message_received(&self, player: &Arc<NetworkingPlayer>, frame: Frame) {
        if frame.group_id == GroupId::Identity {
            if self.is_server() {
                self.handle_identity_request(player, &frame);
            } else {
                self.handle_identity_reply(&frame);
            }
            return;
        }

        // SECURITY: nothing but liveness and goodbyes before acceptance
        if self.is_server() && !player.is_accepted() {
            let allowed = frame.group_id == GroupId::Disconnect
                || matches!(frame.body, FrameBody::Ping(_) | FrameBody::Pong(_));
            if !allowed {
                warn!(
                    "Ignoring {:?} frame from player {} that has not been accepted",
                    frame.group_id,
                    player.network_id()
                );
                return;
            }
        }

        if frame.as_binary().is_some() {
            self.route_binary(player, frame);
            return;
        }

        match &frame.body {
            FrameBody::Ping(ticks) => {
                let pong = self
                    .frame(GroupId::Pong, FrameBody::Pong(*ticks))
                    .unreliable();
                if let Err(error) = self.send_to(player, &pong) {
                    debug!("Unable to answer ping from {}: {}", player.network_id(), error);
                }
            }
            FrameBody::Pong(ticks) => {
                let latency = elapsed_since(self.time.ticks(), *ticks);
                player.set_round_trip_latency(latency);
                self.events.pong_received.notify(&PongEvent {
                    player: player.clone(),
                    latency,
                });
            }
            FrameBody::Binary(_) => {}
            FrameBody::Text(text) => {
                self.relay_to_others(player, &frame);
                self.events.text_message_received.notify(&TextMessageEvent {
                    player: player.clone(),
                    text: text.clone(),
                });
            }
            FrameBody::Raw(bytes) => match frame.group_id {
                GroupId::Disconnect => self.handle_disconnect_notice(player),
                GroupId::Cache => self.handle_cache_frame(player, bytes),
                _ => {
                    self.relay_to_others(player, &frame);
                    self.events.message_received.notify(&MessageEvent {
                        player: player.clone(),
                        frame: frame.clone(),
                    });
                }
            },
        }
    }

    fn route_binary(&self, player: &Arc<NetworkingPlayer>, frame: Frame) {
        let Some(message) = frame.as_binary() else {
            return;
        };
        debug!(
            "Routing {:?} for object {} from player {}",
            message.router_id,
            message.network_id,
            player.network_id()
        );

        let router_id = message.router_id;
        match router_id {
            RouterId::NetworkObject => self.handle_network_object(player, &frame),
            RouterId::AcceptMulti => self.handle_accept_multi(player, &frame),
            RouterId::CreatedObject => {
                if self.is_server() {
                    warn!("Ignoring CreatedObject from player {}", player.network_id());
                    return;
                }
                self.resolve_pending_create(&frame);
                self.dispatch_to_object(player, frame);
            }
            RouterId::Rpc | RouterId::BinaryData => self.dispatch_to_object(player, frame),
            RouterId::Other(_) => {
                self.relay_to_others(player, &frame);
                let message = message.clone();
                self.events.binary_message_received.notify(&BinaryMessageEvent {
                    player: player.clone(),
                    message,
                });
            }
        }
    }

    /// Server only: forwards client frames addressed to All or Others to the
    /// other accepted players
    pub(super) fn relay_to_others(&self, sender: &Arc<NetworkingPlayer>, frame: &Frame) {
        if !self.is_server() {
            return;
        }
        if matches!(frame.receivers, Receivers::All | Receivers::Others) {
            let targets = self.broadcast_targets(Some(sender.network_id()));
            self.send_to_all(&targets, frame);
        }
    }

    // Identification

    fn handle_identity_request(&self, player: &Arc<NetworkingPlayer>, frame: &Frame) {
        if !self.players.contains(player) {
            warn!("Identity from player {} that never connected", player.network_id());
            return;
        }
        if player.is_accepted() || player.is_pending_accepted() {
            debug!("Duplicate identity from player {}", player.network_id());
            return;
        }

        let FrameBody::Raw(bytes) = &frame.body else {
            self.reject_player(player, "malformed identity");
            return;
        };
        let request = match IdentityRequest::de(&mut ByteReader::new(bytes)) {
            Ok(request) => request,
            Err(error) => {
                warn!("Malformed identity from player {}: {}", player.network_id(), error);
                self.reject_player(player, "malformed identity");
                return;
            }
        };

        // same process reconnecting, the old connection is stale
        if let Some(stale) = self.players.find_by_guid(&request.instance_guid) {
            if !Arc::ptr_eq(&stale, player) {
                info!(
                    "Player {} re-identified as {}, dropping the stale connection",
                    stale.network_id(),
                    player.network_id()
                );
                self.on_player_disconnected(&stale);
            }
        }
        player.set_instance_guid(&request.instance_guid);
        player.set_pending_accepted(true);

        let authenticator = self
            .authenticator
            .read()
            .ok()
            .and_then(|authenticator| authenticator.clone());
        match authenticator {
            None => self.on_player_accepted(player),
            Some(authenticator) => match authenticator.verify(player, &request.credentials) {
                AuthDecision::Accept => {
                    self.on_player_authenticated(player);
                    self.on_player_accepted(player);
                }
                AuthDecision::Reject(reason) => self.reject_player(player, &reason),
            },
        }
    }

    fn handle_identity_reply(&self, frame: &Frame) {
        let FrameBody::Raw(bytes) = &frame.body else {
            warn!("Identity reply without a body");
            return;
        };
        let reply = match IdentityReply::de(&mut ByteReader::new(bytes)) {
            Ok(reply) => reply,
            Err(error) => {
                warn!("Malformed identity reply: {}", error);
                return;
            }
        };
        if self.me.is_accepted() {
            debug!("Ignoring repeated identity reply");
            return;
        }

        self.time.sync_from(frame.timestamp);
        self.me.set_network_id(reply.player_id);
        self.me.set_accepted();
        if let Some(server) = &self.server_player {
            server.set_accepted();
        }
        info!("Accepted by server as player {}", reply.player_id);
        self.events.server_accepted.notify(&());
    }

    // Engine groups

    fn handle_disconnect_notice(&self, player: &Arc<NetworkingPlayer>) {
        if self.is_server() {
            self.on_player_disconnected(player);
        } else {
            info!("Server closed the connection");
            self.disconnect(true);
        }
    }

    fn handle_cache_frame(&self, player: &Arc<NetworkingPlayer>, bytes: &[u8]) {
        let mut reader = ByteReader::new(bytes);

        if self.is_server() {
            let request = match CacheRequest::de(&mut reader) {
                Ok(request) => request,
                Err(error) => {
                    warn!("Malformed cache request from {}: {}", player.network_id(), error);
                    return;
                }
            };
            let response = CacheResponse {
                request_id: request.request_id,
                value: self.cache.get(&request.key),
            };
            let frame = self.frame(GroupId::Cache, FrameBody::Raw(encode(&response)));
            if let Err(error) = self.send_to(player, &frame) {
                warn!("Unable to answer cache request: {}", error);
            }
            return;
        }

        let response = match CacheResponse::de(&mut reader) {
            Ok(response) => response,
            Err(error) => {
                warn!("Malformed cache response: {}", error);
                return;
            }
        };
        let callback = self.lock_cache_requests().remove(&response.request_id);
        match callback {
            Some(callback) => callback(response.value),
            None => debug!("Cache response {} has no pending request", response.request_id),
        }
    }
}
