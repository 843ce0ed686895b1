use std::sync::Arc;

use log::{info, warn};

use crate::{
    error::WorkerError,
    frame::{FrameBody, GroupId},
    player::NetworkingPlayer,
    worker::{
        net_worker::{elapsed_since, encode},
        IdentityReply, NetWorker,
    },
};

impl NetWorker {
    /// Server: a transport opened a connection. Fails if the player (or its
    /// id) is already known, leaving the player set unchanged
    pub fn on_player_connected(&self, player: &Arc<NetworkingPlayer>) -> Result<(), WorkerError> {
        if !self.is_server() {
            return Err(WorkerError::WrongHostType {
                operation: "on_player_connected",
            });
        }
        self.players.add(player.clone())?;
        player.set_connected(true);
        player.mark_seen(self.time.ticks());

        info!(
            "Player {} connected from {}:{}",
            player.network_id(),
            player.address(),
            player.port()
        );
        self.events.player_connected.notify(player);
        Ok(())
    }

    /// Server: lets the player in. It receives its id and, in one batch,
    /// every object initialized before this moment; objects initialized
    /// afterwards reach it through the regular create broadcast
    pub fn on_player_accepted(&self, player: &Arc<NetworkingPlayer>) {
        if !self.players.contains(player) || player.is_accepted() {
            return;
        }

        let (objects, ()) = self.objects.snapshot_with(|| player.set_accepted());

        let reply = self.frame(
            GroupId::Identity,
            FrameBody::Raw(encode(&IdentityReply {
                player_id: player.network_id(),
            })),
        );
        if let Err(error) = self.send_to(player, &reply) {
            warn!("Unable to send acceptance to player {}: {}", player.network_id(), error);
        }

        let live: Vec<_> = objects
            .into_iter()
            .filter(|object| !object.is_destroyed())
            .collect();
        if !live.is_empty() {
            let batch = self.accept_multi_frame(&live);
            if let Err(error) = self.send_to(player, &batch) {
                warn!("Unable to send objects to player {}: {}", player.network_id(), error);
            }
        }

        info!("Player {} accepted with {} object(s)", player.network_id(), live.len());
        self.events.player_accepted.notify(player);
    }

    /// Server: refuses the player and drops its connection
    pub fn on_player_rejected(&self, player: &Arc<NetworkingPlayer>) {
        self.reject_player(player, "rejected by server");
    }

    pub(super) fn reject_player(&self, player: &Arc<NetworkingPlayer>, reason: &str) {
        if player.is_rejected() {
            return;
        }
        player.set_rejected();

        let notice = self.frame(GroupId::Disconnect, FrameBody::Raw(encode(&reason.to_string())));
        if let Err(error) = self.send_to(player, &notice) {
            warn!("Unable to notify rejected player {}: {}", player.network_id(), error);
        }

        self.players.remove(player.network_id());
        player.begin_disconnect();
        player.set_disconnected();
        if let Some(transport) = self.transport() {
            transport.disconnect_player(player, false);
        }

        warn!("Player {} rejected: {}", player.network_id(), reason);
        self.events.player_rejected.notify(player);
    }

    pub fn on_player_authenticated(&self, player: &Arc<NetworkingPlayer>) {
        if player.is_authenticated() {
            return;
        }
        player.set_authenticated();
        self.events.player_authenticated.notify(player);
    }

    /// Removes the player. `player_disconnected` fires once per player, no
    /// matter how many times this is called
    pub fn on_player_disconnected(&self, player: &Arc<NetworkingPlayer>) {
        if self.remove_player(player, false) {
            info!("Player {} disconnected", player.network_id());
            self.events.player_disconnected.notify(player);
        }
    }

    /// Like `on_player_disconnected`, for a player that went silent
    pub fn on_player_timeout(&self, player: &Arc<NetworkingPlayer>) {
        if self.remove_player(player, true) {
            warn!("Player {} timed out", player.network_id());
            self.events.player_timeout.notify(player);
        }
    }

    fn remove_player(&self, player: &Arc<NetworkingPlayer>, forced: bool) -> bool {
        if !player.begin_disconnect() {
            return false;
        }
        self.players.remove(player.network_id());
        player.set_disconnected();

        if let Some(transport) = self.transport() {
            transport.disconnect_player(player, forced);
        }
        if self.is_server() && self.config.destroy_owned_objects_on_disconnect {
            self.destroy_objects_owned_by(player.network_id());
        }
        true
    }

    /// Times out peers that have been silent for `player_timeout`. A client
    /// whose server went silent disconnects
    pub(super) fn check_timeouts(&self) {
        let timeout = self.config.player_timeout;
        if timeout.is_zero() {
            return;
        }
        let now = self.time.ticks();

        match &self.server_player {
            None => {
                for player in self.players.snapshot() {
                    if elapsed_since(now, player.last_seen_ticks()) >= timeout {
                        self.on_player_timeout(&player);
                    }
                }
            }
            Some(server) => {
                if elapsed_since(now, server.last_seen_ticks()) >= timeout {
                    warn!("Server timed out");
                    self.events.player_timeout.notify(server);
                    self.disconnect(true);
                }
            }
        }
    }
}
