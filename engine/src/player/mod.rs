mod networking_player;
mod player_registry;

pub use networking_player::{NetworkingPlayer, PlayerState};
pub use player_registry::PlayerRegistry;
