use crate::player::NetworkingPlayer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthDecision {
    Accept,
    /// Carries a reason that is logged and sent to the player
    Reject(String),
}

/// Decides whether an identifying player is let in.
///
/// Runs on the transport's reader thread while the server handles the
/// player's identification frame. Closures of the right shape implement it.
pub trait Authenticator: Send + Sync {
    fn verify(&self, player: &NetworkingPlayer, credentials: &[u8]) -> AuthDecision;
}

impl<F> Authenticator for F
where
    F: Fn(&NetworkingPlayer, &[u8]) -> AuthDecision + Send + Sync,
{
    fn verify(&self, player: &NetworkingPlayer, credentials: &[u8]) -> AuthDecision {
        self(player, credentials)
    }
}
