//! Host platform seam

use std::sync::atomic::{AtomicBool, Ordering};

use mirror_common::PlayerId;
use tracing::info;

/// Window-manager side of picture-in-picture
///
/// Called from the PiP controller task only, one call at a time.
pub trait PipHost: Send + Sync {
    /// Ask the host to show `player` in PiP; `false` if the host refuses
    fn enter_pip(&self, player: PlayerId) -> bool;

    /// Ask the host to leave PiP; the result is not awaited
    fn exit_pip(&self, player: PlayerId);

    /// Start delivering PiP media actions for `player`
    fn register_action_receiver(&self, player: PlayerId);

    fn unregister_action_receiver(&self, player: PlayerId);
}

/// Host for deployments without a window manager
///
/// Accepts or refuses every request according to its configuration and
/// otherwise only logs.
pub struct HeadlessHost {
    accept: AtomicBool,
}

impl HeadlessHost {
    pub fn new(accept: bool) -> Self {
        Self {
            accept: AtomicBool::new(accept),
        }
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PipHost for HeadlessHost {
    fn enter_pip(&self, player: PlayerId) -> bool {
        let accept = self.accept.load(Ordering::SeqCst);
        info!("Host PiP request for {}: {}", player, if accept { "accepted" } else { "refused" });
        accept
    }

    fn exit_pip(&self, player: PlayerId) {
        info!("Host PiP exit for {}", player);
    }

    fn register_action_receiver(&self, _player: PlayerId) {}

    fn unregister_action_receiver(&self, _player: PlayerId) {}
}
