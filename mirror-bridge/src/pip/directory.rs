//! Players known to the PiP machine

use std::collections::BTreeMap;

use mirror_common::PlayerId;

use crate::engine::EngineHandle;

pub struct PlayerEntry {
    pub engine: EngineHandle,
    pub pip_capable: bool,
}

/// Registered players and their PiP capability
///
/// Constructed by the application and handed to the machine; there is no
/// process-wide player table.
#[derive(Default)]
pub struct PlayerDirectory {
    players: BTreeMap<PlayerId, PlayerEntry>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the player was already registered (entry replaced)
    pub fn register(&mut self, player: PlayerId, engine: EngineHandle, pip_capable: bool) -> bool {
        self.players
            .insert(
                player,
                PlayerEntry {
                    engine,
                    pip_capable,
                },
            )
            .is_none()
    }

    pub fn unregister(&mut self, player: PlayerId) -> Option<PlayerEntry> {
        self.players.remove(&player)
    }

    pub fn get(&self, player: PlayerId) -> Option<&PlayerEntry> {
        self.players.get(&player)
    }

    /// Players declaring themselves PiP-capable, in id order
    pub fn eligible(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|(_, entry)| entry.pip_capable)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
