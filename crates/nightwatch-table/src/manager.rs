//! Table manager: creates, tracks and tears down running games.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use nightwatch_protocol::GameId;

use crate::table::spawn_table;
use crate::{GameHandle, TableConfig, TableError};

/// Counter for generating unique game ids.
static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// Owns a handle to every live table.
///
/// The manager only routes; all game state lives in the actors.
#[derive(Debug, Default)]
pub struct TableManager {
    tables: HashMap<GameId, GameHandle>,
}

impl TableManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a table in `gameStart` and returns a handle to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn create_game(&mut self, config: TableConfig) -> GameHandle {
        let game_id = GameId(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_table(game_id, config);
        self.tables.insert(game_id, handle.clone());
        tracing::info!(%game_id, "game created");
        handle
    }

    pub fn get(&self, game_id: GameId) -> Result<GameHandle, TableError> {
        self.tables
            .get(&game_id)
            .cloned()
            .ok_or(TableError::NotFound(game_id))
    }

    /// Shuts a table down and forgets it.
    pub async fn destroy_game(&mut self, game_id: GameId) -> Result<(), TableError> {
        let handle = self
            .tables
            .remove(&game_id)
            .ok_or(TableError::NotFound(game_id))?;

        let _ = handle.shutdown().await;

        tracing::info!(%game_id, "game destroyed");
        Ok(())
    }

    /// Forgets tables whose actor has already stopped. Returns how many.
    pub fn reap(&mut self) -> usize {
        let before = self.tables.len();
        self.tables.retain(|_, handle| !handle.is_closed());
        let reaped = before - self.tables.len();
        if reaped > 0 {
            tracing::debug!(reaped, "stopped tables removed");
        }
        reaped
    }

    /// Returns the number of live tables.
    pub fn game_count(&self) -> usize {
        self.tables.len()
    }

    /// Lists all live game ids, lowest first.
    pub fn game_ids(&self) -> Vec<GameId> {
        let mut ids: Vec<GameId> = self.tables.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Returns cloned handles to every live table.
    pub fn handles(&self) -> Vec<GameHandle> {
        self.tables.values().cloned().collect()
    }
}
