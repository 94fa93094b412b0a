//! Read-only view of the team/player registry.
//!
//! Team and player records are owned elsewhere; the engine only needs to
//! know whether an id exists and what to call it.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{PlayerId, TeamId};

/// Display name used when a registry lookup finds nothing.
pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub team: Option<TeamId>,
}

pub trait Registry: Send + Sync {
    fn team(&self, id: TeamId) -> Option<TeamRecord>;

    fn player(&self, id: PlayerId) -> Option<PlayerRecord>;

    fn team_name(&self, id: TeamId) -> String {
        self.team(id).map(|t| t.name).unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    fn player_name(&self, id: PlayerId) -> String {
        self.player(id).map(|p| p.name).unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    teams: RwLock<HashMap<TeamId, TeamRecord>>,
    players: RwLock<HashMap<PlayerId, PlayerRecord>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_team(&self, id: TeamId, name: impl Into<String>) -> &Self {
        self.insert_team(TeamRecord { id, name: name.into(), short_name: None })
    }

    pub fn insert_team(&self, record: TeamRecord) -> &Self {
        self.teams.write().insert(record.id, record);
        self
    }

    pub fn add_player(&self, id: PlayerId, name: impl Into<String>, team: TeamId) -> &Self {
        self.insert_player(PlayerRecord { id, name: name.into(), team: Some(team) })
    }

    pub fn insert_player(&self, record: PlayerRecord) -> &Self {
        self.players.write().insert(record.id, record);
        self
    }

    /// Players registered for a team, ordered by id.
    pub fn squad(&self, team: TeamId) -> Vec<PlayerRecord> {
        let mut squad: Vec<PlayerRecord> =
            self.players.read().values().filter(|p| p.team == Some(team)).cloned().collect();
        squad.sort_by_key(|p| p.id);
        squad
    }
}

impl Registry for MemoryRegistry {
    fn team(&self, id: TeamId) -> Option<TeamRecord> {
        self.teams.read().get(&id).cloned()
    }

    fn player(&self, id: PlayerId) -> Option<PlayerRecord> {
        self.players.read().get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_fallback_names() {
        let registry = MemoryRegistry::new();
        registry.add_team(TeamId(1), "Lions").add_player(PlayerId(7), "A. Khan", TeamId(1));

        assert_eq!(registry.team_name(TeamId(1)), "Lions");
        assert_eq!(registry.player_name(PlayerId(7)), "A. Khan");
        assert_eq!(registry.team_name(TeamId(2)), UNKNOWN_NAME);
        assert_eq!(registry.player_name(PlayerId(8)), UNKNOWN_NAME);
        assert_eq!(registry.squad(TeamId(1)).len(), 1);
    }
}
