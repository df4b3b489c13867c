//! Database schema and connection management

use crate::error::{GridironError, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV_VAR: &str = "GRIDIRON_DATA_DIR";

/// Database connection manager for projection data
pub struct ProjectionDatabase {
    pub(crate) conn: Connection,
}

impl ProjectionDatabase {
    /// Open (creating if needed) the database at the default location:
    /// `$GRIDIRON_DATA_DIR/projections.db` when the env var is set,
    /// otherwise the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(&Self::database_path()?)
    }

    /// Open (creating if needed) the database at an explicit path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let mut db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// In-memory database for tests and ephemeral runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Resolve the database file path.
    fn database_path() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV_VAR) {
            return Ok(PathBuf::from(dir).join("projections.db"));
        }
        let data_dir = dirs::data_dir().ok_or_else(|| GridironError::InvalidInput {
            message: "could not determine data directory".to_string(),
        })?;
        Ok(data_dir.join("gridiron").join("projections.db"))
    }

    /// Mint an opaque entity id.
    pub(crate) fn mint_id(&self) -> Result<String> {
        let id: String = self
            .conn
            .query_row("SELECT lower(hex(randomblob(16)))", [], |row| row.get(0))?;
        Ok(id)
    }

    /// Seconds since the epoch, used for created/updated stamps.
    pub(crate) fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// Initialize the database schema. Idempotent.
    pub(crate) fn initialize_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS players (
                player_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                team TEXT NOT NULL,
                position TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Active',
                is_rookie INTEGER NOT NULL DEFAULT 0,
                depth_chart_position TEXT NOT NULL DEFAULT 'Backup',
                draft_position INTEGER,
                draft_team TEXT,
                draft_round INTEGER,
                draft_pick INTEGER,
                is_fill_player INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS team_stats (
                team_stat_id TEXT PRIMARY KEY,
                team TEXT NOT NULL,
                season INTEGER NOT NULL,
                week INTEGER,
                plays REAL NOT NULL,
                pass_attempts REAL NOT NULL,
                pass_yards REAL NOT NULL,
                pass_td REAL NOT NULL,
                rush_attempts REAL NOT NULL,
                rush_yards REAL NOT NULL,
                rush_td REAL NOT NULL,
                targets REAL NOT NULL,
                receptions REAL NOT NULL,
                rec_yards REAL NOT NULL,
                rec_td REAL NOT NULL,
                rank INTEGER,
                pass_percentage REAL NOT NULL,
                pass_td_rate REAL NOT NULL,
                rush_yards_per_carry REAL NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS base_stats (
                stat_id TEXT PRIMARY KEY,
                player_id TEXT NOT NULL REFERENCES players(player_id),
                season INTEGER NOT NULL,
                week INTEGER,
                stat_type TEXT NOT NULL,
                value REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS scenarios (
                scenario_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                is_baseline INTEGER NOT NULL DEFAULT 0,
                base_scenario_id TEXT,
                season INTEGER NOT NULL,
                parameters TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projections (
                projection_id TEXT PRIMARY KEY,
                player_id TEXT NOT NULL REFERENCES players(player_id),
                scenario_id TEXT REFERENCES scenarios(scenario_id),
                season INTEGER NOT NULL,
                games INTEGER NOT NULL,
                half_ppr REAL NOT NULL,
                pass_attempts REAL,
                completions REAL,
                pass_yards REAL,
                pass_td REAL,
                interceptions REAL,
                sacks REAL,
                sack_yards REAL,
                net_pass_yards REAL,
                comp_pct REAL,
                yards_per_att REAL,
                net_yards_per_att REAL,
                pass_td_rate REAL,
                int_rate REAL,
                sack_rate REAL,
                rush_attempts REAL,
                rush_yards REAL,
                rush_td REAL,
                fumbles REAL,
                net_rush_yards REAL,
                yards_per_carry REAL,
                rush_td_rate REAL,
                fumble_rate REAL,
                targets REAL,
                receptions REAL,
                rec_yards REAL,
                rec_td REAL,
                catch_pct REAL,
                yards_per_target REAL,
                rec_td_rate REAL,
                snap_share REAL,
                target_share REAL,
                rush_share REAL,
                redzone_share REAL,
                pass_att_pct REAL,
                tar_pct REAL,
                car_pct REAL,
                has_overrides INTEGER NOT NULL DEFAULT 0,
                is_fill_player INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stat_overrides (
                override_id TEXT PRIMARY KEY,
                player_id TEXT NOT NULL REFERENCES players(player_id),
                projection_id TEXT NOT NULL REFERENCES projections(projection_id),
                stat_name TEXT NOT NULL,
                calculated_value REAL NOT NULL,
                manual_value REAL NOT NULL,
                notes TEXT,
                created_at INTEGER NOT NULL,
                UNIQUE (projection_id, stat_name)
            );

            CREATE INDEX IF NOT EXISTS idx_players_team_position
                ON players(team, position);
            CREATE INDEX IF NOT EXISTS idx_team_stats_team_season
                ON team_stats(team, season);
            CREATE INDEX IF NOT EXISTS idx_base_stats_player_season
                ON base_stats(player_id, season);
            CREATE INDEX IF NOT EXISTS idx_projections_player_season
                ON projections(player_id, season);
            CREATE INDEX IF NOT EXISTS idx_projections_scenario_season
                ON projections(scenario_id, season);
            CREATE INDEX IF NOT EXISTS idx_overrides_player
                ON stat_overrides(player_id);
            CREATE INDEX IF NOT EXISTS idx_overrides_projection
                ON stat_overrides(projection_id);
            ",
        )?;
        Ok(())
    }
}
