//! Basic query operations: players, team context, historical stats

use super::{models::*, schema::ProjectionDatabase};
use crate::error::Result;
use crate::types::{PlayerId, PlayerStatus, Position};
use rusqlite::{params, types::Type, Row};
use std::collections::HashMap;

fn parse_column<T>(row_index: usize, raw: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(row_index, Type::Text, Box::new(e))
    })
}

impl ProjectionDatabase {
    /// Insert or update a player.
    pub fn upsert_player(&mut self, player: &Player) -> Result<()> {
        let now = Self::now();
        self.conn.execute(
            "INSERT INTO players (player_id, name, team, position, status, is_rookie,
                                  depth_chart_position, draft_position, draft_team,
                                  draft_round, draft_pick, is_fill_player, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
             ON CONFLICT(player_id) DO UPDATE SET
                 name = excluded.name,
                 team = excluded.team,
                 position = excluded.position,
                 status = excluded.status,
                 is_rookie = excluded.is_rookie,
                 depth_chart_position = excluded.depth_chart_position,
                 draft_position = excluded.draft_position,
                 draft_team = excluded.draft_team,
                 draft_round = excluded.draft_round,
                 draft_pick = excluded.draft_pick,
                 is_fill_player = excluded.is_fill_player,
                 updated_at = excluded.updated_at",
            params![
                player.player_id.as_str(),
                player.name,
                player.team,
                player.position.to_string(),
                player.status.to_string(),
                player.is_rookie,
                player.depth_chart_position,
                player.draft_position,
                player.draft_team,
                player.draft_round,
                player.draft_pick,
                player.is_fill_player,
                now,
            ],
        )?;
        Ok(())
    }

    /// Create a player with a freshly minted id and return it.
    pub fn create_player(
        &mut self,
        name: &str,
        team: &str,
        position: Position,
    ) -> Result<Player> {
        let mut player = Player::new(PlayerId::new(self.mint_id()?), name, team, position);
        player.created_at = Self::now();
        player.updated_at = player.created_at;
        self.upsert_player(&player)?;
        Ok(player)
    }

    /// Fetch a player by id.
    pub fn get_player(&self, player_id: &PlayerId) -> Result<Option<Player>> {
        let mut stmt = self.conn.prepare(
            "SELECT player_id, name, team, position, status, is_rookie, depth_chart_position,
                    draft_position, draft_team, draft_round, draft_pick, is_fill_player,
                    created_at, updated_at
             FROM players WHERE player_id = ?",
        )?;
        let result = stmt.query_row(params![player_id.as_str()], Self::row_to_player);
        match result {
            Ok(player) => Ok(Some(player)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List players, optionally filtered by team and position.
    pub fn list_players(
        &self,
        team: Option<&str>,
        position: Option<Position>,
    ) -> Result<Vec<Player>> {
        let mut query = String::from(
            "SELECT player_id, name, team, position, status, is_rookie, depth_chart_position,
                    draft_position, draft_team, draft_round, draft_pick, is_fill_player,
                    created_at, updated_at
             FROM players WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(team) = team {
            query.push_str(" AND team = ?");
            params.push(Box::new(team.to_string()));
        }
        if let Some(position) = position {
            query.push_str(" AND position = ?");
            params.push(Box::new(position.to_string()));
        }
        query.push_str(" ORDER BY name");

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            Self::row_to_player,
        )?;
        let mut players = Vec::new();
        for row in rows {
            players.push(row?);
        }
        Ok(players)
    }

    /// Find the fill player for a team/position pair, if one exists.
    pub fn find_fill_player(&self, team: &str, position: Position) -> Result<Option<Player>> {
        let mut stmt = self.conn.prepare(
            "SELECT player_id, name, team, position, status, is_rookie, depth_chart_position,
                    draft_position, draft_team, draft_round, draft_pick, is_fill_player,
                    created_at, updated_at
             FROM players WHERE team = ? AND position = ? AND is_fill_player = 1",
        )?;
        let result = stmt.query_row(
            params![team, position.to_string()],
            Self::row_to_player,
        );
        match result {
            Ok(player) => Ok(Some(player)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn row_to_player(row: &Row) -> rusqlite::Result<Player> {
        let position: String = row.get(3)?;
        let status: String = row.get(4)?;
        Ok(Player {
            player_id: PlayerId::new(row.get::<_, String>(0)?),
            name: row.get(1)?,
            team: row.get(2)?,
            position: parse_column::<Position>(3, position)?,
            status: parse_column::<PlayerStatus>(4, status)?,
            is_rookie: row.get(5)?,
            depth_chart_position: row.get(6)?,
            draft_position: row.get(7)?,
            draft_team: row.get(8)?,
            draft_round: row.get(9)?,
            draft_pick: row.get(10)?,
            is_fill_player: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    /// Insert or update a team's season aggregate. The derived rate columns
    /// are recomputed before the write.
    pub fn upsert_team_stat(&mut self, team_stat: &TeamStat) -> Result<TeamStat> {
        let mut stat = team_stat.clone();
        stat.recompute_derived();
        if stat.team_stat_id.is_empty() {
            stat.team_stat_id = self.mint_id()?;
        }
        let now = Self::now();
        self.conn.execute(
            "INSERT INTO team_stats (team_stat_id, team, season, week, plays, pass_attempts,
                                     pass_yards, pass_td, rush_attempts, rush_yards, rush_td,
                                     targets, receptions, rec_yards, rec_td, rank,
                                     pass_percentage, pass_td_rate, rush_yards_per_carry,
                                     created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?20)
             ON CONFLICT(team_stat_id) DO UPDATE SET
                 plays = excluded.plays,
                 pass_attempts = excluded.pass_attempts,
                 pass_yards = excluded.pass_yards,
                 pass_td = excluded.pass_td,
                 rush_attempts = excluded.rush_attempts,
                 rush_yards = excluded.rush_yards,
                 rush_td = excluded.rush_td,
                 targets = excluded.targets,
                 receptions = excluded.receptions,
                 rec_yards = excluded.rec_yards,
                 rec_td = excluded.rec_td,
                 rank = excluded.rank,
                 pass_percentage = excluded.pass_percentage,
                 pass_td_rate = excluded.pass_td_rate,
                 rush_yards_per_carry = excluded.rush_yards_per_carry,
                 updated_at = excluded.updated_at",
            params![
                stat.team_stat_id,
                stat.team,
                stat.season,
                stat.week,
                stat.plays,
                stat.pass_attempts,
                stat.pass_yards,
                stat.pass_td,
                stat.rush_attempts,
                stat.rush_yards,
                stat.rush_td,
                stat.targets,
                stat.receptions,
                stat.rec_yards,
                stat.rec_td,
                stat.rank,
                stat.pass_percentage,
                stat.pass_td_rate,
                stat.rush_yards_per_carry,
                now,
            ],
        )?;
        Ok(stat)
    }

    /// Season aggregate for a team (`week IS NULL` row).
    pub fn get_team_stat(&self, team: &str, season: u16) -> Result<Option<TeamStat>> {
        let mut stmt = self.conn.prepare(
            "SELECT team_stat_id, team, season, week, plays, pass_attempts, pass_yards, pass_td,
                    rush_attempts, rush_yards, rush_td, targets, receptions, rec_yards, rec_td,
                    rank, pass_percentage, pass_td_rate, rush_yards_per_carry,
                    created_at, updated_at
             FROM team_stats WHERE team = ? AND season = ? AND week IS NULL",
        )?;
        let result = stmt.query_row(params![team, season], Self::row_to_team_stat);
        match result {
            Ok(stat) => Ok(Some(stat)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_team_stat(row: &Row) -> rusqlite::Result<TeamStat> {
        Ok(TeamStat {
            team_stat_id: row.get(0)?,
            team: row.get(1)?,
            season: row.get(2)?,
            week: row.get(3)?,
            plays: row.get(4)?,
            pass_attempts: row.get(5)?,
            pass_yards: row.get(6)?,
            pass_td: row.get(7)?,
            rush_attempts: row.get(8)?,
            rush_yards: row.get(9)?,
            rush_td: row.get(10)?,
            targets: row.get(11)?,
            receptions: row.get(12)?,
            rec_yards: row.get(13)?,
            rec_td: row.get(14)?,
            rank: row.get(15)?,
            pass_percentage: row.get(16)?,
            pass_td_rate: row.get(17)?,
            rush_yards_per_carry: row.get(18)?,
            created_at: row.get(19)?,
            updated_at: row.get(20)?,
        })
    }

    /// Record one historical stat observation.
    pub fn insert_base_stat(
        &mut self,
        player_id: &PlayerId,
        season: u16,
        week: Option<u16>,
        stat_type: &str,
        value: f64,
    ) -> Result<()> {
        let stat_id = self.mint_id()?;
        self.conn.execute(
            "INSERT INTO base_stats (stat_id, player_id, season, week, stat_type, value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![stat_id, player_id.as_str(), season, week, stat_type, value],
        )?;
        Ok(())
    }

    /// Season-total stats for a player as a name -> value map
    /// (`week IS NULL` rows only).
    pub fn get_season_stats(
        &self,
        player_id: &PlayerId,
        season: u16,
    ) -> Result<HashMap<String, f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT stat_type, value FROM base_stats
             WHERE player_id = ? AND season = ? AND week IS NULL",
        )?;
        let rows = stmt.query_map(params![player_id.as_str(), season], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        let mut stats = HashMap::new();
        for row in rows {
            let (stat_type, value) = row?;
            stats.insert(stat_type, value);
        }
        Ok(stats)
    }

    /// Game-level values for one stat across a season range, ordered by
    /// season then week. Feeds the empirical variance model.
    pub fn get_game_values(
        &self,
        player_id: &PlayerId,
        stat_type: &str,
        season_min: u16,
        season_max: u16,
    ) -> Result<Vec<f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT value FROM base_stats
             WHERE player_id = ? AND stat_type = ? AND week IS NOT NULL
               AND season >= ? AND season <= ?
             ORDER BY season, week",
        )?;
        let rows = stmt.query_map(
            params![player_id.as_str(), stat_type, season_min, season_max],
            |row| row.get::<_, f64>(0),
        )?;
        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }
}
