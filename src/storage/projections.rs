//! Projection, scenario, and override persistence.
//!
//! Multi-row writes (scenario clone and delete, override apply, fill
//! reconciliation) run inside a single transaction so each engine operation
//! is all-or-nothing.

use super::{models::*, schema::ProjectionDatabase};
use crate::error::{GridironError, Result};
use crate::types::{OverrideId, PlayerId, Position, ProjectionId, ScenarioId};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;

const PROJECTION_COLUMNS: &str = "projection_id, player_id, scenario_id, season, games, half_ppr,
    pass_attempts, completions, pass_yards, pass_td, interceptions, sacks, sack_yards,
    net_pass_yards, comp_pct, yards_per_att, net_yards_per_att, pass_td_rate, int_rate, sack_rate,
    rush_attempts, rush_yards, rush_td, fumbles, net_rush_yards, yards_per_carry, rush_td_rate,
    fumble_rate, targets, receptions, rec_yards, rec_td, catch_pct, yards_per_target, rec_td_rate,
    snap_share, target_share, rush_share, redzone_share, pass_att_pct, tar_pct, car_pct,
    has_overrides, is_fill_player, created_at, updated_at";

/// Filters for projection listings. `scenario_id` distinguishes "any
/// scenario" (`None`) from "the global baseline" (`Some(None)`).
#[derive(Debug, Default, Clone)]
pub struct ProjectionFilter {
    pub scenario_id: Option<Option<ScenarioId>>,
    pub season: Option<u16>,
    pub position: Option<Position>,
    pub team: Option<String>,
    pub half_ppr_min: Option<f64>,
    pub half_ppr_max: Option<f64>,
    pub include_fill_players: bool,
}

fn projection_params(p: &Projection) -> [&dyn rusqlite::ToSql; 46] {
    [
        &p.projection_id.0,
        &p.player_id.0,
        &p.scenario_id,
        &p.season,
        &p.games,
        &p.half_ppr,
        &p.pass_attempts,
        &p.completions,
        &p.pass_yards,
        &p.pass_td,
        &p.interceptions,
        &p.sacks,
        &p.sack_yards,
        &p.net_pass_yards,
        &p.comp_pct,
        &p.yards_per_att,
        &p.net_yards_per_att,
        &p.pass_td_rate,
        &p.int_rate,
        &p.sack_rate,
        &p.rush_attempts,
        &p.rush_yards,
        &p.rush_td,
        &p.fumbles,
        &p.net_rush_yards,
        &p.yards_per_carry,
        &p.rush_td_rate,
        &p.fumble_rate,
        &p.targets,
        &p.receptions,
        &p.rec_yards,
        &p.rec_td,
        &p.catch_pct,
        &p.yards_per_target,
        &p.rec_td_rate,
        &p.snap_share,
        &p.target_share,
        &p.rush_share,
        &p.redzone_share,
        &p.pass_att_pct,
        &p.tar_pct,
        &p.car_pct,
        &p.has_overrides,
        &p.is_fill_player,
        &p.created_at,
        &p.updated_at,
    ]
}

impl rusqlite::ToSql for ScenarioId {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

pub(crate) fn insert_projection_tx(conn: &Connection, p: &Projection) -> rusqlite::Result<()> {
    let placeholders = (1..=46)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute(
        &format!(
            "INSERT INTO projections ({}) VALUES ({})",
            PROJECTION_COLUMNS, placeholders
        ),
        &projection_params(p)[..],
    )?;
    Ok(())
}

pub(crate) fn update_projection_tx(conn: &Connection, p: &Projection) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE projections SET
            season = ?4, games = ?5, half_ppr = ?6,
            pass_attempts = ?7, completions = ?8, pass_yards = ?9, pass_td = ?10,
            interceptions = ?11, sacks = ?12, sack_yards = ?13, net_pass_yards = ?14,
            comp_pct = ?15, yards_per_att = ?16, net_yards_per_att = ?17, pass_td_rate = ?18,
            int_rate = ?19, sack_rate = ?20, rush_attempts = ?21, rush_yards = ?22,
            rush_td = ?23, fumbles = ?24, net_rush_yards = ?25, yards_per_carry = ?26,
            rush_td_rate = ?27, fumble_rate = ?28, targets = ?29, receptions = ?30,
            rec_yards = ?31, rec_td = ?32, catch_pct = ?33, yards_per_target = ?34,
            rec_td_rate = ?35, snap_share = ?36, target_share = ?37, rush_share = ?38,
            redzone_share = ?39, pass_att_pct = ?40, tar_pct = ?41, car_pct = ?42,
            has_overrides = ?43, is_fill_player = ?44, updated_at = ?46
         WHERE projection_id = ?1",
        &projection_params(p)[..],
    )
}

pub(crate) fn row_to_projection(row: &Row) -> rusqlite::Result<Projection> {
    Ok(Projection {
        projection_id: ProjectionId::new(row.get::<_, String>(0)?),
        player_id: PlayerId::new(row.get::<_, String>(1)?),
        scenario_id: row.get::<_, Option<String>>(2)?.map(ScenarioId::new),
        season: row.get(3)?,
        games: row.get(4)?,
        half_ppr: row.get(5)?,
        pass_attempts: row.get(6)?,
        completions: row.get(7)?,
        pass_yards: row.get(8)?,
        pass_td: row.get(9)?,
        interceptions: row.get(10)?,
        sacks: row.get(11)?,
        sack_yards: row.get(12)?,
        net_pass_yards: row.get(13)?,
        comp_pct: row.get(14)?,
        yards_per_att: row.get(15)?,
        net_yards_per_att: row.get(16)?,
        pass_td_rate: row.get(17)?,
        int_rate: row.get(18)?,
        sack_rate: row.get(19)?,
        rush_attempts: row.get(20)?,
        rush_yards: row.get(21)?,
        rush_td: row.get(22)?,
        fumbles: row.get(23)?,
        net_rush_yards: row.get(24)?,
        yards_per_carry: row.get(25)?,
        rush_td_rate: row.get(26)?,
        fumble_rate: row.get(27)?,
        targets: row.get(28)?,
        receptions: row.get(29)?,
        rec_yards: row.get(30)?,
        rec_td: row.get(31)?,
        catch_pct: row.get(32)?,
        yards_per_target: row.get(33)?,
        rec_td_rate: row.get(34)?,
        snap_share: row.get(35)?,
        target_share: row.get(36)?,
        rush_share: row.get(37)?,
        redzone_share: row.get(38)?,
        pass_att_pct: row.get(39)?,
        tar_pct: row.get(40)?,
        car_pct: row.get(41)?,
        has_overrides: row.get(42)?,
        is_fill_player: row.get(43)?,
        created_at: row.get(44)?,
        updated_at: row.get(45)?,
    })
}

/// Copy every projection and override under `source` into `target` with
/// freshly minted ids. Runs against an open transaction.
fn copy_scenario_rows(
    tx: &Connection,
    source: &ScenarioId,
    target: &ScenarioId,
    now: i64,
) -> Result<usize> {
    let mut copied = 0usize;
    let mut id_map: HashMap<String, String> = HashMap::new();

    let mut stmt = tx.prepare(&format!(
        "SELECT {} FROM projections WHERE scenario_id = ?",
        PROJECTION_COLUMNS
    ))?;
    let rows = stmt.query_map(params![source.as_str()], row_to_projection)?;
    let mut projections = Vec::new();
    for row in rows {
        projections.push(row?);
    }

    for mut projection in projections {
        let new_id: String =
            tx.query_row("SELECT lower(hex(randomblob(16)))", [], |row| row.get(0))?;
        id_map.insert(projection.projection_id.as_str().to_string(), new_id.clone());
        projection.projection_id = ProjectionId::new(new_id);
        projection.scenario_id = Some(target.clone());
        projection.created_at = now;
        projection.updated_at = now;
        insert_projection_tx(tx, &projection)?;
        copied += 1;
    }

    let mut stmt = tx.prepare(
        "SELECT o.override_id, o.player_id, o.projection_id, o.stat_name,
                o.calculated_value, o.manual_value, o.notes, o.created_at
         FROM stat_overrides o
         JOIN projections p ON o.projection_id = p.projection_id
         WHERE p.scenario_id = ?",
    )?;
    let rows = stmt.query_map(params![source.as_str()], row_to_override)?;
    let mut overrides = Vec::new();
    for row in rows {
        overrides.push(row?);
    }

    for override_row in overrides {
        let new_projection_id = id_map
            .get(override_row.projection_id.as_str())
            .cloned()
            .ok_or_else(|| GridironError::Internal {
                message: format!(
                    "override {} references projection outside scenario {}",
                    override_row.override_id, source
                ),
            })?;
        let new_override_id: String =
            tx.query_row("SELECT lower(hex(randomblob(16)))", [], |row| row.get(0))?;
        tx.execute(
            "INSERT INTO stat_overrides (override_id, player_id, projection_id, stat_name,
                                         calculated_value, manual_value, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new_override_id,
                override_row.player_id.as_str(),
                new_projection_id,
                override_row.stat_name,
                override_row.calculated_value,
                override_row.manual_value,
                override_row.notes,
                now,
            ],
        )?;
    }

    Ok(copied)
}

fn row_to_override(row: &Row) -> rusqlite::Result<StatOverride> {
    Ok(StatOverride {
        override_id: OverrideId::new(row.get::<_, String>(0)?),
        player_id: PlayerId::new(row.get::<_, String>(1)?),
        projection_id: ProjectionId::new(row.get::<_, String>(2)?),
        stat_name: row.get(3)?,
        calculated_value: row.get(4)?,
        manual_value: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl ProjectionDatabase {
    /// Insert a new projection row.
    pub fn insert_projection(&mut self, projection: &mut Projection) -> Result<()> {
        if projection.projection_id.as_str().is_empty() {
            projection.projection_id = ProjectionId::new(self.mint_id()?);
        }
        let now = Self::now();
        projection.created_at = now;
        projection.updated_at = now;
        insert_projection_tx(&self.conn, projection)?;
        Ok(())
    }

    /// Persist the current state of a projection, refreshing `updated_at`.
    pub fn save_projection(&mut self, projection: &mut Projection) -> Result<()> {
        projection.updated_at = Self::now();
        let changed = update_projection_tx(&self.conn, projection)?;
        if changed == 0 {
            return Err(GridironError::ProjectionNotFound {
                projection_id: projection.projection_id.to_string(),
            });
        }
        Ok(())
    }

    /// Overwrite a projection from scratch: drop every override row
    /// attached to it and write the new stats in one transaction. Used
    /// when a baseline or rookie build replaces an existing row, where
    /// stale override snapshots would otherwise desync from the rebuilt
    /// stats. Returns how many override rows were dropped.
    pub fn rebuild_projection(&mut self, projection: &mut Projection) -> Result<usize> {
        projection.updated_at = Self::now();
        let tx = self.conn.transaction()?;
        let cleared = tx.execute(
            "DELETE FROM stat_overrides WHERE projection_id = ?",
            params![projection.projection_id.as_str()],
        )?;
        let changed = update_projection_tx(&tx, projection)?;
        if changed == 0 {
            return Err(GridironError::ProjectionNotFound {
                projection_id: projection.projection_id.to_string(),
            });
        }
        tx.commit()?;
        Ok(cleared)
    }

    /// Fetch a projection by id.
    pub fn get_projection(&self, projection_id: &ProjectionId) -> Result<Option<Projection>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM projections WHERE projection_id = ?",
            PROJECTION_COLUMNS
        ))?;
        let result = stmt.query_row(params![projection_id.as_str()], row_to_projection);
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The unique projection for (player, season, scenario); `None` scenario
    /// selects the global baseline.
    pub fn find_projection(
        &self,
        player_id: &PlayerId,
        season: u16,
        scenario_id: Option<&ScenarioId>,
    ) -> Result<Option<Projection>> {
        let mut query = format!(
            "SELECT {} FROM projections WHERE player_id = ? AND season = ?",
            PROJECTION_COLUMNS
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(player_id.as_str().to_string()),
            Box::new(season),
        ];
        match scenario_id {
            Some(id) => {
                query.push_str(" AND scenario_id = ?");
                params.push(Box::new(id.as_str().to_string()));
            }
            None => query.push_str(" AND scenario_id IS NULL"),
        }
        let mut stmt = self.conn.prepare(&query)?;
        let result = stmt.query_row(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            row_to_projection,
        );
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All projections for a player across scenarios.
    pub fn get_player_projections(&self, player_id: &PlayerId) -> Result<Vec<Projection>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM projections WHERE player_id = ? ORDER BY season",
            PROJECTION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![player_id.as_str()], row_to_projection)?;
        let mut projections = Vec::new();
        for row in rows {
            projections.push(row?);
        }
        Ok(projections)
    }

    /// Filtered projection listing joined with player info.
    pub fn list_projections(&self, filter: &ProjectionFilter) -> Result<Vec<(Projection, Player)>> {
        let mut query = format!(
            "SELECT {}, pl.player_id, pl.name, pl.team, pl.position, pl.status, pl.is_rookie,
                    pl.depth_chart_position, pl.draft_position, pl.draft_team, pl.draft_round,
                    pl.draft_pick, pl.is_fill_player, pl.created_at, pl.updated_at
             FROM projections p JOIN players pl ON p.player_id = pl.player_id WHERE 1=1",
            PROJECTION_COLUMNS
                .split(',')
                .map(|c| format!("p.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        match &filter.scenario_id {
            Some(Some(id)) => {
                query.push_str(" AND p.scenario_id = ?");
                params.push(Box::new(id.as_str().to_string()));
            }
            Some(None) => query.push_str(" AND p.scenario_id IS NULL"),
            None => {}
        }
        if let Some(season) = filter.season {
            query.push_str(" AND p.season = ?");
            params.push(Box::new(season));
        }
        if let Some(position) = filter.position {
            query.push_str(" AND pl.position = ?");
            params.push(Box::new(position.to_string()));
        }
        if let Some(team) = &filter.team {
            query.push_str(" AND pl.team = ?");
            params.push(Box::new(team.clone()));
        }
        if let Some(min) = filter.half_ppr_min {
            query.push_str(" AND p.half_ppr >= ?");
            params.push(Box::new(min));
        }
        if let Some(max) = filter.half_ppr_max {
            query.push_str(" AND p.half_ppr <= ?");
            params.push(Box::new(max));
        }
        if !filter.include_fill_players {
            query.push_str(" AND p.is_fill_player = 0");
        }
        query.push_str(" ORDER BY p.half_ppr DESC");

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            |row| {
                let projection = row_to_projection(row)?;
                let position: String = row.get(49)?;
                let status: String = row.get(50)?;
                let player = Player {
                    player_id: PlayerId::new(row.get::<_, String>(46)?),
                    name: row.get(47)?,
                    team: row.get(48)?,
                    position: position.parse().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            49,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?,
                    status: status.parse().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            50,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?,
                    is_rookie: row.get(51)?,
                    depth_chart_position: row.get(52)?,
                    draft_position: row.get(53)?,
                    draft_team: row.get(54)?,
                    draft_round: row.get(55)?,
                    draft_pick: row.get(56)?,
                    is_fill_player: row.get(57)?,
                    created_at: row.get(58)?,
                    updated_at: row.get(59)?,
                };
                Ok((projection, player))
            },
        )?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Projections for every player on a team in one season/scenario,
    /// including fill players.
    pub fn projections_for_team(
        &self,
        team: &str,
        season: u16,
        scenario_id: Option<&ScenarioId>,
    ) -> Result<Vec<(Projection, Player)>> {
        let filter = ProjectionFilter {
            scenario_id: Some(scenario_id.cloned()),
            season: Some(season),
            team: Some(team.to_string()),
            include_fill_players: true,
            ..Default::default()
        };
        self.list_projections(&filter)
    }

    /// Persist several projections in one transaction.
    pub fn save_projections(&mut self, projections: &mut [Projection]) -> Result<()> {
        let now = Self::now();
        let tx = self.conn.transaction()?;
        for projection in projections.iter_mut() {
            projection.updated_at = now;
            update_projection_tx(&tx, projection)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete a projection and its overrides.
    pub fn delete_projection(&mut self, projection_id: &ProjectionId) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM stat_overrides WHERE projection_id = ?",
            params![projection_id.as_str()],
        )?;
        tx.execute(
            "DELETE FROM projections WHERE projection_id = ?",
            params![projection_id.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Delete the fill-player projections for (team, season, scenario) and
    /// return how many were removed.
    pub fn delete_fill_projections(
        &mut self,
        team: &str,
        season: u16,
        scenario_id: Option<&ScenarioId>,
    ) -> Result<usize> {
        let mut query = String::from(
            "DELETE FROM projections WHERE is_fill_player = 1 AND season = ?1
               AND player_id IN (SELECT player_id FROM players WHERE team = ?2)",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(season), Box::new(team.to_string())];
        match scenario_id {
            Some(id) => {
                query.push_str(" AND scenario_id = ?3");
                params.push(Box::new(id.as_str().to_string()));
            }
            None => query.push_str(" AND scenario_id IS NULL"),
        }
        let deleted = self.conn.execute(
            &query,
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
        )?;
        Ok(deleted)
    }

    // ---- scenarios ----

    /// Insert a scenario row and return it with id and stamps set.
    pub fn insert_scenario(
        &mut self,
        name: &str,
        description: Option<&str>,
        base_scenario_id: Option<&ScenarioId>,
        season: u16,
        parameters: Option<serde_json::Value>,
    ) -> Result<Scenario> {
        let scenario = Scenario {
            scenario_id: ScenarioId::new(self.mint_id()?),
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            is_baseline: false,
            base_scenario_id: base_scenario_id.cloned(),
            season,
            parameters,
            created_at: Self::now(),
            updated_at: Self::now(),
        };
        self.conn.execute(
            "INSERT INTO scenarios (scenario_id, name, description, is_baseline,
                                    base_scenario_id, season, parameters, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                scenario.scenario_id.as_str(),
                scenario.name,
                scenario.description,
                scenario.is_baseline,
                scenario.base_scenario_id.as_ref().map(|s| s.as_str()),
                scenario.season,
                scenario
                    .parameters
                    .as_ref()
                    .map(|p| p.to_string()),
                scenario.created_at,
                scenario.updated_at,
            ],
        )?;
        Ok(scenario)
    }

    /// Fetch a scenario by id.
    pub fn get_scenario(&self, scenario_id: &ScenarioId) -> Result<Option<Scenario>> {
        let mut stmt = self.conn.prepare(
            "SELECT scenario_id, name, description, is_baseline, base_scenario_id, season,
                    parameters, created_at, updated_at
             FROM scenarios WHERE scenario_id = ?",
        )?;
        let result = stmt.query_row(params![scenario_id.as_str()], Self::row_to_scenario);
        match result {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All scenarios, newest first.
    pub fn list_scenarios(&self) -> Result<Vec<Scenario>> {
        let mut stmt = self.conn.prepare(
            "SELECT scenario_id, name, description, is_baseline, base_scenario_id, season,
                    parameters, created_at, updated_at
             FROM scenarios ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], Self::row_to_scenario)?;
        let mut scenarios = Vec::new();
        for row in rows {
            scenarios.push(row?);
        }
        Ok(scenarios)
    }

    fn row_to_scenario(row: &Row) -> rusqlite::Result<Scenario> {
        let parameters: Option<String> = row.get(6)?;
        Ok(Scenario {
            scenario_id: ScenarioId::new(row.get::<_, String>(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            is_baseline: row.get(3)?,
            base_scenario_id: row.get::<_, Option<String>>(4)?.map(ScenarioId::new),
            season: row.get(5)?,
            parameters: parameters.and_then(|p| serde_json::from_str(&p).ok()),
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    /// Deep-copy every projection and override from `source` into `target`.
    /// All-or-nothing; returns the number of projections copied.
    pub fn clone_scenario_rows(
        &mut self,
        source: &ScenarioId,
        target: &ScenarioId,
    ) -> Result<usize> {
        let now = Self::now();
        let tx = self.conn.transaction()?;
        let copied = copy_scenario_rows(&tx, source, target, now)?;
        tx.commit()?;
        Ok(copied)
    }

    /// Create a new scenario as a deep copy of `source`, all in one
    /// transaction: the scenario row, every projection (new ids), and every
    /// override (new ids pointing at the new projections).
    pub fn clone_scenario(&mut self, source: &ScenarioId, new_name: &str) -> Result<Scenario> {
        let source_row =
            self.get_scenario(source)?
                .ok_or_else(|| GridironError::ScenarioNotFound {
                    scenario_id: source.to_string(),
                })?;
        let now = Self::now();
        let scenario = Scenario {
            scenario_id: ScenarioId::new(self.mint_id()?),
            name: new_name.to_string(),
            description: source_row.description.clone(),
            is_baseline: false,
            base_scenario_id: Some(source.clone()),
            season: source_row.season,
            parameters: source_row.parameters.clone(),
            created_at: now,
            updated_at: now,
        };

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO scenarios (scenario_id, name, description, is_baseline,
                                    base_scenario_id, season, parameters, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                scenario.scenario_id.as_str(),
                scenario.name,
                scenario.description,
                scenario.is_baseline,
                scenario.base_scenario_id.as_ref().map(|s| s.as_str()),
                scenario.season,
                scenario.parameters.as_ref().map(|p| p.to_string()),
                scenario.created_at,
                scenario.updated_at,
            ],
        )?;
        copy_scenario_rows(&tx, source, &scenario.scenario_id, now)?;
        tx.commit()?;
        Ok(scenario)
    }

    /// Delete a scenario, cascading to its projections and their overrides.
    pub fn delete_scenario_cascade(&mut self, scenario_id: &ScenarioId) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM stat_overrides WHERE projection_id IN
                 (SELECT projection_id FROM projections WHERE scenario_id = ?)",
            params![scenario_id.as_str()],
        )?;
        tx.execute(
            "DELETE FROM projections WHERE scenario_id = ?",
            params![scenario_id.as_str()],
        )?;
        let deleted = tx.execute(
            "DELETE FROM scenarios WHERE scenario_id = ?",
            params![scenario_id.as_str()],
        )?;
        tx.commit()?;
        if deleted == 0 {
            return Err(GridironError::ScenarioNotFound {
                scenario_id: scenario_id.to_string(),
            });
        }
        Ok(())
    }

    // ---- overrides ----

    /// Fetch an override by id.
    pub fn get_override(&self, override_id: &OverrideId) -> Result<Option<StatOverride>> {
        let mut stmt = self.conn.prepare(
            "SELECT override_id, player_id, projection_id, stat_name, calculated_value,
                    manual_value, notes, created_at
             FROM stat_overrides WHERE override_id = ?",
        )?;
        let result = stmt.query_row(params![override_id.as_str()], row_to_override);
        match result {
            Ok(o) => Ok(Some(o)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The override for (projection, stat_name), if present.
    pub fn find_override(
        &self,
        projection_id: &ProjectionId,
        stat_name: &str,
    ) -> Result<Option<StatOverride>> {
        let mut stmt = self.conn.prepare(
            "SELECT override_id, player_id, projection_id, stat_name, calculated_value,
                    manual_value, notes, created_at
             FROM stat_overrides WHERE projection_id = ? AND stat_name = ?",
        )?;
        let result = stmt.query_row(params![projection_id.as_str(), stat_name], row_to_override);
        match result {
            Ok(o) => Ok(Some(o)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All overrides for a player, across projections.
    pub fn list_overrides_for_player(&self, player_id: &PlayerId) -> Result<Vec<StatOverride>> {
        let mut stmt = self.conn.prepare(
            "SELECT override_id, player_id, projection_id, stat_name, calculated_value,
                    manual_value, notes, created_at
             FROM stat_overrides WHERE player_id = ? ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![player_id.as_str()], row_to_override)?;
        let mut overrides = Vec::new();
        for row in rows {
            overrides.push(row?);
        }
        Ok(overrides)
    }

    /// All overrides on one projection.
    pub fn list_overrides_for_projection(
        &self,
        projection_id: &ProjectionId,
    ) -> Result<Vec<StatOverride>> {
        let mut stmt = self.conn.prepare(
            "SELECT override_id, player_id, projection_id, stat_name, calculated_value,
                    manual_value, notes, created_at
             FROM stat_overrides WHERE projection_id = ? ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![projection_id.as_str()], row_to_override)?;
        let mut overrides = Vec::new();
        for row in rows {
            overrides.push(row?);
        }
        Ok(overrides)
    }

    /// Count of overrides on a projection.
    pub fn count_overrides(&self, projection_id: &ProjectionId) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM stat_overrides WHERE projection_id = ?",
            params![projection_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Write an override row and the mutated projection atomically.
    /// Replaces any existing row for the same (projection, stat_name).
    pub fn apply_override(
        &mut self,
        projection: &mut Projection,
        override_row: &mut StatOverride,
    ) -> Result<()> {
        let now = Self::now();
        projection.updated_at = now;
        if override_row.override_id.as_str().is_empty() {
            override_row.override_id = OverrideId::new(self.mint_id()?);
        }
        override_row.created_at = now;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO stat_overrides (override_id, player_id, projection_id, stat_name,
                                         calculated_value, manual_value, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(projection_id, stat_name) DO UPDATE SET
                 manual_value = excluded.manual_value,
                 notes = excluded.notes,
                 created_at = excluded.created_at",
            params![
                override_row.override_id.as_str(),
                override_row.player_id.as_str(),
                override_row.projection_id.as_str(),
                override_row.stat_name,
                override_row.calculated_value,
                override_row.manual_value,
                override_row.notes,
                override_row.created_at,
            ],
        )?;
        update_projection_tx(&tx, projection)?;
        tx.commit()?;
        Ok(())
    }

    /// Remove an override row and persist the restored projection atomically.
    pub fn remove_override(
        &mut self,
        override_id: &OverrideId,
        projection: &mut Projection,
    ) -> Result<()> {
        projection.updated_at = Self::now();
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM stat_overrides WHERE override_id = ?",
            params![override_id.as_str()],
        )?;
        update_projection_tx(&tx, projection)?;
        tx.commit()?;
        Ok(())
    }
}
