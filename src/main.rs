//! Entry point: parse CLI and dispatch to engine operations.

use anyhow::Result;
use clap::Parser;
use gridiron::{
    cli::{Commands, ExportFilters, Gridiron, ScenarioCommands},
    engine::{ProjectionEngine, TeamAdjustmentFactors},
    storage::{ProjectionDatabase, ProjectionFilter},
    types::{OverrideId, PlayerId, ProjectionId, ScenarioId},
};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn scenario_id(raw: &Option<String>) -> Option<ScenarioId> {
    raw.as_ref().map(|s| ScenarioId::new(s.clone()))
}

fn export_filter(filters: &ExportFilters) -> ProjectionFilter {
    let scenario = if filters.baseline_only {
        Some(None)
    } else {
        filters
            .scenario
            .as_ref()
            .map(|s| Some(ScenarioId::new(s.clone())))
    };
    ProjectionFilter {
        scenario_id: scenario,
        season: filters.season,
        position: filters.position,
        team: filters.team.clone(),
        half_ppr_min: filters.half_ppr_min,
        half_ppr_max: filters.half_ppr_max,
        include_fill_players: filters.include_fill_players,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let app = Gridiron::parse();
    let db = match &app.data_dir {
        Some(dir) => ProjectionDatabase::open(&dir.join("projections.db"))?,
        None => ProjectionDatabase::open_default()?,
    };
    let mut engine = ProjectionEngine::new(db);

    match app.command {
        Commands::Baseline {
            player_id,
            season,
            scenario,
        } => {
            let projection = engine
                .create_base_projection(
                    &PlayerId::new(player_id),
                    season,
                    scenario_id(&scenario).as_ref(),
                )
                .await?;
            print_json(&projection)?;
        }

        Commands::Rookie {
            player_id,
            season,
            scenario,
        } => {
            let projection = engine
                .build_rookie_projection(
                    &PlayerId::new(player_id),
                    season,
                    scenario_id(&scenario).as_ref(),
                )
                .await?;
            print_json(&projection)?;
        }

        Commands::Templates { position } => {
            print_json(&gridiron::engine::templates_for_position(position))?;
        }

        Commands::Adjust {
            projection_id,
            factors,
        } => {
            let adjustments: HashMap<String, f64> = factors.into_iter().collect();
            let projection = engine
                .update_projection(&ProjectionId::new(projection_id), &adjustments)
                .await?;
            print_json(&projection)?;
        }

        Commands::TeamAdjust {
            team,
            season,
            scenario,
            pass_volume,
            rush_volume,
            pass_efficiency,
            rush_efficiency,
            scoring_rate,
        } => {
            let factors = TeamAdjustmentFactors {
                pass_volume,
                rush_volume,
                pass_efficiency,
                rush_efficiency,
                scoring_rate,
            };
            let updated = engine
                .apply_team_adjustments(&team, season, scenario_id(&scenario).as_ref(), &factors)
                .await?;
            print_json(&updated)?;
        }

        Commands::Override {
            projection_id,
            stat,
            value,
            notes,
        } => {
            let override_row = engine
                .create_override(&ProjectionId::new(projection_id), &stat, value, notes)
                .await?;
            print_json(&override_row)?;
        }

        Commands::DeleteOverride { override_id } => {
            let projection = engine
                .delete_override(&OverrideId::new(override_id))
                .await?;
            print_json(&projection)?;
        }

        Commands::Overrides {
            player_id,
            projection_id,
        } => {
            if let Some(player_id) = player_id {
                print_json(&engine.db.list_overrides_for_player(&PlayerId::new(player_id))?)?;
            } else if let Some(projection_id) = projection_id {
                print_json(
                    &engine
                        .db
                        .list_overrides_for_projection(&ProjectionId::new(projection_id))?,
                )?;
            } else {
                anyhow::bail!("pass --player-id or --projection-id");
            }
        }

        Commands::Scenario { command } => match command {
            ScenarioCommands::Create {
                name,
                description,
                base_scenario_id,
                season,
            } => {
                let scenario = engine
                    .create_scenario(
                        &name,
                        description.as_deref(),
                        scenario_id(&base_scenario_id).as_ref(),
                        season,
                        None,
                    )
                    .await?;
                print_json(&scenario)?;
            }
            ScenarioCommands::List => print_json(&engine.list_scenarios().await?)?,
            ScenarioCommands::Clone { source_id, name } => {
                let scenario = engine
                    .clone_scenario(&ScenarioId::new(source_id), &name)
                    .await?;
                print_json(&scenario)?;
            }
            ScenarioCommands::Delete { scenario_id } => {
                engine.delete_scenario(&ScenarioId::new(scenario_id)).await?;
            }
            ScenarioCommands::Compare { ids, position } => {
                let ids: Vec<ScenarioId> = ids.into_iter().map(ScenarioId::new).collect();
                let comparison = engine.compare_scenarios(&ids, position).await?;
                print_json(&comparison)?;
            }
        },

        Commands::Variance { projection_id } => {
            let variance = engine
                .calculate_variance(&ProjectionId::new(projection_id), true, true)
                .await?;
            print_json(&variance)?;
        }

        Commands::Range {
            projection_id,
            confidence,
            materialize,
        } => {
            let range = engine
                .generate_projection_range(
                    &ProjectionId::new(projection_id),
                    confidence,
                    materialize,
                )
                .await?;
            print_json(&range)?;
        }

        Commands::Reconcile {
            team,
            season,
            scenario,
        } => {
            let fills = engine
                .reconcile_team(&team, season, scenario_id(&scenario).as_ref())
                .await?;
            print_json(&fills)?;
        }

        Commands::Export { filters, csv } => {
            let records = engine.export_projections(&export_filter(&filters)).await?;
            if csv {
                gridiron::export::write_csv(&records, std::io::stdout())?;
            } else {
                print_json(&records)?;
            }
        }
    }

    Ok(())
}
