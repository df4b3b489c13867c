//! Efficiency-rate derivation and the counting/rate identity set.
//!
//! After any mutation of counting stats the projection's rates are
//! re-derived from volume so the identity set holds within [`EPSILON`].
//! Identities whose inputs are absent are skipped, and a rate whose
//! denominator is zero becomes absent rather than infinite.

use crate::error::{GridironError, Result};
use crate::storage::models::{Projection, TeamStat};

/// Tolerance for the counting <-> rate identities.
pub const EPSILON: f64 = 0.001;

/// Domain clamps. A derived rate landing outside its clamp is a
/// recomputation fault (`Internal`), never a data fix.
const PCT_MAX: f64 = 1.0;
const YPA_MAX: f64 = 15.0;
const YPC_MAX: f64 = 10.0;
const TD_RATE_MAX: f64 = 0.2;

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d),
        (Some(_), Some(_)) => None,
        _ => None,
    }
}

fn check_clamp(stat_name: &str, value: Option<f64>, max: f64) -> Result<()> {
    if let Some(v) = value {
        if !(0.0..=max).contains(&v) {
            return Err(GridironError::Internal {
                message: format!("derived {} = {:.4} outside [0, {}]", stat_name, v, max),
            });
        }
    }
    Ok(())
}

/// Re-derive every rate stat from the projection's counting stats.
///
/// Counting stats are authoritative; rates are overwritten wherever their
/// inputs are present. Overridden rates survive because the override engine
/// writes the matching counting stat first, making re-derivation reproduce
/// the manual value.
pub fn derive_rates(projection: &mut Projection) -> Result<()> {
    // Passing
    projection.comp_pct = ratio(projection.completions, projection.pass_attempts);
    projection.yards_per_att = ratio(projection.pass_yards, projection.pass_attempts);
    projection.pass_td_rate = ratio(projection.pass_td, projection.pass_attempts);
    projection.int_rate = ratio(projection.interceptions, projection.pass_attempts);

    if let (Some(sacks), Some(attempts)) = (projection.sacks, projection.pass_attempts) {
        let dropbacks = attempts + sacks;
        projection.sack_rate = if dropbacks > 0.0 {
            Some(sacks / dropbacks)
        } else {
            None
        };
        if let (Some(pass_yards), Some(sack_yards)) = (projection.pass_yards, projection.sack_yards)
        {
            let net = pass_yards - sack_yards;
            projection.net_pass_yards = Some(net);
            projection.net_yards_per_att = if dropbacks > 0.0 {
                Some(net / dropbacks)
            } else {
                None
            };
        }
    }

    // Rushing
    projection.yards_per_carry = ratio(projection.rush_yards, projection.rush_attempts);
    projection.rush_td_rate = ratio(projection.rush_td, projection.rush_attempts);

    if let Some(fumbles) = projection.fumbles {
        let touches =
            projection.rush_attempts.unwrap_or(0.0) + projection.receptions.unwrap_or(0.0);
        projection.fumble_rate = if touches > 0.0 {
            Some(fumbles / touches)
        } else {
            None
        };
    }

    // Receiving
    projection.catch_pct = ratio(projection.receptions, projection.targets);
    projection.yards_per_target = ratio(projection.rec_yards, projection.targets);
    projection.rec_td_rate = ratio(projection.rec_td, projection.targets);

    check_clamp("comp_pct", projection.comp_pct, PCT_MAX)?;
    check_clamp("catch_pct", projection.catch_pct, PCT_MAX)?;
    check_clamp("sack_rate", projection.sack_rate, PCT_MAX)?;
    check_clamp("fumble_rate", projection.fumble_rate, PCT_MAX)?;
    check_clamp("yards_per_att", projection.yards_per_att, YPA_MAX)?;
    check_clamp("net_yards_per_att", projection.net_yards_per_att, YPA_MAX)?;
    check_clamp("yards_per_target", projection.yards_per_target, YPA_MAX)?;
    check_clamp("yards_per_carry", projection.yards_per_carry, YPC_MAX)?;
    check_clamp("pass_td_rate", projection.pass_td_rate, TD_RATE_MAX)?;
    check_clamp("rush_td_rate", projection.rush_td_rate, TD_RATE_MAX)?;
    check_clamp("rec_td_rate", projection.rec_td_rate, TD_RATE_MAX)?;
    check_clamp("int_rate", projection.int_rate, TD_RATE_MAX)?;

    Ok(())
}

fn share(numerator: Option<f64>, team_total: f64) -> Option<f64> {
    match numerator {
        Some(n) if team_total > 0.0 => Some((n / team_total).clamp(0.0, 1.0)),
        _ => None,
    }
}

/// Compute the projection's shares of team volume from the team context.
pub fn compute_shares(projection: &mut Projection, team: &TeamStat) {
    projection.tar_pct = share(projection.targets, team.targets);
    projection.car_pct = share(projection.rush_attempts, team.rush_attempts);
    projection.pass_att_pct = share(projection.pass_attempts, team.pass_attempts);

    // Usage knobs follow the computed shares unless a caller has set them.
    if projection.target_share.is_none() {
        projection.target_share = projection.tar_pct;
    }
    if projection.rush_share.is_none() {
        projection.rush_share = projection.car_pct;
    }
}

/// Report every identity in the derivation set that fails to hold within
/// [`EPSILON`]. Used by tests and the internal-consistency audit.
pub fn check_identities(projection: &Projection) -> Vec<String> {
    let mut failures = Vec::new();
    let mut check = |name: &str, rate: Option<f64>, expected: Option<f64>| {
        if let (Some(actual), Some(expected)) = (rate, expected) {
            if (actual - expected).abs() > EPSILON {
                failures.push(format!(
                    "{}: stored {:.4}, derived {:.4}",
                    name, actual, expected
                ));
            }
        }
    };

    check(
        "comp_pct",
        projection.comp_pct,
        ratio(projection.completions, projection.pass_attempts),
    );
    check(
        "yards_per_att",
        projection.yards_per_att,
        ratio(projection.pass_yards, projection.pass_attempts),
    );
    check(
        "pass_td_rate",
        projection.pass_td_rate,
        ratio(projection.pass_td, projection.pass_attempts),
    );
    check(
        "int_rate",
        projection.int_rate,
        ratio(projection.interceptions, projection.pass_attempts),
    );
    check(
        "yards_per_carry",
        projection.yards_per_carry,
        ratio(projection.rush_yards, projection.rush_attempts),
    );
    check(
        "rush_td_rate",
        projection.rush_td_rate,
        ratio(projection.rush_td, projection.rush_attempts),
    );
    check(
        "catch_pct",
        projection.catch_pct,
        ratio(projection.receptions, projection.targets),
    );
    check(
        "yards_per_target",
        projection.yards_per_target,
        ratio(projection.rec_yards, projection.targets),
    );
    check(
        "rec_td_rate",
        projection.rec_td_rate,
        ratio(projection.rec_td, projection.targets),
    );

    failures
}
