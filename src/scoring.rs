//! Fantasy point scoring over a projection stat vector.
//!
//! Pure functions: the projection is read, never written. Callers cache the
//! half-PPR total on the projection and must recompute it after any stat
//! mutation.

use crate::storage::models::Projection;

/// Scoring format, differing only in the per-reception weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringFormat {
    Standard,
    HalfPpr,
    FullPpr,
}

impl ScoringFormat {
    fn reception_weight(&self) -> f64 {
        match self {
            ScoringFormat::Standard => 0.0,
            ScoringFormat::HalfPpr => 0.5,
            ScoringFormat::FullPpr => 1.0,
        }
    }
}

/// Per-unit weights shared by every format (receptions vary by format).
pub const PASS_YARD_WEIGHT: f64 = 0.04;
pub const PASS_TD_WEIGHT: f64 = 4.0;
pub const INTERCEPTION_WEIGHT: f64 = -2.0;
pub const RUSH_YARD_WEIGHT: f64 = 0.1;
pub const RUSH_TD_WEIGHT: f64 = 6.0;
pub const FUMBLE_WEIGHT: f64 = -2.0;
pub const REC_YARD_WEIGHT: f64 = 0.1;
pub const REC_TD_WEIGHT: f64 = 6.0;

fn stat(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

/// Compute fantasy points for a projection under the given format.
///
/// Net yardage is preferred over gross where present (sacks and fumbles
/// already removed); absent stats count as zero.
pub fn fantasy_points(projection: &Projection, format: ScoringFormat) -> f64 {
    let pass_yards = projection
        .net_pass_yards
        .or(projection.pass_yards)
        .unwrap_or(0.0);
    let rush_yards = projection
        .net_rush_yards
        .or(projection.rush_yards)
        .unwrap_or(0.0);

    let mut points = 0.0;
    points += pass_yards * PASS_YARD_WEIGHT;
    points += stat(projection.pass_td) * PASS_TD_WEIGHT;
    points += stat(projection.interceptions) * INTERCEPTION_WEIGHT;
    points += rush_yards * RUSH_YARD_WEIGHT;
    points += stat(projection.rush_td) * RUSH_TD_WEIGHT;
    points += stat(projection.fumbles) * FUMBLE_WEIGHT;
    points += stat(projection.receptions) * format.reception_weight();
    points += stat(projection.rec_yards) * REC_YARD_WEIGHT;
    points += stat(projection.rec_td) * REC_TD_WEIGHT;
    points
}

/// Half-PPR points, the engine's cached scoring column.
pub fn half_ppr(projection: &Projection) -> f64 {
    fantasy_points(projection, ScoringFormat::HalfPpr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlayerId, ProjectionId};

    fn qb_projection() -> Projection {
        let mut p = Projection::blank(
            ProjectionId::new("p1"),
            PlayerId::new("mahomes"),
            None,
            2024,
            17,
        );
        p.pass_attempts = Some(600.0);
        p.completions = Some(400.0);
        p.pass_yards = Some(4800.0);
        p.pass_td = Some(38.0);
        p.interceptions = Some(10.0);
        p.rush_attempts = Some(60.0);
        p.rush_yards = Some(350.0);
        p.rush_td = Some(3.0);
        p
    }

    #[test]
    fn test_qb_half_ppr() {
        let p = qb_projection();
        // 4800*0.04 + 38*4 - 10*2 + 350*0.1 + 3*6 = 192 + 152 - 20 + 35 + 18
        let expected = 377.0;
        assert!((half_ppr(&p) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_reception_weights() {
        let mut p = Projection::blank(
            ProjectionId::new("p2"),
            PlayerId::new("kelce"),
            None,
            2024,
            17,
        );
        p.targets = Some(140.0);
        p.receptions = Some(98.0);
        p.rec_yards = Some(1200.0);
        p.rec_td = Some(10.0);

        let standard = fantasy_points(&p, ScoringFormat::Standard);
        let half = fantasy_points(&p, ScoringFormat::HalfPpr);
        let full = fantasy_points(&p, ScoringFormat::FullPpr);

        assert!((standard - 180.0).abs() < 1e-9); // 120 + 60
        assert!((half - standard - 49.0).abs() < 1e-9);
        assert!((full - standard - 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_net_yards_preferred() {
        let mut p = qb_projection();
        p.sack_yards = Some(120.0);
        p.net_pass_yards = Some(4680.0);
        // Net replaces gross: 4680*0.04 instead of 4800*0.04.
        let expected = 377.0 - 120.0 * 0.04;
        assert!((half_ppr(&p) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_absent_stats_are_zero() {
        let p = Projection::blank(
            ProjectionId::new("p3"),
            PlayerId::new("nobody"),
            None,
            2024,
            17,
        );
        assert_eq!(half_ppr(&p), 0.0);
    }

    #[test]
    fn test_negative_component_stats() {
        let mut p = Projection::blank(
            ProjectionId::new("p4"),
            PlayerId::new("turnover-machine"),
            None,
            2024,
            17,
        );
        p.interceptions = Some(5.0);
        p.fumbles = Some(3.0);
        assert!((half_ppr(&p) - (-16.0)).abs() < 1e-9);
    }
}
