//! Ripple propagation
//!
//! One pass spreads surges from a seed set: seeds are hit directly, then each
//! unvisited tile within the ripple radius is hit with probability
//! `spread * 0.8^(distance - 1)`. Every coordinate is hit at most once per
//! session, which bounds a cascade regardless of grid layout.

use rand::Rng;

use super::grid::Grid;
use super::session::CascadeSession;
use super::tile::{SurgeOutcome, Tile};
use crate::animation::PropagationCue;
use crate::consts::SPREAD_FALLOFF;
use crate::settings::CascadeConfig;
use crate::{Coord, chebyshev};

/// Propagation parameters read at session start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleParams {
    pub spread: f32,
    pub power: u32,
    pub threshold: u32,
    pub radius: usize,
    pub stagger_ms: f64,
}

impl RippleParams {
    pub fn from_config(config: &CascadeConfig) -> Self {
        Self {
            spread: config.spread,
            power: config.power.max(1),
            threshold: config.threshold.max(1),
            radius: config.ripple_radius.max(1),
            stagger_ms: config.stagger_ms,
        }
    }

    /// Chance that a tile `distance` rings out is reached
    pub fn spread_chance(&self, distance: usize) -> f32 {
        let rings = distance.saturating_sub(1) as i32;
        self.spread * SPREAD_FALLOFF.powi(rings)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RippleOutcome {
    pub depth: u32,
    /// Tiles pushed into Exploding this pass, in discovery order
    pub to_explode: Vec<Coord>,
    pub hits: usize,
    pub converted: u32,
    pub cues: Vec<PropagationCue>,
}

/// One surge hit: `power` surges, stopping once the tile resolves
fn hit(tile: &mut Tile, params: &RippleParams) -> SurgeOutcome {
    let mut outcome = SurgeOutcome::Ignored;
    for _ in 0..params.power {
        outcome = tile.apply_surge(params.threshold);
        if matches!(
            outcome,
            SurgeOutcome::Detonated | SurgeOutcome::Converted | SurgeOutcome::Ignored
        ) {
            break;
        }
    }
    outcome
}

/// Run one propagation pass. The caller checks the governor first.
pub fn propagate<R: Rng>(
    grid: &mut Grid,
    session: &mut CascadeSession,
    seeds: &[Coord],
    params: &RippleParams,
    rng: &mut R,
) -> RippleOutcome {
    let mut out = RippleOutcome {
        depth: session.next_depth(),
        ..Default::default()
    };
    let intensity = session.visual_intensity();

    let strike = |grid: &mut Grid, out: &mut RippleOutcome, pos: Coord, delay_ms: f64| {
        let Some(tile) = grid.tile_at_mut(pos) else {
            return;
        };
        let outcome = hit(tile, params);
        if outcome == SurgeOutcome::Ignored {
            return;
        }
        out.hits += 1;
        let detonated = outcome == SurgeOutcome::Detonated;
        if detonated {
            out.to_explode.push(pos);
        } else if outcome == SurgeOutcome::Converted {
            out.converted += 1;
        }
        out.cues.push(PropagationCue {
            pos,
            delay_ms,
            intensity,
            detonated,
        });
    };

    for &seed in seeds {
        if session.visit(seed) {
            strike(grid, &mut out, seed, 0.0);
        }
    }

    for &seed in seeds {
        for pos in grid.neighbor_coords(seed, params.radius) {
            if session.is_visited(pos) {
                continue;
            }
            let distance = chebyshev(seed, pos);
            let roll: f32 = rng.random();
            if roll < params.spread_chance(distance) {
                session.visit(pos);
                let delay = distance as f64 * params.stagger_ms * intensity as f64;
                strike(grid, &mut out, pos, delay);
            }
        }
    }

    log::debug!(
        "Ripple depth {}: {} seeds, {} hits, {} detonations (intensity {:.2})",
        out.depth,
        seeds.len(),
        out.hits,
        out.to_explode.len(),
        intensity
    );
    out
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::settings::{ENGLISH_LETTERS, TileWeights};
    use crate::sim::grid::TileFactory;
    use crate::sim::tile::{TileKind, TileState};

    fn setup(w: usize, h: usize) -> (Grid, CascadeSession) {
        let mut f = TileFactory::new(11, TileWeights::none(), ENGLISH_LETTERS.to_vec());
        let grid = Grid::populated(w, h, &mut f).unwrap();
        let mut session = CascadeSession::new();
        session.begin(0.0, &CascadeConfig::default(), 3);
        (grid, session)
    }

    fn params(spread: f32, power: u32) -> RippleParams {
        RippleParams {
            spread,
            power,
            threshold: 3,
            radius: 1,
            stagger_ms: 10.0,
        }
    }

    #[test]
    fn test_spread_chance_decays_per_ring() {
        let p = RippleParams {
            radius: 3,
            ..params(1.0, 1)
        };
        assert_eq!(p.spread_chance(1), 1.0);
        assert!((p.spread_chance(2) - 0.8).abs() < 1e-6);
        assert!((p.spread_chance(3) - 0.64).abs() < 1e-6);
    }

    #[test]
    fn test_full_spread_hits_every_neighbour_once() {
        let (mut grid, mut session) = setup(5, 5);
        let mut rng = Pcg32::seed_from_u64(1);
        let centre = Coord::new(2, 2);
        grid.remove_at(centre);

        let out = propagate(&mut grid, &mut session, &[centre], &params(1.0, 1), &mut rng);

        assert_eq!(out.depth, 1);
        assert_eq!(out.hits, 8);
        assert!(out.to_explode.is_empty());
        assert_eq!(session.visited_count(), 9);
        for pos in grid.neighbor_coords(centre, 1) {
            assert_eq!(grid.tile_at(pos).unwrap().surge_count, 1);
        }
    }

    #[test]
    fn test_zero_spread_only_touches_seeds() {
        let (mut grid, mut session) = setup(5, 5);
        let mut rng = Pcg32::seed_from_u64(1);
        let out = propagate(
            &mut grid,
            &mut session,
            &[Coord::new(2, 2)],
            &params(0.0, 1),
            &mut rng,
        );
        assert_eq!(out.hits, 1);
        assert_eq!(grid.tile_at(Coord::new(2, 2)).unwrap().surge_count, 1);
        assert_eq!(grid.tile_at(Coord::new(1, 1)).unwrap().surge_count, 0);
    }

    #[test]
    fn test_visited_tiles_not_hit_again() {
        let (mut grid, mut session) = setup(5, 5);
        let mut rng = Pcg32::seed_from_u64(1);
        let seeds = [Coord::new(1, 1), Coord::new(2, 1)];
        propagate(&mut grid, &mut session, &seeds, &params(1.0, 1), &mut rng);
        let second = propagate(&mut grid, &mut session, &seeds, &params(1.0, 1), &mut rng);

        assert_eq!(second.depth, 2);
        assert_eq!(second.hits, 0);
        assert!(grid.iter().all(|t| t.surge_count <= 1));
    }

    #[test]
    fn test_power_detonates_in_one_hit() {
        let (mut grid, mut session) = setup(3, 3);
        let mut rng = Pcg32::seed_from_u64(1);
        let centre = Coord::new(1, 1);
        grid.remove_at(centre);

        let out = propagate(&mut grid, &mut session, &[centre], &params(1.0, 4), &mut rng);

        assert_eq!(out.to_explode.len(), 8);
        assert!(grid.iter().all(|t| t.state == TileState::Exploding && t.surge_count == 4));
        assert!(out.cues.iter().all(|c| c.detonated));
    }

    #[test]
    fn test_blockers_take_damage_and_convert() {
        let (mut grid, mut session) = setup(3, 1);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut f = TileFactory::new(5, TileWeights::none(), ENGLISH_LETTERS.to_vec());
        grid.place(f.spawn_with(Coord::new(0, 0), 'I', 1, TileKind::Ice))
            .unwrap();
        grid.remove_at(Coord::new(1, 0));

        let out = propagate(
            &mut grid,
            &mut session,
            &[Coord::new(1, 0)],
            &params(1.0, 2),
            &mut rng,
        );

        let ice = grid.tile_at(Coord::new(0, 0)).unwrap();
        assert_eq!(ice.kind, TileKind::Normal);
        assert_eq!(ice.surge_count, 0);
        assert_eq!(out.converted, 1);
    }

    #[test]
    fn test_exploding_tiles_are_skipped() {
        let (mut grid, mut session) = setup(3, 3);
        let mut rng = Pcg32::seed_from_u64(1);
        if let Some(t) = grid.tile_at_mut(Coord::new(0, 0)) {
            t.state = TileState::Exploding;
        }
        let out = propagate(
            &mut grid,
            &mut session,
            &[Coord::new(1, 1)],
            &params(1.0, 1),
            &mut rng,
        );
        assert_eq!(out.hits, 8);
        assert_eq!(grid.tile_at(Coord::new(0, 0)).unwrap().surge_count, 0);
    }

    #[test]
    fn test_cue_delay_scales_with_distance() {
        let (mut grid, mut session) = setup(5, 5);
        let mut rng = Pcg32::seed_from_u64(9);
        let p = RippleParams {
            radius: 2,
            ..params(1.0, 1)
        };
        grid.remove_at(Coord::new(0, 0));
        // 0.8 chance on the outer ring, so only check cues that fired
        let out = propagate(&mut grid, &mut session, &[Coord::new(0, 0)], &p, &mut rng);
        for cue in &out.cues {
            let d = chebyshev(Coord::new(0, 0), cue.pos) as f64;
            assert_eq!(cue.delay_ms, d * 10.0);
        }
        assert!(out.cues.iter().any(|c| chebyshev(Coord::new(0, 0), c.pos) == 1));
    }
}
