use std::collections::HashSet;

use proptest::prelude::*;

use surge_cascade::animation::ScriptedAnimator;
use surge_cascade::platform::ManualClock;
use surge_cascade::settings::TileWeights;
use surge_cascade::sim::{StopReason, TileFactory};
use surge_cascade::{
    CascadeConfig, CascadeEngine, CascadeEvent, Coord, Grid, InstantAnimator, NoScoring,
};

/// Bound on queue steps; a cascade that needs more than this is stuck
const STEP_LIMIT: usize = 20_000;

fn arb_config() -> impl Strategy<Value = CascadeConfig> {
    (0.0f32..=1.0, 1u32..=4, 1u32..=5, 1usize..=2, 1usize..=16, any::<bool>()).prop_map(
        |(spread, power, threshold, ripple_radius, batch_limit, specials)| CascadeConfig {
            spread,
            power,
            threshold,
            ripple_radius,
            batch_limit,
            min_word_length: 1,
            tile_weights: if specials {
                TileWeights::default()
            } else {
                TileWeights::none()
            },
            ..CascadeConfig::default()
        },
    )
}

fn engine(
    config: CascadeConfig,
    width: usize,
    height: usize,
    seed: u64,
) -> CascadeEngine<ScriptedAnimator, NoScoring> {
    let mut factory = TileFactory::from_config(&config, seed);
    let grid = Grid::populated(width, height, &mut factory).unwrap();
    CascadeEngine::new(config, grid, factory, ScriptedAnimator::new(), NoScoring, seed)
        .unwrap()
        .with_clock(ManualClock::new())
}

/// First selectable tile in row-major order
fn first_selectable(grid: &Grid) -> Option<Coord> {
    grid.iter().find(|t| t.can_be_selected()).map(|t| t.pos)
}

fn run_bounded(engine: &mut CascadeEngine<ScriptedAnimator, NoScoring>) -> usize {
    let mut steps = 0;
    while pollster::block_on(engine.process_next()) {
        steps += 1;
        if steps > STEP_LIMIT {
            break;
        }
    }
    steps
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cascade_terminates_with_stable_grid(
        config in arb_config(),
        width in 1usize..=12,
        height in 1usize..=12,
        seed in any::<u64>(),
    ) {
        let max_depth = config.effective_max_depth();
        let mut engine = engine(config, width, height, seed);
        let Some(start) = first_selectable(engine.grid()) else {
            return Ok(());
        };

        engine.start_word(&[start]).unwrap();
        let steps = run_bounded(&mut engine);
        prop_assert!(steps <= STEP_LIMIT);
        prop_assert!(engine.accepts_input());

        let grid = engine.grid();
        prop_assert!(grid.is_full());
        prop_assert!(grid.positions_consistent());
        prop_assert!(grid.iter().all(|t| !t.is_exploding() && !t.falling));

        let ids: HashSet<u64> = grid.iter().map(|t| t.id).collect();
        prop_assert_eq!(ids.len(), width * height);

        let summary = engine.last_summary().unwrap();
        prop_assert!(summary.depth <= max_depth);
        prop_assert!(summary.tiles_destroyed >= 1);
        prop_assert_eq!(summary.effects_failed, 0);
        prop_assert_ne!(summary.stop_reason, StopReason::Aborted);
    }

    #[test]
    fn prop_each_coordinate_surged_once(
        config in arb_config(),
        size in 2usize..=10,
        seed in any::<u64>(),
    ) {
        let mut engine = engine(config, size, size, seed);
        let Some(start) = first_selectable(engine.grid()) else {
            return Ok(());
        };
        engine.start_word(&[start]).unwrap();
        run_bounded(&mut engine);

        let cues = &engine.animator().cues;
        let unique: HashSet<Coord> = cues.iter().map(|c| c.pos).collect();
        prop_assert_eq!(unique.len(), cues.len());
    }

    #[test]
    fn prop_same_seed_same_outcome(
        config in arb_config(),
        size in 2usize..=8,
        seed in any::<u64>(),
    ) {
        let mut a = engine(config.clone(), size, size, seed);
        let mut b = engine(config, size, size, seed);
        let Some(start) = first_selectable(a.grid()) else {
            return Ok(());
        };

        let sa = pollster::block_on(a.submit_word(&[start])).unwrap();
        let sb = pollster::block_on(b.submit_word(&[start])).unwrap();

        prop_assert_eq!(sa, sb);
        prop_assert!(a.grid().iter().eq(b.grid().iter()));
        prop_assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn prop_gravity_keeps_column_order(
        width in 1usize..=8,
        height in 1usize..=8,
        holes in proptest::collection::vec(any::<bool>(), 64),
        seed in any::<u64>(),
    ) {
        let mut factory = TileFactory::from_config(&CascadeConfig::default(), seed);
        let mut grid = Grid::populated(width, height, &mut factory).unwrap();
        for y in 0..height {
            for x in 0..width {
                if holes[y * width + x] {
                    grid.remove_at(Coord::new(x, y));
                }
            }
        }
        let column_ids = |g: &Grid, x: usize| -> Vec<u64> {
            (0..height).filter_map(|y| g.tile_at(Coord::new(x, y)).map(|t| t.id)).collect()
        };
        let before: Vec<Vec<u64>> = (0..width).map(|x| column_ids(&grid, x)).collect();

        let moves = grid.apply_gravity();

        prop_assert!(grid.positions_consistent());
        prop_assert!(moves.iter().all(|m| m.to_y > m.from_y));
        for x in 0..width {
            prop_assert_eq!(&column_ids(&grid, x), &before[x]);
            let filled = before[x].len();
            for y in 0..height {
                let occupied = grid.tile_at(Coord::new(x, y)).is_some();
                prop_assert_eq!(occupied, y >= height - filled);
            }
        }
    }
}

#[test]
fn six_by_six_storm_clears_the_board() {
    let config = CascadeConfig {
        spread: 1.0,
        power: 4,
        threshold: 3,
        batch_limit: 64,
        max_depth: Some(50),
        tile_weights: TileWeights::none(),
        ..CascadeConfig::default()
    };
    let mut factory = TileFactory::from_config(&config, 7);
    let grid = Grid::populated(6, 6, &mut factory).unwrap();
    let mut engine =
        CascadeEngine::new(config, grid, factory, InstantAnimator::new(), NoScoring, 7).unwrap();

    let word = [Coord::new(0, 5), Coord::new(1, 5), Coord::new(2, 5)];
    let summary = pollster::block_on(engine.submit_word(&word)).unwrap();

    assert_eq!(summary.tiles_destroyed, 36);
    assert_eq!(summary.stop_reason, StopReason::Settled);
    assert!(engine.grid().is_full());
    assert!(engine.grid().iter().all(|t| t.id > 36));

    let events = engine.drain_events();
    let idle = events.iter().rposition(|e| *e == CascadeEvent::QueueIdle);
    let done = events
        .iter()
        .position(|e| matches!(e, CascadeEvent::CascadeComplete { .. }));
    assert!(idle.is_some() && idle < done);
}
