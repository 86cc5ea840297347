//! Surge Cascade demo driver
//!
//! Plays a handful of random words on a headless engine and prints each
//! cascade summary as JSON.
//!
//! Usage: `surge-cascade [config.json] [--seed N] [--words N] [--size WxH]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use rand::seq::IndexedRandom;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use surge_cascade::platform::init_logging;
    use surge_cascade::{CascadeConfig, CascadeEngine, ChainTally, Coord, Grid, is_adjacent};

    struct Args {
        config: Option<PathBuf>,
        seed: u64,
        words: usize,
        width: usize,
        height: usize,
    }

    fn parse_args() -> Result<Args, String> {
        let mut args = Args {
            config: None,
            seed: 0x5EED,
            words: 5,
            width: 8,
            height: 8,
        };
        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--seed" => {
                    let v = it.next().ok_or("--seed needs a value")?;
                    args.seed = v.parse().map_err(|e| format!("bad seed {v}: {e}"))?;
                }
                "--words" => {
                    let v = it.next().ok_or("--words needs a value")?;
                    args.words = v.parse().map_err(|e| format!("bad word count {v}: {e}"))?;
                }
                "--size" => {
                    let v = it.next().ok_or("--size needs a value")?;
                    let (w, h) = v.split_once('x').ok_or(format!("bad size {v}"))?;
                    args.width = w.parse().map_err(|e| format!("bad width {w}: {e}"))?;
                    args.height = h.parse().map_err(|e| format!("bad height {h}: {e}"))?;
                }
                path => args.config = Some(PathBuf::from(path)),
            }
        }
        Ok(args)
    }

    /// Random walk over selectable tiles, `len` long. None if the walk gets
    /// boxed in before reaching that length.
    fn random_word(grid: &Grid, len: usize, rng: &mut impl Rng) -> Option<Vec<Coord>> {
        let starts: Vec<Coord> = grid
            .iter()
            .filter(|t| t.can_be_selected())
            .map(|t| t.pos)
            .collect();
        let mut word = vec![*starts.choose(rng)?];

        while word.len() < len {
            let last = *word.last()?;
            let options: Vec<Coord> = grid
                .neighbors(last, 1)
                .into_iter()
                .filter(|t| t.can_be_selected() && !word.contains(&t.pos))
                .map(|t| t.pos)
                .collect();
            let next = *options.choose(rng)?;
            debug_assert!(is_adjacent(last, next));
            word.push(next);
        }
        Some(word)
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        init_logging();
        let args = parse_args()?;

        let config = match &args.config {
            Some(path) => CascadeConfig::load(path)?,
            None => CascadeConfig::default(),
        };
        let word_len = config.min_word_length;

        let mut factory = surge_cascade::sim::TileFactory::from_config(&config, args.seed);
        let grid = Grid::populated(args.width, args.height, &mut factory)?;
        let mut engine = CascadeEngine::new(
            config,
            grid,
            factory,
            surge_cascade::InstantAnimator::new(),
            ChainTally::new(),
            args.seed,
        )?;
        log::info!(
            "Surge Cascade demo: {}x{} grid, seed {}, {} words",
            args.width,
            args.height,
            args.seed,
            args.words
        );

        let mut rng = Pcg32::seed_from_u64(args.seed.rotate_left(17));
        for round in 1..=args.words {
            let Some(word) = random_word(engine.grid(), word_len, &mut rng) else {
                log::warn!("No playable word found on round {}", round);
                break;
            };
            let letters: String = word
                .iter()
                .filter_map(|&p| engine.grid().tile_at(p).map(|t| t.letter))
                .collect();

            let summary = pollster::block_on(engine.submit_word(&word))?;
            println!("{} {}", letters, serde_json::to_string(&summary)?);
        }

        let tally = engine.scoring();
        log::info!(
            "Final score {} over {} words, longest chain {}",
            tally.score,
            tally.words,
            tally.best_chain
        );
        log::info!(
            "Virtual animation time {:.0}ms",
            engine.animator().virtual_ms
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = native::run() {
        log::error!("{}", e);
        eprintln!("surge-cascade: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web hosts link the library and drive `CascadeEngine` themselves
}
