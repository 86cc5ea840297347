//! Tile grid: slot storage, neighbour queries, gravity and refill
//!
//! Slots are stored row-major. A tile's `pos` always matches the slot that
//! holds it; every mutation here keeps that true.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::tile::{Tile, TileKind, TileState};
use crate::Coord;
use crate::error::GridError;
use crate::settings::{CascadeConfig, LetterWeight, TileWeights};

/// One tile moved by gravity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub tile_id: u64,
    pub x: usize,
    pub from_y: usize,
    pub to_y: usize,
}

/// Seeded source of new tiles
#[derive(Debug, Clone)]
pub struct TileFactory {
    rng: Pcg32,
    weights: TileWeights,
    letters: Vec<LetterWeight>,
    letter_total: u32,
    next_id: u64,
}

impl TileFactory {
    pub fn new(seed: u64, weights: TileWeights, letters: Vec<LetterWeight>) -> Self {
        let letter_total = letters.iter().map(|l| l.weight).sum();
        Self {
            rng: Pcg32::seed_from_u64(seed),
            weights,
            letters,
            letter_total,
            next_id: 1,
        }
    }

    pub fn from_config(config: &CascadeConfig, seed: u64) -> Self {
        Self::new(seed, config.tile_weights, config.letters.clone())
    }

    /// Swap in a new weight and letter table. The RNG stream and id counter
    /// carry on, so ids stay unique across config changes.
    pub fn reconfigure(&mut self, weights: TileWeights, letters: Vec<LetterWeight>) {
        self.letter_total = letters.iter().map(|l| l.weight).sum();
        self.weights = weights;
        self.letters = letters;
    }

    fn next_tile_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Random letter and special-type roll
    pub fn spawn(&mut self, pos: Coord) -> Tile {
        let (letter, value) = self.roll_letter();
        let kind = self.roll_kind();
        self.spawn_with(pos, letter, value, kind)
    }

    /// Explicit letter, value and kind
    pub fn spawn_with(&mut self, pos: Coord, letter: char, value: u32, kind: TileKind) -> Tile {
        let id = self.next_tile_id();
        Tile::new(id, pos, letter, value, kind)
    }

    /// Cumulative-probability draw over the special weights, Normal otherwise
    fn roll_kind(&mut self) -> TileKind {
        let roll: f32 = self.rng.random();
        let kinds = [
            (TileKind::Bomb, self.weights.bomb),
            (TileKind::Ice, self.weights.ice),
            (TileKind::Stone, self.weights.stone),
            (TileKind::Multiplier, self.weights.multiplier),
            (TileKind::Hidden, self.weights.hidden),
        ];
        let mut cumulative = 0.0;
        for (kind, weight) in kinds {
            cumulative += weight;
            if roll < cumulative {
                return kind;
            }
        }
        TileKind::Normal
    }

    fn roll_letter(&mut self) -> (char, u32) {
        if self.letter_total == 0 {
            return ('A', 1);
        }
        let mut roll = self.rng.random_range(0..self.letter_total);
        for entry in &self.letters {
            if roll < entry.weight {
                return (entry.letter, entry.value);
            }
            roll -= entry.weight;
        }
        ('A', 1)
    }
}

/// Fixed-size slot array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    slots: Vec<Option<Tile>>,
}

impl Grid {
    /// Empty grid
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize { width, height });
        }
        Ok(Self {
            width,
            height,
            slots: vec![None; width * height],
        })
    }

    /// Grid with every slot filled from `factory`
    pub fn populated(
        width: usize,
        height: usize,
        factory: &mut TileFactory,
    ) -> Result<Self, GridError> {
        let mut grid = Self::new(width, height)?;
        grid.refill(factory);
        Ok(grid)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, pos: Coord) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    #[inline]
    fn index(&self, pos: Coord) -> Option<usize> {
        self.in_bounds(pos).then(|| pos.y * self.width + pos.x)
    }

    pub fn tile_at(&self, pos: Coord) -> Option<&Tile> {
        self.index(pos).and_then(|i| self.slots[i].as_ref())
    }

    pub fn tile_at_mut(&mut self, pos: Coord) -> Option<&mut Tile> {
        self.index(pos).and_then(|i| self.slots[i].as_mut())
    }

    /// Occupied coordinates within Chebyshev `radius` of `pos`, excluding `pos`.
    /// Row-major order.
    pub fn neighbor_coords(&self, pos: Coord, radius: usize) -> Vec<Coord> {
        let x0 = pos.x.saturating_sub(radius);
        let y0 = pos.y.saturating_sub(radius);
        let x1 = pos.x.saturating_add(radius).min(self.width.saturating_sub(1));
        let y1 = pos.y.saturating_add(radius).min(self.height.saturating_sub(1));

        let mut out = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let c = Coord::new(x, y);
                if c != pos && self.tile_at(c).is_some() {
                    out.push(c);
                }
            }
        }
        out
    }

    pub fn neighbors(&self, pos: Coord, radius: usize) -> Vec<&Tile> {
        self.neighbor_coords(pos, radius)
            .into_iter()
            .filter_map(|c| self.tile_at(c))
            .collect()
    }

    /// Put a tile in the slot named by its `pos`, returning any displaced tile
    pub fn place(&mut self, tile: Tile) -> Result<Option<Tile>, GridError> {
        let i = self.index(tile.pos).ok_or(GridError::OutOfBounds(tile.pos))?;
        Ok(self.slots[i].replace(tile))
    }

    /// Clear a slot. Removing an empty slot is a caller bug: asserts in debug
    /// builds, logs and does nothing in release.
    pub fn remove_at(&mut self, pos: Coord) -> Option<Tile> {
        let removed = self.index(pos).and_then(|i| self.slots[i].take());
        if removed.is_none() {
            debug_assert!(false, "remove_at({}, {}) on an empty slot", pos.x, pos.y);
            log::warn!("Ignoring removal of empty slot ({}, {})", pos.x, pos.y);
        }
        removed
    }

    /// Compact every column toward the bottom edge, preserving order
    pub fn apply_gravity(&mut self) -> Vec<MovementRecord> {
        let mut moves = Vec::new();
        for x in 0..self.width {
            let mut target = self.height;
            for y in (0..self.height).rev() {
                let from = y * self.width + x;
                if self.slots[from].is_none() {
                    continue;
                }
                target -= 1;
                if target == y {
                    continue;
                }
                let to = target * self.width + x;
                if let Some(mut tile) = self.slots[from].take() {
                    tile.pos = Coord::new(x, target);
                    tile.falling = true;
                    moves.push(MovementRecord {
                        tile_id: tile.id,
                        x,
                        from_y: y,
                        to_y: target,
                    });
                    self.slots[to] = Some(tile);
                }
            }
        }
        moves
    }

    /// Fill every empty slot, column-major, top to bottom
    pub fn refill(&mut self, factory: &mut TileFactory) -> Vec<Tile> {
        let mut created = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                let i = y * self.width + x;
                if self.slots[i].is_none() {
                    let tile = factory.spawn(Coord::new(x, y));
                    created.push(tile.clone());
                    self.slots[i] = Some(tile);
                }
            }
        }
        created
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn empty_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Live tiles in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.slots.iter_mut().flatten()
    }

    /// Coordinates of tiles matching `pred`
    pub fn coords_where(&self, pred: impl Fn(&Tile) -> bool) -> Vec<Coord> {
        self.iter().filter(|t| pred(t)).map(|t| t.pos).collect()
    }

    /// The only place surge counters go back to zero
    pub fn reset_surges(&mut self) {
        for tile in self.iter_mut() {
            tile.surge_count = 0;
            if tile.state == TileState::Destabilized {
                tile.state = TileState::Normal;
            }
        }
    }

    /// True if every `pos` field matches its slot
    pub fn positions_consistent(&self) -> bool {
        self.slots.iter().enumerate().all(|(i, slot)| match slot {
            Some(tile) => tile.pos == Coord::new(i % self.width, i / self.width),
            None => true,
        })
    }
}
