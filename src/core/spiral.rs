// Copyright @yucwang 2026

use crate::core::film::Film;
use crate::math::constants::{Vector2i, Vector2u};
use std::sync::Mutex;

/// One unit of work: a rectangle of the film in absolute pixel coordinates
/// and the pass it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub offset: Vector2i,
    pub size: Vector2u,
    pub pass: u32,
}

impl Block {
    pub fn area(&self) -> u64 {
        self.size.x as u64 * self.size.y as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    fn turn(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        }
    }
}

struct SpiralState {
    block_counter: usize,
    direction: Direction,
    position: Vector2i,
    steps_left: u32,
    steps: u32,
    pass: u32,
}

/// Hands out the blocks of the crop window in a spiral starting at the
/// centre, once per pass. Safe to call from several workers at once.
pub struct Spiral {
    block_size: u32,
    size: Vector2u,
    offset: Vector2u,
    blocks: Vector2i,
    block_count: usize,
    passes: u32,
    state: Mutex<SpiralState>,
}

impl Spiral {
    pub fn new(film: &Film, block_size: u32, passes: u32) -> Self {
        Self::with_window(film.crop_offset(), film.crop_size(), block_size, passes)
    }

    pub fn with_window(offset: Vector2u, size: Vector2u, block_size: u32, passes: u32) -> Self {
        let block_size = block_size.max(1);
        let blocks = Vector2i::new(((size.x + block_size - 1) / block_size) as i32,
                                   ((size.y + block_size - 1) / block_size) as i32);
        Self {
            block_size,
            size,
            offset,
            blocks,
            block_count: (blocks.x as usize) * (blocks.y as usize),
            passes: passes.max(1),
            state: Mutex::new(Self::initial_state(blocks, 0)),
        }
    }

    fn initial_state(blocks: Vector2i, pass: u32) -> SpiralState {
        SpiralState {
            block_counter: 0,
            direction: Direction::Right,
            position: Vector2i::new((blocks.x - 1) / 2, (blocks.y - 1) / 2),
            steps_left: 1,
            steps: 1,
            pass,
        }
    }

    /// Blocks per pass.
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Next block along the spiral. Once every pass is exhausted an empty
    /// block is returned.
    pub fn next_block(&self) -> Block {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if state.block_counter == self.block_count {
            if state.pass + 1 < self.passes {
                *state = Self::initial_state(self.blocks, state.pass + 1);
            } else {
                return Block { offset: Vector2i::zeros(), size: Vector2u::zeros(), pass: state.pass };
            }
        }

        let position = Vector2u::new(state.position.x as u32, state.position.y as u32);
        let start = position * self.block_size;
        let size = Vector2u::new(self.block_size.min(self.size.x - start.x),
                                 self.block_size.min(self.size.y - start.y));
        let offset = Vector2i::new((start.x + self.offset.x) as i32, (start.y + self.offset.y) as i32);
        let block = Block { offset, size, pass: state.pass };

        state.block_counter += 1;
        if state.block_counter != self.block_count {
            // Walk the spiral until it re-enters the grid.
            loop {
                match state.direction {
                    Direction::Right => state.position.x += 1,
                    Direction::Down => state.position.y += 1,
                    Direction::Left => state.position.x -= 1,
                    Direction::Up => state.position.y -= 1,
                }
                state.steps_left -= 1;
                if state.steps_left == 0 {
                    state.direction = state.direction.turn();
                    if matches!(state.direction, Direction::Left | Direction::Right) {
                        state.steps += 1;
                    }
                    state.steps_left = state.steps;
                }
                let p = state.position;
                if p.x >= 0 && p.y >= 0 && p.x < self.blocks.x && p.y < self.blocks.y {
                    break;
                }
            }
        }

        block
    }
}

#[cfg(test)]
mod tests {
    use super::Spiral;
    use crate::math::constants::{Vector2i, Vector2u};
    use std::collections::HashMap;

    #[test]
    fn test_spiral_starts_at_centre() {
        let spiral = Spiral::with_window(Vector2u::zeros(), Vector2u::new(96, 96), 32, 1);
        assert_eq!(spiral.block_count(), 9);
        let first = spiral.next_block();
        assert_eq!(first.offset, Vector2i::new(32, 32));
        let second = spiral.next_block();
        assert_eq!(second.offset, Vector2i::new(64, 32));
    }

    #[test]
    fn test_spiral_covers_every_block_each_pass() {
        let spiral = Spiral::with_window(Vector2u::new(3, 5), Vector2u::new(70, 40), 16, 2);
        assert_eq!(spiral.block_count(), 5 * 3);

        let mut seen: HashMap<(i32, i32, u32), Vector2u> = HashMap::new();
        let mut covered = 0u64;
        for i in 0..spiral.block_count() * 2 {
            let block = spiral.next_block();
            assert!(block.area() > 0);
            assert_eq!(block.pass as usize, i / spiral.block_count());
            assert!(block.offset.x >= 3 && block.offset.y >= 5);
            assert!(block.size.x <= 16 && block.size.y <= 16);
            covered += block.area();
            assert!(seen.insert((block.offset.x, block.offset.y, block.pass), block.size).is_none());
        }
        assert_eq!(covered, 2 * 70 * 40);
        assert_eq!(seen.get(&(3 + 64, 5 + 32, 0)), Some(&Vector2u::new(6, 8)));

        assert_eq!(spiral.next_block().area(), 0);
    }
}
