use serde::Deserialize;

use super::directions::{index_of, wrap_index};
use super::WalkerState;
use crate::geometry::{Point, Resolution};

/// What the walker does when its next step would leave the image
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Keep turning by the current turn amount until a heading stays inside
    #[default]
    Search,
    /// Reappear at the opposite edge
    Wrap,
    /// Mirror the heading off the edge
    #[serde(alias = "flip-180", alias = "collide-180")]
    Flip180,
}

impl CollisionPolicy {
    /// Move from `position` along `table[direction_index]`, resolving any
    /// collision with the image edge. `turn` is the signed turn amount used
    /// when searching for a new heading.
    pub fn advance(
        self,
        resolution: Resolution,
        table: &[Point],
        position: Point,
        direction_index: usize,
        turn: i64,
    ) -> WalkerState {
        match self {
            CollisionPolicy::Search => search(resolution, table, position, direction_index, turn),
            CollisionPolicy::Wrap => WalkerState {
                position: wrap(resolution, position + table[direction_index]),
                direction_index,
            },
            CollisionPolicy::Flip180 => flip(resolution, table, position, direction_index),
        }
    }
}

fn search(resolution: Resolution, table: &[Point], position: Point, start: usize, turn: i64) -> WalkerState {
    // A zero step, or one whose orbit skips every inward heading, falls back
    // to unit steps in the same rotational sense.
    let unit = if turn < 0 { -1 } else { 1 };
    let found = scan(resolution, table, position, start, turn)
        .or_else(|| scan(resolution, table, position, start, unit));

    match found {
        Some(i) => WalkerState {
            position: position + table[i],
            direction_index: i,
        },
        // 1x1 image: nowhere to go
        None => WalkerState {
            position,
            direction_index: start,
        },
    }
}

fn scan(resolution: Resolution, table: &[Point], position: Point, start: usize, step: i64) -> Option<usize> {
    let mut idx = start;
    for _ in 0..table.len() {
        if resolution.contains(position + table[idx]) {
            return Some(idx);
        }
        idx = wrap_index(idx as i64 + step, table.len());
    }
    None
}

fn wrap(resolution: Resolution, p: Point) -> Point {
    let wrap_axis = |v: i64, size: i64| {
        if v >= size {
            0
        } else if v < 0 {
            size - 1
        } else {
            v
        }
    };
    Point::new(
        wrap_axis(p.x, resolution.width as i64),
        wrap_axis(p.y, resolution.height as i64),
    )
}

fn flip(resolution: Resolution, table: &[Point], position: Point, direction_index: usize) -> WalkerState {
    let mut dir = table[direction_index];

    let width = resolution.width as i64;
    let height = resolution.height as i64;
    let outside = |v: i64, size: i64| v < 0 || v >= size;

    if outside(position.x + dir.x, width) {
        dir.x = -dir.x;
        if outside(position.x + dir.x, width) {
            dir.x = 0;
        }
    }
    if outside(position.y + dir.y, height) {
        dir.y = -dir.y;
        if outside(position.y + dir.y, height) {
            dir.y = 0;
        }
    }

    WalkerState {
        position: position + dir,
        direction_index: index_of(table, dir).unwrap_or(direction_index),
    }
}
