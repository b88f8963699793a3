pub mod collision;
pub mod color;
pub mod directions;
pub mod engine;
pub mod turn;

use crate::geometry::Point;

pub use collision::CollisionPolicy;
pub use color::{ColorPolicy, Palette};
pub use directions::Compass;
pub use engine::WalkerConfig;
pub use turn::Algorithm;

/// Where the walker is and which table entry it is heading along
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkerState {
    pub position: Point,
    pub direction_index: usize,
}
