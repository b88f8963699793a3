use crate::geometry::Point;

/// 45° compass, clockwise from east (y grows downward)
pub const DIRECTIONS_45: [Point; 8] = [
    Point::new(1, 0),
    Point::new(1, 1),
    Point::new(0, 1),
    Point::new(-1, 1),
    Point::new(-1, 0),
    Point::new(-1, -1),
    Point::new(0, -1),
    Point::new(1, -1),
];

/// 90° compass, clockwise from east
pub const DIRECTIONS_90: [Point; 4] = [
    Point::new(1, 0),
    Point::new(0, 1),
    Point::new(-1, 0),
    Point::new(0, -1),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compass {
    #[default]
    EightWay,
    FourWay,
}

impl Compass {
    pub fn table(self) -> &'static [Point] {
        match self {
            Compass::EightWay => &DIRECTIONS_45,
            Compass::FourWay => &DIRECTIONS_90,
        }
    }
}

/// Reduce a signed index into `[0, len)`.
pub fn wrap_index(index: i64, len: usize) -> usize {
    index.rem_euclid(len as i64) as usize
}

/// Index of `dir` in `table`, if present.
pub fn index_of(table: &[Point], dir: Point) -> Option<usize> {
    table.iter().position(|&d| d == dir)
}
