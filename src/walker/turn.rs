use serde::Deserialize;

/// How far the walker turns, in direction-table steps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Turn {
    /// Signed step; collision search walks the table by this amount
    pub base: i64,
    /// Extra steps for loud pixels, applied only to the heading
    pub boost: i64,
}

impl Turn {
    pub fn total(&self) -> i64 {
        self.base + self.boost
    }
}

/// A turn law: maps each pixel's amplitude to a turn.
pub trait TurnLaw {
    fn next_turn(&mut self, amplitude: f64, avg_abs_amplitude: f64) -> Turn;
}

/// Walker variants selectable from the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// One step per pixel, two more on loud pixels
    #[default]
    Basic,
    /// Fibonacci-sized turns, boosted on loud pixels
    Fib,
    /// Fibonacci-sized turns without the boost
    FibTight,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Basic => "basic",
            Algorithm::Fib => "fib",
            Algorithm::FibTight => "fib-tight",
        }
    }

    /// Fresh turn state for one walk over a table of `table_len` headings.
    pub fn turn_law(self, table_len: usize) -> Box<dyn TurnLaw> {
        match self {
            Algorithm::Basic => Box::new(BasicTurns),
            Algorithm::Fib => Box::new(FibonacciTurns::new(table_len, true)),
            Algorithm::FibTight => Box::new(FibonacciTurns::new(table_len, false)),
        }
    }
}

pub struct BasicTurns;

impl TurnLaw for BasicTurns {
    fn next_turn(&mut self, amplitude: f64, avg: f64) -> Turn {
        let base = if amplitude > 0.0 { 1 } else { -1 };
        let boost = if amplitude > avg {
            2
        } else if amplitude < -avg {
            -2
        } else {
            0
        };
        Turn { base, boost }
    }
}

/// Fibonacci sequence reduced modulo `modulus`.
///
/// Turns only matter modulo the table length, so reducing keeps headings
/// identical to the unbounded sequence without overflowing.
#[derive(Clone, Debug)]
pub struct Fibonacci {
    a: u64,
    b: u64,
    modulus: u64,
}

impl Fibonacci {
    pub fn modulo(modulus: u64) -> Self {
        let modulus = modulus.max(1);
        Self {
            a: 0,
            b: 1 % modulus,
            modulus,
        }
    }
}

impl Iterator for Fibonacci {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let out = self.a;
        let next = ((self.a as u128 + self.b as u128) % self.modulus as u128) as u64;
        self.a = self.b;
        self.b = next;
        Some(out)
    }
}

pub struct FibonacciTurns {
    seq: Fibonacci,
    boosted: bool,
}

impl FibonacciTurns {
    pub fn new(table_len: usize, boosted: bool) -> Self {
        Self {
            seq: Fibonacci::modulo(table_len as u64),
            boosted,
        }
    }
}

impl TurnLaw for FibonacciTurns {
    fn next_turn(&mut self, amplitude: f64, avg: f64) -> Turn {
        // One draw per pixel regardless of sign
        let f = self.seq.next().unwrap_or(0) as i64;
        let base = if amplitude > 0.0 { f } else { -f };
        let boost = if !self.boosted {
            0
        } else if amplitude > avg {
            base + 1
        } else if amplitude < -avg {
            -(base + 1)
        } else {
            0
        };
        Turn { base, boost }
    }
}
