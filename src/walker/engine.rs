use super::collision::CollisionPolicy;
use super::color::{ColorPolicy, Palette};
use super::directions::{wrap_index, Compass};
use super::turn::{Algorithm, Turn, TurnLaw};
use super::WalkerState;
use crate::audio::track::{PixelFeature, SongTrack};
use crate::geometry::Point;
use crate::render::pixels::{PixelBuffer, Rgba};
use crate::trace::{PlaybackEvent, PlaybackTrace};

/// Everything that selects one walker variant
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WalkerConfig {
    pub algorithm: Algorithm,
    pub compass: Compass,
    pub collision: CollisionPolicy,
    pub color_policy: ColorPolicy,
    pub palette: Palette,
    pub start_middle: bool,
}

/// What happened at one pixel index
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Visit {
    pub pixel_index: usize,
    /// Where the color decision was made
    pub position: Point,
    pub feature: PixelFeature,
    /// The new color, if the pixel changed
    pub painted: Option<Rgba>,
    pub turn: Turn,
    /// State after the move
    pub next: WalkerState,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkSummary {
    pub visited: usize,
    pub changed: usize,
    pub final_state: WalkerState,
}

/// Walks a song's pixel indices in order, one visit per index.
///
/// Every step depends on the state the previous one left behind, so a walk
/// is inherently sequential.
pub struct Walker<'a> {
    track: &'a SongTrack,
    config: WalkerConfig,
    table: &'static [Point],
    turns: Box<dyn TurnLaw>,
    state: WalkerState,
    next_pixel: usize,
}

impl<'a> Walker<'a> {
    pub fn new(track: &'a SongTrack, config: WalkerConfig) -> Self {
        let table = config.compass.table();
        let position = if config.start_middle {
            track.resolution().center()
        } else {
            Point::default()
        };
        Self {
            track,
            config,
            table,
            turns: config.algorithm.turn_law(table.len()),
            state: WalkerState {
                position,
                direction_index: 0,
            },
            next_pixel: 0,
        }
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    /// Heading change plus collision handling for one turn.
    pub fn transition(&self, state: WalkerState, turn: Turn) -> WalkerState {
        let heading = wrap_index(state.direction_index as i64 + turn.total(), self.table.len());
        self.config.collision.advance(
            self.track.resolution(),
            self.table,
            state.position,
            heading,
            turn.base,
        )
    }

    /// Visit the next pixel index, or `None` once all are consumed.
    pub fn step(&mut self, pixels: &mut PixelBuffer) -> Option<Visit> {
        let pixel_index = self.next_pixel;
        if pixel_index >= self.track.num_pixels() {
            return None;
        }

        let feature = self.track.feature_at(pixel_index);
        let position = self.state.position;
        let painted = self
            .config
            .color_policy
            .paint(&self.config.palette, pixels, position, feature.beat);

        let turn = self
            .turns
            .next_turn(feature.amplitude, self.track.avg_abs_amplitude());
        let next = self.transition(self.state, turn);

        self.state = next;
        self.next_pixel += 1;

        Some(Visit {
            pixel_index,
            position,
            feature,
            painted,
            turn,
            next,
        })
    }

    /// Walk every remaining pixel, recording color changes into `trace`.
    pub fn run(mut self, pixels: &mut PixelBuffer, mut trace: Option<&mut PlaybackTrace>) -> WalkSummary {
        let pixel_time = self.track.pixel_time();
        let mut visited = 0;
        let mut changed = 0;

        while let Some(visit) = self.step(pixels) {
            visited += 1;
            log::trace!(
                "pixel {}: ({}, {}) turn {:+} -> ({}, {}) heading {}",
                visit.pixel_index,
                visit.position.x,
                visit.position.y,
                visit.turn.total(),
                visit.next.position.x,
                visit.next.position.y,
                visit.next.direction_index
            );
            let Some(color) = visit.painted else {
                continue;
            };
            changed += 1;
            if let Some(trace) = trace.as_deref_mut() {
                trace.push(PlaybackEvent {
                    position: visit.position,
                    color,
                    timestamp: visit.feature.timestamp,
                    duration: pixel_time,
                });
            }
        }

        WalkSummary {
            visited,
            changed,
            final_state: self.state(),
        }
    }
}

/// A finished walk over a fresh image
pub struct Painting {
    pub pixels: PixelBuffer,
    pub trace: Option<PlaybackTrace>,
    pub summary: WalkSummary,
}

pub fn paint(track: &SongTrack, config: WalkerConfig, with_trace: bool) -> Painting {
    let resolution = track.resolution();
    let mut pixels = PixelBuffer::new(resolution);
    let mut trace = with_trace
        .then(|| PlaybackTrace::new(track.song().path(), resolution, track.pixel_time()));

    let summary = Walker::new(track, config).run(&mut pixels, trace.as_mut());

    log::debug!(
        "Walked {} @ {} ({}): {} visits, {} color changes, ended at ({}, {})",
        track.song().path().display(),
        resolution,
        config.algorithm.name(),
        summary.visited,
        summary.changed,
        summary.final_state.position.x,
        summary.final_state.position.y
    );

    Painting {
        pixels,
        trace,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DecodedSong;
    use crate::geometry::Resolution;
    use std::sync::Arc;

    fn track(samples: Vec<f32>, duration: f64, tempo_bpm: f64, res: Resolution) -> SongTrack {
        let rate = (samples.len() as f64 / duration).max(1.0) as u32;
        let song = DecodedSong::with_duration("/music/test.mp3", samples, rate, duration, tempo_bpm);
        SongTrack::new(Arc::new(song), res).unwrap()
    }

    fn wobbly_track(res: Resolution) -> SongTrack {
        let n = res.num_pixels() * 3;
        let samples = (0..n)
            .map(|i| (i as f32 * 0.21).sin() * 0.8 + (i as f32 * 0.037).cos() * 0.3)
            .collect();
        track(samples, 30.0, 128.0, res)
    }

    #[test]
    fn two_by_two_walk() {
        let t = track(vec![1.0, -1.0, 2.0, -2.0], 2.0, 240.0, Resolution::new(2, 2));
        let painting = paint(&t, WalkerConfig::default(), true);
        let palette = Palette::default();

        let px = &painting.pixels;
        assert_eq!(px.get(Point::new(0, 0)), Some(palette.off_beat));
        assert_eq!(px.get(Point::new(1, 0)), Some(palette.beat));
        assert_eq!(px.get(Point::new(1, 1)), Some(palette.beat));
        assert_eq!(px.get(Point::new(0, 1)), Some(Rgba::TRANSPARENT));

        let trace = painting.trace.unwrap();
        let visits: Vec<(Point, f64)> = trace.events().iter().map(|e| (e.position, e.timestamp)).collect();
        assert_eq!(
            visits,
            vec![
                (Point::new(0, 0), 0.0),
                (Point::new(1, 1), 0.0),
                (Point::new(1, 0), 1.0),
                (Point::new(1, 1), 1.0),
            ]
        );
        assert!(trace.events().iter().all(|e| e.duration == 0.5));
        assert_eq!(painting.summary.final_state.position, Point::new(1, 0));
        assert_eq!(painting.summary.final_state.direction_index, 6);
    }

    #[test]
    fn every_variant_stays_in_bounds() {
        let res = Resolution::new(7, 5);
        let t = wobbly_track(res);
        for algorithm in [Algorithm::Basic, Algorithm::Fib, Algorithm::FibTight] {
            for compass in [Compass::EightWay, Compass::FourWay] {
                for collision in [CollisionPolicy::Search, CollisionPolicy::Wrap, CollisionPolicy::Flip180] {
                    for start_middle in [false, true] {
                        let config = WalkerConfig {
                            algorithm,
                            compass,
                            collision,
                            start_middle,
                            ..Default::default()
                        };
                        let mut pixels = PixelBuffer::new(res);
                        let mut walker = Walker::new(&t, config);
                        let mut count = 0;
                        while let Some(visit) = walker.step(&mut pixels) {
                            assert_eq!(visit.pixel_index, count);
                            assert!(res.contains(visit.position), "{config:?}");
                            assert!(res.contains(visit.next.position), "{config:?}");
                            assert!(visit.next.direction_index < compass.table().len());
                            count += 1;
                        }
                        assert_eq!(count, res.num_pixels());
                    }
                }
            }
        }
    }

    #[test]
    fn trace_follows_visit_order() {
        let res = Resolution::new(6, 6);
        let t = wobbly_track(res);
        let painting = paint(&t, WalkerConfig::default(), true);
        let trace = painting.trace.unwrap();

        assert_eq!(trace.len(), painting.summary.changed);
        assert!(trace
            .events()
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));

        // Timestamps come from the pixel index that made the change
        let mut pixels = PixelBuffer::new(res);
        let mut walker = Walker::new(&t, WalkerConfig::default());
        let mut expected = Vec::new();
        while let Some(visit) = walker.step(&mut pixels) {
            if visit.painted.is_some() {
                expected.push((visit.position, t.timestamp_at(visit.pixel_index)));
            }
        }
        let actual: Vec<(Point, f64)> = trace.events().iter().map(|e| (e.position, e.timestamp)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn no_trace_unless_requested() {
        let t = wobbly_track(Resolution::new(4, 4));
        let painting = paint(&t, WalkerConfig::default(), false);
        assert!(painting.trace.is_none());
        assert_eq!(painting.summary.visited, 16);
        assert!(painting.pixels.painted() > 0);
    }

    #[test]
    fn starts_in_the_middle_on_request() {
        let t = wobbly_track(Resolution::new(9, 4));
        let config = WalkerConfig {
            start_middle: true,
            ..Default::default()
        };
        let walker = Walker::new(&t, config);
        assert_eq!(walker.state().position, Point::new(4, 2));
        assert_eq!(walker.state().direction_index, 0);
    }

    #[test]
    fn wrap_transition_crosses_to_opposite_edge() {
        let t = wobbly_track(Resolution::new(5, 3));
        let config = WalkerConfig {
            collision: CollisionPolicy::Wrap,
            ..Default::default()
        };
        let walker = Walker::new(&t, config);
        let at_edge = WalkerState {
            position: Point::new(4, 1),
            direction_index: 0,
        };
        let next = walker.transition(at_edge, Turn::default());
        assert_eq!(next.position, Point::new(0, 1));
        assert_eq!(next.direction_index, 0);
    }

    #[test]
    fn overwrite_paints_every_visit() {
        let res = Resolution::new(3, 3);
        let t = wobbly_track(res);
        let config = WalkerConfig {
            color_policy: ColorPolicy::Overwrite,
            ..Default::default()
        };
        let mut pixels = PixelBuffer::new(res);
        let mut walker = Walker::new(&t, config);
        let palette = Palette::default();
        while let Some(visit) = walker.step(&mut pixels) {
            let expected = if visit.feature.beat { palette.beat } else { palette.off_beat };
            assert_eq!(pixels.get(visit.position), Some(expected));
        }
    }
}
