//! Plain-text trace format.
//!
//! ```text
//! /abs/path/to/song.mp3
//! width,height
//! x,y,red,green,blue,alpha,timestamp,duration
//! ...
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::{PlaybackEvent, PlaybackTrace};
use crate::error::{SongError, SongResult};
use crate::geometry::{Point, Resolution};
use crate::render::pixels::Rgba;

pub fn write_to<W: Write>(trace: &PlaybackTrace, mut out: W) -> std::io::Result<()> {
    writeln!(out, "{}", trace.source().display())?;
    let res = trace.resolution();
    writeln!(out, "{},{}", res.width, res.height)?;
    for e in trace.events() {
        writeln!(
            out,
            "{},{},{},{},{}",
            e.position.x, e.position.y, e.color, e.timestamp, e.duration
        )?;
    }
    out.flush()
}

/// Parse a trace. Pixel time is not stored on its own line; it is taken
/// from the first event, so a trace without events reads back as 0.0.
pub fn read_from<R: BufRead>(input: R) -> SongResult<PlaybackTrace> {
    let lines: Vec<String> = input
        .lines()
        .collect::<Result<_, _>>()
        .map_err(|e| SongError::trace(0, e.to_string()))?;

    let source = lines.first().ok_or_else(|| SongError::trace(0, "missing source path"))?;
    let res_line = lines.get(1).ok_or_else(|| SongError::trace(0, "missing resolution"))?;
    let resolution = parse_resolution(res_line).ok_or_else(|| {
        SongError::trace(2, format!("expected width,height, got '{res_line}'"))
    })?;

    let mut events = Vec::with_capacity(lines.len().saturating_sub(2));
    for (i, line) in lines.iter().enumerate().skip(2) {
        if line.trim().is_empty() {
            continue;
        }
        let event = parse_event(line)
            .ok_or_else(|| SongError::trace(i + 1, format!("malformed event '{line}'")))?;
        events.push(event);
    }

    let pixel_time = events.first().map_or(0.0, |e| e.duration);
    let mut trace = PlaybackTrace::new(source.as_str(), resolution, pixel_time);
    for e in events {
        trace.push(e);
    }
    Ok(trace)
}

/// Write atomically: a partial trace never replaces a complete one.
pub fn save(trace: &PlaybackTrace, path: &Path) -> Result<()> {
    let tmp = path.with_extension("trace.partial");
    let file = fs::File::create(&tmp)
        .with_context(|| format!("Failed to create trace file: {}", tmp.display()))?;
    write_to(trace, BufWriter::new(file))
        .with_context(|| format!("Failed to write trace file: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move trace into place: {}", path.display()))?;
    log::debug!("Wrote {} trace events to {}", trace.len(), path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<PlaybackTrace> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open trace file: {}", path.display()))?;
    let trace = read_from(BufReader::new(file))
        .with_context(|| format!("Failed to parse trace file: {}", path.display()))?;
    Ok(trace)
}

fn parse_resolution(line: &str) -> Option<Resolution> {
    let (w, h) = line.trim().split_once(',')?;
    Some(Resolution::new(w.trim().parse().ok()?, h.trim().parse().ok()?))
}

fn parse_event(line: &str) -> Option<PlaybackEvent> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    let [x, y, r, g, b, a, timestamp, duration] = fields[..] else {
        return None;
    };
    Some(PlaybackEvent {
        position: Point::new(x.parse().ok()?, y.parse().ok()?),
        color: Rgba::new(r.parse().ok()?, g.parse().ok()?, b.parse().ok()?, a.parse().ok()?),
        timestamp: timestamp.parse().ok()?,
        duration: duration.parse().ok()?,
    })
}
