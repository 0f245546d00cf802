//! Replay source: frames recorded as s-expressions, one per line.
//!
//! Each line is a plist:
//!
//! ```text
//! (:t 0.033 :width 640 :height 480
//!  :hands ((:label "Left" :landmarks ((0.31 0.52 0.0) ...))
//!          (:label "Right" :landmarks ((0.68 0.49 0.0) ...))))
//! ```
//!
//! `:t` (seconds) is required.  `:width`/`:height` fall back to the
//! configured defaults.  `:hands` may be omitted or `nil` when nothing
//! was detected.  Blank lines and lines starting with `;` are skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use lexpr::Value;
use tracing::{debug, info};

use super::PoseSource;
use crate::hand::{Frame, FrameInput, Hand, HandLandmark, HandPose, Landmark};

/// Replay defaults for fields a recording may omit.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub default_width: u32,
    pub default_height: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            default_width: 640,
            default_height: 480,
        }
    }
}

impl ReplayConfig {
    /// Parse a "WxH" frame size string. Returns (width, height) or None.
    pub fn parse_size(s: &str) -> Option<(u32, u32)> {
        let (w, h) = s.split_once('x')?;
        let w = w.parse::<u32>().ok()?;
        let h = h.parse::<u32>().ok()?;
        if w > 0 && h > 0 {
            Some((w, h))
        } else {
            None
        }
    }
}

/// Reads frames from a line-oriented s-expression stream.
pub struct ReplaySource {
    reader: Box<dyn BufRead>,
    label: String,
    line_no: usize,
    config: ReplayConfig,
    /// Frames returned so far.
    pub frames_read: u64,
}

impl ReplaySource {
    /// Open a recording, or stdin when `path` is "-".
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if path.as_os_str() == "-" {
            info!("Replaying frames from stdin");
            return Ok(Self::from_reader(Box::new(io::stdin().lock()), "stdin"));
        }
        let file = File::open(path)
            .with_context(|| format!("failed to open replay file {}", path.display()))?;
        info!("Replaying frames from {}", path.display());
        Ok(Self::from_reader(
            Box::new(BufReader::new(file)),
            &path.display().to_string(),
        ))
    }

    pub fn from_reader(reader: Box<dyn BufRead>, label: &str) -> Self {
        Self {
            reader,
            label: label.to_string(),
            line_no: 0,
            config: ReplayConfig::default(),
            frames_read: 0,
        }
    }

    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }
}

impl PoseSource for ReplaySource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .reader
                .read_line(&mut line)
                .with_context(|| format!("{}: read failed", self.label))?;
            if n == 0 {
                debug!("{}: end of stream after {} frame(s)", self.label, self.frames_read);
                return Ok(None);
            }
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            let frame = parse_frame(trimmed, &self.config)
                .with_context(|| format!("{}:{}: bad frame", self.label, self.line_no))?;
            self.frames_read += 1;
            return Ok(Some(frame));
        }
    }
}

// ── Parsing ────────────────────────────────────────────────

/// Parse one frame plist.
pub fn parse_frame(raw: &str, config: &ReplayConfig) -> anyhow::Result<Frame> {
    let value = lexpr::from_str(raw).map_err(|e| anyhow!("malformed s-expression: {}", e))?;

    let timestamp_s = plist_get(&value, "t")
        .and_then(as_f64)
        .ok_or_else(|| anyhow!("missing numeric :t"))?;
    if !timestamp_s.is_finite() {
        bail!(":t must be finite, got {}", timestamp_s);
    }
    let width = get_dimension(&value, "width")?.unwrap_or(config.default_width);
    let height = get_dimension(&value, "height")?.unwrap_or(config.default_height);

    let mut poses = Vec::new();
    if let Some(hands) = plist_get(&value, "hands") {
        let entries = list_items(hands).ok_or_else(|| anyhow!(":hands must be a list"))?;
        for (i, entry) in entries.into_iter().enumerate() {
            if let Some(pose) = parse_hand(entry).with_context(|| format!("hand {}", i))? {
                poses.push(pose);
            }
        }
    }

    Ok(Frame {
        input: FrameInput::from_poses(poses),
        width,
        height,
        timestamp_s,
    })
}

/// Parse one `(:label L :landmarks (...))` entry. Unknown labels are skipped.
fn parse_hand(entry: &Value) -> anyhow::Result<Option<HandPose>> {
    let label = plist_get(entry, "label")
        .and_then(as_text)
        .ok_or_else(|| anyhow!("missing :label"))?;
    let Some(hand) = Hand::from_label(&label) else {
        debug!("ignoring hand with label {:?}", label);
        return Ok(None);
    };

    let points = plist_get(entry, "landmarks")
        .and_then(list_items)
        .ok_or_else(|| anyhow!("missing :landmarks list"))?;
    let landmarks = points
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            parse_landmark(p).with_context(|| match HandLandmark::ALL.get(i) {
                Some(lm) => format!("landmark {} ({})", i, lm.as_str()),
                None => format!("landmark {}", i),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    HandPose::new(hand, landmarks).map(Some).map_err(|e| anyhow!(e))
}

/// `(x y)` or `(x y z)`.
fn parse_landmark(point: &Value) -> anyhow::Result<Landmark> {
    let coords = list_items(point)
        .ok_or_else(|| anyhow!("expected a coordinate list"))?
        .into_iter()
        .map(|v| as_f64(v).ok_or_else(|| anyhow!("non-numeric coordinate {}", v)))
        .collect::<anyhow::Result<Vec<f64>>>()?;
    landmark_from_coords(&coords)
}

/// Narrow to `f32`; values that do not fit (or NaN) are rejected.
fn landmark_from_coords(coords: &[f64]) -> anyhow::Result<Landmark> {
    let lm = match coords {
        [x, y] => Landmark::new(*x as f32, *y as f32, 0.0),
        [x, y, z] => Landmark::new(*x as f32, *y as f32, *z as f32),
        other => bail!("expected 2 or 3 coordinates, got {}", other.len()),
    };
    if !(lm.x.is_finite() && lm.y.is_finite() && lm.z.is_finite()) {
        bail!("non-finite coordinate in {:?}", coords);
    }
    Ok(lm)
}

fn get_dimension(value: &Value, key: &str) -> anyhow::Result<Option<u32>> {
    let Some(v) = plist_get(value, key) else {
        return Ok(None);
    };
    match v {
        Value::Number(n) => match n.as_u64() {
            Some(px) if px > 0 && px <= u64::from(u32::MAX) => Ok(Some(px as u32)),
            _ => bail!(":{} must be a positive integer, got {}", key, n),
        },
        other => bail!(":{} must be a positive integer, got {}", key, other),
    }
}

// ── Plist helpers ──────────────────────────────────────────

/// Find the value following `:key` in a plist.
/// Handles both `Value::Keyword("key")` and `Value::Symbol(":key")` forms.
fn plist_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) if !is_nil(next.car()) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

fn is_nil(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Null => true,
        Value::Symbol(s) => s.as_ref() == "nil",
        _ => false,
    }
}

/// Elements of a proper list or vector. `()` and `nil` are empty.
fn list_items(value: &Value) -> Option<Vec<&Value>> {
    if let Value::Vector(items) = value {
        return Some(items.iter().collect());
    }
    if is_nil(value) {
        return Some(Vec::new());
    }
    let mut items = Vec::new();
    let mut current = value;
    loop {
        match current {
            Value::Cons(pair) => {
                items.push(pair.car());
                current = pair.cdr();
            }
            Value::Null | Value::Nil => return Some(items),
            _ => return None,
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Strings, symbols, and keywords as plain text.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        Value::Symbol(s) => {
            let s: &str = s;
            Some(s.strip_prefix(':').unwrap_or(s).to_string())
        }
        Value::Keyword(k) => Some(k.to_string()),
        _ => None,
    }
}
