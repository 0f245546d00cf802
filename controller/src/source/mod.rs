//! Pose sources: where frames of hand landmarks come from.
//!
//! Provides:
//! - `PoseSource`: blocking "next frame" interface
//! - `replay`: frames recorded as s-expressions, one per line
//! - `demo`: synthetic two-hand wheel for running without a detector

pub mod demo;
pub mod replay;

use std::path::PathBuf;

use crate::hand::Frame;

/// A blocking producer of frames.
pub trait PoseSource {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Block until the next frame. `Ok(None)` signals end of stream.
    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>>;
}

impl<S: PoseSource + ?Sized> PoseSource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        (**self).next_frame()
    }
}

/// Source selector.
#[derive(Debug, Clone)]
pub enum SourceType {
    /// Replay from a file, or stdin for "-".
    Replay {
        path: PathBuf,
        config: replay::ReplayConfig,
    },
    Demo(demo::DemoConfig),
}

/// Open the selected source.
pub fn open(source: SourceType) -> anyhow::Result<Box<dyn PoseSource>> {
    match source {
        SourceType::Replay { path, config } => Ok(Box::new(
            replay::ReplaySource::open(&path)?.with_config(config),
        )),
        SourceType::Demo(config) => Ok(Box::new(demo::DemoSource::new(config))),
    }
}
