//! Best-effort stage results: the rows a stage managed to produce plus the
//! failure (if any) that cut it short.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Posts,
    Comments { post_id: i64 },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Posts => f.write_str("posts"),
            Stage::Comments { post_id } => write!(f, "comments of post {post_id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

impl StageFailure {
    pub fn new(stage: Stage, err: impl fmt::Display) -> Self {
        Self { stage, message: err.to_string() }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageOutcome<T> {
    pub rows: Vec<T>,
    pub failure: Option<StageFailure>,
    pub skipped: usize, // malformed items dropped at the boundary
}

impl<T> Default for StageOutcome<T> {
    fn default() -> Self {
        Self { rows: Vec::new(), failure: None, skipped: 0 }
    }
}

impl<T> StageOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}
