use super::env::Action;

/// Events emitted while a self-play batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    BatchStart { episodes: u64 },
    EpisodeStart { index: usize, length: usize },
    MoveCommitted { index: usize, cursor: usize, action: Action },
    EpisodeFinish {
        index: usize,
        structure: String,
        energy: f64,
    },
    BatchFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
