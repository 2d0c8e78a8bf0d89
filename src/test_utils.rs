use crate::cli::{Args, Context, LineReader};
use crate::roster::Roster;
use crate::transcript::Transcript;
use crate::utils::validation::YearRange;
use anyhow::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;

/// Feeds a fixed list of lines to the interactive flow, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl LineReader for ScriptedInput {
    fn read_line(&mut self, prompt: &str, _remember: bool) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front())
    }
}

pub fn test_args() -> Args {
    Args {
        data: None,
        config: None,
        transcripts_dir: None,
        no_transcript: true,
        debug: false,
    }
}

/// Context over the default roster with its data file inside `dir`.
pub fn test_context(dir: &Path) -> Context {
    let data_path = dir.join("data.dat");
    Context {
        args: test_args(),
        transcript: RefCell::new(Transcript::disabled("test", &data_path)),
        data_path,
        years: YearRange {
            min: 2025,
            max: 2030,
        },
        session_id: "test".to_string(),
        roster: RefCell::new(Roster::with_defaults()),
    }
}
