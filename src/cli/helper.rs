// src/cli/helper.rs
use crate::cli::commands::Command;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper, Result as RustylineResult};

#[derive(Helper)]
pub struct ReplHelper {}

impl ReplHelper {
    pub fn new() -> Self {
        Self {}
    }

    fn candidates(&self, line: &str, pos: usize) -> Vec<Pair> {
        // Only a lone command token is completed; chat text is left alone.
        if !line.starts_with('/') || line.contains(char::is_whitespace) || pos != line.len() {
            return Vec::new();
        }
        Command::ALL
            .iter()
            .map(Command::token)
            .filter(|token| token.starts_with(line))
            .map(|token| Pair {
                display: token.to_string(),
                replacement: token.to_string(),
            })
            .collect()
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> RustylineResult<(usize, Vec<Self::Candidate>)> {
        Ok((0, self.candidates(line, pos)))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Validator for ReplHelper {}

impl Highlighter for ReplHelper {}
