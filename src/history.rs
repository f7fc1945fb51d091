use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::error::{Error, Result};
use crate::game::{Direction, Game};
use crate::moves::Outcome;
use crate::rle;

/// One committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub direction: Direction,
    pub push: bool,
}

impl Step {
    pub fn symbol(&self) -> char {
        self.direction.symbol(self.push)
    }
}

/// Moves and pushes of a solution. Orders by moves, then pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
    pub moves: usize,
    pub pushes: usize,
}

impl Score {
    /// Score of a (possibly run-length compressed) solution string.
    pub fn of(solution: &str) -> Result<Score> {
        Ok(History::parse(solution)?.score())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.moves, self.pushes)
    }
}

/// Append-only log of the moves made in a play session.
///
/// Rendered as a solution string: `u/d/l/r` for steps, `U/D/L/R` for pushes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    steps: Vec<Step>,
    pushes: usize,
}

/// Result of replaying a history against a fresh level.
#[derive(Debug, Clone)]
pub struct Replay {
    pub game: Game,
    /// Outcome of the last move, empty for an empty history.
    pub outcome: Outcome,
    /// The replayed log, with push tags taken from what actually happened.
    pub history: History,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, direction: Direction, push: bool) {
        self.steps.push(Step { direction, push });
        if push {
            self.pushes += 1;
        }
    }

    /// Remove the last move. Does nothing on an empty log.
    pub fn undo(&mut self) -> Option<Step> {
        let step = self.steps.pop()?;
        if step.push {
            self.pushes -= 1;
        }
        Some(step)
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.pushes = 0;
    }

    pub fn move_count(&self) -> usize {
        self.steps.len()
    }

    pub fn push_count(&self) -> usize {
        self.pushes
    }

    pub fn score(&self) -> Score {
        Score {
            moves: self.move_count(),
            pushes: self.push_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run-length compressed solution string, the form kept in the store.
    pub fn to_compressed(&self) -> String {
        rle::compress(&self.to_string())
    }

    /// Parse an external solution string, optionally run-length compressed.
    /// Surrounding whitespace is ignored; anything else must be a move symbol
    /// or a repeat count followed by one.
    pub fn parse(solution: &str) -> Result<History> {
        let solution = solution.trim();
        validate_solution(solution)?;

        let mut history = History::new();
        for ch in rle::decompress(solution).chars() {
            if let Some((direction, push)) = Direction::from_symbol(ch) {
                history.record(direction, push);
            }
        }
        Ok(history)
    }

    /// Re-apply every move to a fresh copy of `level`.
    ///
    /// Fails with [`Error::IllegalReplay`] on the first move that is blocked,
    /// since that means the log does not belong to this level.
    pub fn replay(&self, level: &Game) -> Result<Replay> {
        self.replay_prefix(level, self.steps.len())
    }

    /// Replay only the first `count` moves.
    pub fn replay_prefix(&self, level: &Game, count: usize) -> Result<Replay> {
        let mut game = level.clone();
        let mut outcome = Outcome::empty();
        let mut history = History::new();

        for (index, step) in self.steps.iter().take(count).enumerate() {
            outcome = game.step(step.direction);
            if outcome.is_blocked() {
                return Err(Error::IllegalReplay {
                    index,
                    direction: step.direction,
                });
            }
            if outcome.is_push() != step.push {
                debug!(
                    "move #{} ({}) recorded as {} but replayed as {}",
                    index + 1,
                    step.direction,
                    if step.push { "push" } else { "step" },
                    if outcome.is_push() { "push" } else { "step" }
                );
            }
            history.record(step.direction, outcome.is_push());
        }

        Ok(Replay {
            game,
            outcome,
            history,
        })
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for History {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        History::parse(s)
    }
}

/// Check a solution string before any replay: only the eight move symbols and
/// repeat counts, with every count followed by a symbol.
pub fn validate_solution(solution: &str) -> Result<()> {
    if solution.is_empty() {
        return Err(Error::InvalidSolutionSyntax {
            position: 0,
            found: None,
        });
    }

    let mut pending_count = false;
    for (position, ch) in solution.chars().enumerate() {
        if ch.is_ascii_digit() {
            pending_count = true;
        } else if Direction::from_symbol(ch).is_some() {
            pending_count = false;
        } else {
            return Err(Error::InvalidSolutionSyntax {
                position,
                found: Some(ch),
            });
        }
    }

    if pending_count {
        return Err(Error::InvalidSolutionSyntax {
            position: solution.chars().count(),
            found: None,
        });
    }
    Ok(())
}
