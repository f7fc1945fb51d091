use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::game::{Direction, Game};
use crate::history::{History, Score};
use crate::moves::{Move, Outcome};
use crate::store::{AUTOSAVE_NAMESPACE, SOLUTION_NAMESPACE, SolutionStore};

/// One level being played: the level as loaded, the live state and the moves
/// made since the last restart.
#[derive(Debug, Clone)]
pub struct Session {
    level: Game,
    game: Game,
    history: History,
}

/// A solution being played back one move at a time.
#[derive(Debug, Clone)]
pub struct Playback {
    moves: Vec<Direction>,
    next: usize,
}

impl Playback {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Moves not yet played.
    pub fn remaining(&self) -> usize {
        self.moves.len() - self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.moves.len()
    }
}

impl Session {
    pub fn new(level: Game) -> Self {
        let game = level.clone();
        Session {
            level,
            game,
            history: History::new(),
        }
    }

    /// The level as it was loaded.
    pub fn level(&self) -> &Game {
        &self.level
    }

    /// The live state.
    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_solved(&self) -> bool {
        self.game.is_solved()
    }

    pub fn known_solution(&self) -> Option<&str> {
        self.level.known_solution()
    }

    /// What moving in `dir` would do, without doing it.
    pub fn preview(&self, dir: Direction) -> Move {
        self.game.resolve(dir)
    }

    /// Apply a previewed move and record it if it went through.
    pub fn commit(&mut self, mv: Move) -> Outcome {
        let outcome = self.game.apply(mv);
        if !outcome.is_blocked() {
            self.history.record(mv.direction(), outcome.is_push());
        }
        outcome
    }

    pub fn push_move(&mut self, dir: Direction) -> Outcome {
        let mv = self.preview(dir);
        self.commit(mv)
    }

    /// Take back the last move by replaying all the others from the start.
    /// Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        if self.history.is_empty() {
            return Ok(false);
        }
        let replay = self
            .history
            .replay_prefix(&self.level, self.history.move_count() - 1)?;
        self.game = replay.game;
        self.history = replay.history;
        Ok(true)
    }

    pub fn restart(&mut self) {
        self.game = self.level.clone();
        self.history.clear();
    }

    /// Replace the session with the result of playing `solution` from the
    /// start. On error the session is left untouched.
    pub fn load_solution(&mut self, solution: &str) -> Result<Outcome> {
        let replay = History::parse(solution)?.replay(&self.level)?;
        self.game = replay.game;
        self.history = replay.history;
        Ok(replay.outcome)
    }

    /// Restart and prepare `solution` for step-by-step playback with
    /// [`Session::advance`].
    pub fn play_solution(&mut self, solution: &str) -> Result<Playback> {
        let parsed = History::parse(solution)?;
        self.restart();
        Ok(Playback {
            moves: parsed.steps().iter().map(|step| step.direction).collect(),
            next: 0,
        })
    }

    /// Play the known solution of this level, if there is one.
    pub fn play_known_solution(&mut self) -> Option<Result<Playback>> {
        let solution = self.level.known_solution()?.to_string();
        Some(self.play_solution(&solution))
    }

    /// Play the next move of `playback`. Returns `None` once it is finished.
    pub fn advance(&mut self, playback: &mut Playback) -> Result<Option<Outcome>> {
        let Some(&direction) = playback.moves.get(playback.next) else {
            return Ok(None);
        };
        let index = playback.next;
        playback.next += 1;

        let outcome = self.push_move(direction);
        if outcome.is_blocked() {
            playback.next = playback.moves.len();
            return Err(Error::IllegalReplay { index, direction });
        }
        Ok(Some(outcome))
    }

    /// Keep the current history as the level's best solution if the level is
    /// solved and nothing better is stored yet. Returns true if it was saved.
    pub fn record_solution(&mut self, store: &mut dyn SolutionStore) -> Result<bool> {
        if !self.game.is_solved() {
            return Ok(false);
        }
        let fingerprint = self.level.fingerprint();
        let score = self.history.score();

        if let Some(best) = store.load(fingerprint, SOLUTION_NAMESPACE)? {
            match Score::of(&best) {
                Ok(best_score) if best_score <= score => {
                    debug!("keeping stored solution {} over {}", best_score, score);
                    self.set_known_solution(best);
                    return Ok(false);
                }
                Ok(_) => {}
                Err(err) => warn!("replacing unreadable stored solution: {}", err),
            }
        }

        let solution = self.history.to_compressed();
        store.save(fingerprint, &solution, SOLUTION_NAMESPACE)?;
        info!("new best solution for level {}: {}", self.level.index() + 1, score);
        self.set_known_solution(solution);
        Ok(true)
    }

    fn set_known_solution(&mut self, solution: String) {
        self.level.set_known_solution(Some(solution.clone()));
        self.game.set_known_solution(Some(solution));
    }

    /// Write the current history to the autosave slot.
    pub fn save_progress(&self, store: &mut dyn SolutionStore) -> Result<()> {
        store.save(
            self.level.fingerprint(),
            &self.history.to_compressed(),
            AUTOSAVE_NAMESPACE,
        )
    }

    /// Replay the autosaved history, if any. Returns false when the slot is
    /// empty.
    pub fn restore_progress(&mut self, store: &dyn SolutionStore) -> Result<bool> {
        match store.load(self.level.fingerprint(), AUTOSAVE_NAMESPACE)? {
            Some(saved) if !saved.trim().is_empty() => {
                self.load_solution(&saved)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// XSB export of the level with its best known solution.
    pub fn snapshot(&self) -> String {
        self.level.snapshot(self.level.known_solution())
    }

    /// XSB export of the live position with the moves made so far.
    pub fn snapshot_progress(&self) -> String {
        self.game.snapshot(Some(&self.history.to_compressed()))
    }
}
