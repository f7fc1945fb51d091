//! Move resolution. A move is decided by [`Game::resolve`] without touching
//! the state and carried out by [`Game::apply`], so a caller can animate in
//! between. [`Game::step`] does both at once.

use bitflags::bitflags;
use log::{debug, warn};

use crate::game::{Direction, Game, Position};

bitflags! {
    /// Result flags of a move. Exactly one of `BLOCKED`, `STEPPED` or `PUSHED`
    /// is set; `SOLVED` is added by [`Game::apply`] when the move wins the level.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Outcome: u8 {
        const BLOCKED = 1;
        const STEPPED = 1 << 1;
        const PUSHED = 1 << 2;
        const SOLVED = 1 << 3;
    }
}

impl Outcome {
    pub fn is_blocked(self) -> bool {
        self.contains(Outcome::BLOCKED)
    }

    pub fn is_push(self) -> bool {
        self.contains(Outcome::PUSHED)
    }

    pub fn is_solved(self) -> bool {
        self.contains(Outcome::SOLVED)
    }
}

/// A resolved but not yet applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    direction: Direction,
    from: Position,
    outcome: Outcome,
}

impl Move {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Player position the move was resolved from.
    pub fn from(&self) -> Position {
        self.from
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

impl Game {
    /// Decide what moving the player in `dir` would do. Never mutates.
    pub fn resolve(&self, dir: Direction) -> Move {
        let from = self.player_pos();
        let outcome = match self.move_position(from, dir) {
            None => Outcome::BLOCKED,
            Some(target) => {
                let cell = self.get_cell(target);
                if cell.is_free() {
                    Outcome::STEPPED
                } else if cell.has_box() {
                    match self.move_position(target, dir) {
                        Some(beyond) if self.get_cell(beyond).is_free() => Outcome::PUSHED,
                        _ => Outcome::BLOCKED,
                    }
                } else {
                    // wall, or a blank outside the playfield
                    Outcome::BLOCKED
                }
            }
        };

        Move {
            direction: dir,
            from,
            outcome,
        }
    }

    /// Carry out a move returned by [`Game::resolve`] on this same state.
    ///
    /// A blocked move changes nothing. A move resolved against a different
    /// state is rejected as blocked.
    pub fn apply(&mut self, mv: Move) -> Outcome {
        if mv.outcome.is_blocked() {
            return Outcome::BLOCKED;
        }
        if self.resolve(mv.direction) != mv {
            warn!(
                "discarding stale {} move resolved at {:?}, player is at {:?}",
                mv.direction,
                mv.from,
                self.player_pos()
            );
            return Outcome::BLOCKED;
        }

        let Some(target) = self.move_position(mv.from, mv.direction) else {
            return Outcome::BLOCKED;
        };
        if mv.outcome.is_push() {
            let Some(beyond) = self.move_position(target, mv.direction) else {
                return Outcome::BLOCKED;
            };
            self.move_box(target, beyond);
        }
        self.set_player_pos(target);

        let mut outcome = mv.outcome;
        if self.is_solved() {
            outcome |= Outcome::SOLVED;
        }
        debug!("{} from {:?}: {:?}", mv.direction, mv.from, outcome);
        outcome
    }

    /// Resolve and apply in one call.
    pub fn step(&mut self, dir: Direction) -> Outcome {
        let mv = self.resolve(dir);
        self.apply(mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ALL_DIRECTIONS;
    use crate::levels::parse_level;

    #[test]
    fn test_push_onto_goal_solves() {
        let mut game = parse_level("#####\n#@$.#\n#####").unwrap();
        let outcome = game.step(Direction::Right);
        assert_eq!(outcome, Outcome::PUSHED | Outcome::SOLVED);
        assert_eq!(game.player_pos(), (2, 1));
        assert!(game.get_cell((3, 1)).has_box());
        assert!(!game.get_cell((2, 1)).has_box());
        assert!(game.is_solved());
    }

    #[test]
    fn test_blocked_then_push_matches_direct() {
        let mut direct = parse_level("#####\n#@$.#\n#####").unwrap();
        direct.step(Direction::Right);

        let mut game = parse_level("#####\n#@$.#\n#####").unwrap();
        let before = game.clone();
        assert_eq!(game.step(Direction::Left), Outcome::BLOCKED);
        assert_eq!(game, before);
        assert_eq!(game.step(Direction::Right), Outcome::PUSHED | Outcome::SOLVED);
        assert_eq!(game, direct);
    }

    #[test]
    fn test_step_onto_floor_and_goal() {
        let mut game = parse_level("######\n#@ .$#\n#  . #\n# $  #\n######").unwrap();
        assert_eq!(game.step(Direction::Right), Outcome::STEPPED);
        assert_eq!(game.player_pos(), (2, 1));
        assert_eq!(game.step(Direction::Right), Outcome::STEPPED);
        assert_eq!(game.player_pos(), (3, 1));
        assert!(game.get_cell((3, 1)).is_goal());
        assert!(!game.is_solved());
    }

    #[test]
    fn test_wall_never_mutates() {
        let mut game = parse_level("#####\n#@ .#\n# $ #\n#   #\n#####").unwrap();
        // walk the player to every interior cell, trying each direction
        let interior = [(1, 1), (2, 1), (3, 1), (3, 2), (3, 3), (2, 3), (1, 3), (1, 2)];
        let path = [
            Direction::Right,
            Direction::Right,
            Direction::Down,
            Direction::Down,
            Direction::Left,
            Direction::Left,
            Direction::Up,
        ];
        for (i, &pos) in interior.iter().enumerate() {
            assert_eq!(game.player_pos(), pos);
            for dir in ALL_DIRECTIONS {
                let target = game.move_position(pos, dir).unwrap();
                if game.get_cell(target).is_wall() {
                    let before = game.clone();
                    assert_eq!(game.step(dir), Outcome::BLOCKED);
                    assert_eq!(game, before);
                }
            }
            if let Some(&dir) = path.get(i) {
                assert_eq!(game.step(dir), Outcome::STEPPED);
            }
        }
    }

    #[test]
    fn test_push_into_wall_is_blocked() {
        let mut game = parse_level("#####\n#@$##\n# . #\n#####").unwrap();
        let before = game.clone();
        assert_eq!(game.step(Direction::Right), Outcome::BLOCKED);
        assert_eq!(game, before);
    }

    #[test]
    fn test_push_into_another_box_is_blocked() {
        let mut game = parse_level("#######\n#@$$  #\n# ..  #\n#######").unwrap();
        let before = game.clone();
        assert_eq!(game.step(Direction::Right), Outcome::BLOCKED);
        assert_eq!(game, before);
    }

    #[test]
    fn test_push_off_grid_edge_is_blocked() {
        // open row: the box sits on the last column
        let mut game = parse_level("@$\n.-").unwrap();
        let before = game.clone();
        assert_eq!(game.step(Direction::Right), Outcome::BLOCKED);
        assert_eq!(game.step(Direction::Up), Outcome::BLOCKED);
        assert_eq!(game, before);
    }

    #[test]
    fn test_all_push_directions() {
        let cases = [
            (Direction::Right, "#####\n#@$ #\n# . #\n#####", (2, 1), (3, 1)),
            (Direction::Down, "#####\n# @ #\n# $ #\n# . #\n#####", (2, 2), (2, 3)),
            (Direction::Left, "#####\n# $@#\n# . #\n#####", (2, 1), (1, 1)),
            (Direction::Up, "#####\n# . #\n# $ #\n# @ #\n#####", (2, 2), (2, 1)),
        ];
        for (dir, level, player, boxed) in cases {
            let mut game = parse_level(level).unwrap();
            let outcome = game.step(dir);
            assert!(outcome.is_push(), "Failed for {:?}", dir);
            assert_eq!(game.player_pos(), player, "Failed for {:?}", dir);
            assert!(game.get_cell(boxed).has_box(), "Failed for {:?}", dir);
        }
    }

    #[test]
    fn test_solved_iff_all_goals_covered() {
        let mut game = parse_level("#####\n#@$.#\n# $.#\n#####").unwrap();
        assert_eq!(game.step(Direction::Right), Outcome::PUSHED);
        assert!(!game.is_solved());
        assert_eq!(game.step(Direction::Left), Outcome::STEPPED);
        assert_eq!(game.step(Direction::Down), Outcome::STEPPED);
        assert_eq!(game.step(Direction::Right), Outcome::PUSHED | Outcome::SOLVED);
        assert!(game.is_solved());

        // push the only box back off its goal
        let mut game = parse_level("#####\n#@* #\n#####").unwrap();
        assert!(game.is_solved());
        assert_eq!(game.step(Direction::Right), Outcome::PUSHED);
        assert!(!game.is_solved());
        assert_eq!(game.empty_goals(), 1);
    }

    #[test]
    fn test_resolve_does_not_mutate() {
        let game = parse_level("#####\n#@$.#\n#####").unwrap();
        let before = game.clone();
        let mv = game.resolve(Direction::Right);
        assert_eq!(mv.outcome(), Outcome::PUSHED);
        assert_eq!(mv.direction(), Direction::Right);
        assert_eq!(mv.from(), (1, 1));
        assert_eq!(game, before);
    }

    #[test]
    fn test_preview_matches_commit() {
        let mut game = parse_level("######\n#@$. #\n# $. #\n######").unwrap();
        for dir in [
            Direction::Left,
            Direction::Down,
            Direction::Right,
            Direction::Up,
            Direction::Right,
        ] {
            let preview = game.resolve(dir).outcome();
            let committed = game.step(dir);
            assert_eq!(committed - Outcome::SOLVED, preview);
        }
    }

    #[test]
    fn test_stale_move_rejected() {
        let mut game = parse_level("######\n#@ $.#\n######").unwrap();
        let mv = game.resolve(Direction::Right);
        assert_eq!(game.step(Direction::Right), Outcome::STEPPED);
        let before = game.clone();
        assert_eq!(game.apply(mv), Outcome::BLOCKED);
        assert_eq!(game, before);
    }

    #[test]
    fn test_box_count_invariant() {
        let mut game = parse_level("######\n#@$. #\n# $. #\n######").unwrap();
        let count = game.box_count();
        for dir in [Direction::Right, Direction::Down, Direction::Right, Direction::Left] {
            game.step(dir);
            let boxes = (0..game.height() as u8)
                .flat_map(|y| (0..game.width() as u8).map(move |x| (x, y)))
                .filter(|&pos| game.get_cell(pos).has_box())
                .count();
            assert_eq!(boxes, count);
        }
    }
}
