use bitflags::bitflags;
use std::fmt;

pub const MAX_SIZE: usize = 64;

/// Grid coordinates as (x, y).
pub type Position = (u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    pub fn delta(&self) -> (i8, i8) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Solution-string symbol: lowercase for a step, uppercase for a push.
    pub fn symbol(&self, push: bool) -> char {
        let ch = match self {
            Direction::Up => 'u',
            Direction::Down => 'd',
            Direction::Left => 'l',
            Direction::Right => 'r',
        };
        if push { ch.to_ascii_uppercase() } else { ch }
    }

    /// Inverse of [`Direction::symbol`].
    pub fn from_symbol(ch: char) -> Option<(Direction, bool)> {
        let direction = match ch.to_ascii_lowercase() {
            'u' => Direction::Up,
            'd' => Direction::Down,
            'l' => Direction::Left,
            'r' => Direction::Right,
            _ => return None,
        };
        Some((direction, ch.is_ascii_uppercase()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

bitflags! {
    /// Contents of one grid cell. An empty set is a blank outside the playfield.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Cell: u8 {
        const FLOOR = 1;
        const WALL = 1 << 1;
        const GOAL = 1 << 2;
        const BOX = 1 << 3;
    }
}

impl Cell {
    pub fn is_wall(self) -> bool {
        self.contains(Cell::WALL)
    }

    pub fn has_box(self) -> bool {
        self.contains(Cell::BOX)
    }

    pub fn is_goal(self) -> bool {
        self.contains(Cell::GOAL)
    }

    /// Floor without a box: the player may step here.
    pub fn is_free(self) -> bool {
        self.contains(Cell::FLOOR) && !self.intersects(Cell::WALL | Cell::BOX)
    }
}

/// CRC-32 of a level's normalized text, used as its identity in the solution store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(pub u32);

impl Fingerprint {
    pub fn of_text(normalized: &str) -> Self {
        Fingerprint(crc32fast::hash(normalized.as_bytes()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    cells: [[Cell; MAX_SIZE]; MAX_SIZE],
    width: u8,
    height: u8,
    player: Position,
    box_count: u16,
    empty_goals: u16,
    index: usize,
    title: Option<String>,
    fingerprint: Fingerprint,
    known_solution: Option<String>,
}

impl Game {
    /// Assemble a validated level. The parser guarantees the player stands on
    /// floor and that boxes and goals balance.
    pub(crate) fn new(
        cells: [[Cell; MAX_SIZE]; MAX_SIZE],
        width: u8,
        height: u8,
        player: Position,
        fingerprint: Fingerprint,
    ) -> Self {
        let mut box_count = 0;
        let mut empty_goals = 0;
        for row in cells.iter().take(height as usize) {
            for cell in row.iter().take(width as usize) {
                if cell.has_box() {
                    box_count += 1;
                }
                if cell.is_goal() && !cell.has_box() {
                    empty_goals += 1;
                }
            }
        }

        Game {
            cells,
            width,
            height,
            player,
            box_count,
            empty_goals,
            index: 0,
            title: None,
            fingerprint,
            known_solution: None,
        }
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub fn player_pos(&self) -> Position {
        self.player
    }

    pub fn get_cell(&self, pos: Position) -> Cell {
        self.cells[pos.1 as usize][pos.0 as usize]
    }

    /// Ordinal position within the level set.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Best stored solution for this level, run-length compressed.
    pub fn known_solution(&self) -> Option<&str> {
        self.known_solution.as_deref()
    }

    pub fn set_known_solution(&mut self, solution: Option<String>) {
        self.known_solution = solution;
    }

    pub fn box_count(&self) -> usize {
        self.box_count as usize
    }

    pub fn empty_goals(&self) -> usize {
        self.empty_goals as usize
    }

    /// Check if all boxes are on goals (win condition)
    pub fn is_solved(&self) -> bool {
        self.empty_goals == 0
    }

    /// Move from `pos` in the given direction.
    /// Returns the new position if it is within bounds, None otherwise.
    pub fn move_position(&self, pos: Position, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.delta();
        let new_x = pos.0 as i32 + dx as i32;
        let new_y = pos.1 as i32 + dy as i32;

        if new_x >= 0 && new_y >= 0 && new_x < self.width as i32 && new_y < self.height as i32 {
            Some((new_x as u8, new_y as u8))
        } else {
            None
        }
    }

    pub(crate) fn set_player_pos(&mut self, pos: Position) {
        self.player = pos;
    }

    /// Move the box at `from` to `to`, keeping the empty-goal count current.
    pub(crate) fn move_box(&mut self, from: Position, to: Position) {
        let source = self.get_cell(from);
        let dest = self.get_cell(to);
        debug_assert!(source.has_box() && dest.is_free());

        if source.is_goal() {
            self.empty_goals += 1;
        }
        if dest.is_goal() {
            self.empty_goals -= 1;
        }
        self.cells[from.1 as usize][from.0 as usize].remove(Cell::BOX);
        self.cells[to.1 as usize][to.0 as usize].insert(Cell::BOX);
    }

    /// XSB text of the current position headed by the level id, with the
    /// given solution appended as comment lines.
    pub fn snapshot(&self, solution: Option<&str>) -> String {
        let mut out = format!("; Level id: {:X}\n\n{}\n", self.fingerprint.0, self);
        match solution {
            Some(solution) if !solution.is_empty() => {
                out.push_str("; Solution\n; ");
                out.push_str(solution);
                out.push('\n');
            }
            _ => out.push_str("; No solution available\n"),
        }
        out
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            let mut line = String::new();
            for x in 0..self.width {
                let cell = self.get_cell((x, y));

                let ch = if cell.is_wall() {
                    '#'
                } else if (x, y) == self.player {
                    if cell.is_goal() { '+' } else { '@' }
                } else if cell.has_box() {
                    if cell.is_goal() { '*' } else { '$' }
                } else if cell.is_goal() {
                    '.'
                } else {
                    ' '
                };
                line.push(ch);
            }
            // Trim trailing spaces to match the input format
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::parse_level;

    #[test]
    fn test_direction_symbols() {
        for dir in ALL_DIRECTIONS {
            assert_eq!(Direction::from_symbol(dir.symbol(false)), Some((dir, false)));
            assert_eq!(Direction::from_symbol(dir.symbol(true)), Some((dir, true)));
        }
        assert_eq!(Direction::Left.symbol(true), 'L');
        assert_eq!(Direction::from_symbol('x'), None);
        assert_eq!(Direction::from_symbol('3'), None);
    }

    #[test]
    fn test_cell_flags() {
        let floor = Cell::FLOOR;
        assert!(floor.is_free());
        assert!(!(Cell::FLOOR | Cell::BOX).is_free());
        assert!(!Cell::WALL.is_free());
        assert!(!Cell::empty().is_free());
        assert!((Cell::FLOOR | Cell::GOAL).is_free());
        assert!((Cell::FLOOR | Cell::GOAL | Cell::BOX).has_box());
    }

    #[test]
    fn test_move_position_bounds() {
        let game = parse_level("#####\n#@$.#\n#####").unwrap();
        assert_eq!(game.move_position((0, 0), Direction::Up), None);
        assert_eq!(game.move_position((0, 0), Direction::Left), None);
        assert_eq!(game.move_position((4, 2), Direction::Right), None);
        assert_eq!(game.move_position((4, 2), Direction::Down), None);
        assert_eq!(game.move_position((1, 1), Direction::Right), Some((2, 1)));
    }

    #[test]
    fn test_display() {
        let input = "####\n\
                     # .#\n\
                     #  ###\n\
                     #*@  #\n\
                     #  $ #\n\
                     #  ###\n\
                     ####";
        let game = parse_level(input).unwrap();
        let output = game.to_string();
        assert_eq!(output.trim_end(), input);
    }

    #[test]
    fn test_counts() {
        let game = parse_level("######\n#@*.$#\n######").unwrap();
        assert_eq!(game.box_count(), 2);
        assert_eq!(game.empty_goals(), 1);
        assert!(!game.is_solved());
    }

    #[test]
    fn test_move_box_tracks_goals() {
        let mut game = parse_level("######\n#@*. #\n#  $ #\n######").unwrap();
        assert_eq!(game.empty_goals(), 1);

        game.move_box((2, 1), (4, 1));
        assert_eq!(game.empty_goals(), 2);

        game.move_box((3, 2), (3, 1));
        assert_eq!(game.empty_goals(), 1);
        assert!(game.get_cell((3, 1)).has_box());
        assert!(!game.get_cell((3, 2)).has_box());
    }

    #[test]
    fn test_snapshot() {
        let game = parse_level("#####\n#@$.#\n#####").unwrap();
        let id = format!("{:X}", game.fingerprint().0);

        let snap = game.snapshot(Some("R"));
        assert_eq!(
            snap,
            format!("; Level id: {}\n\n#####\n#@$.#\n#####\n\n; Solution\n; R\n", id)
        );

        let snap = game.snapshot(None);
        assert!(snap.ends_with("#####\n\n; No solution available\n"));
        assert_eq!(game.snapshot(Some("")), snap);
    }

    #[test]
    fn test_fingerprint_display() {
        assert_eq!(Fingerprint(0xBEEF).to_string(), "0000BEEF");
    }
}
