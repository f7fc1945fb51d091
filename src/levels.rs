use arrayvec::ArrayVec;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

use crate::bits::Bitboard;
use crate::error::{Error, Result};
use crate::game::{ALL_DIRECTIONS, Cell, Fingerprint, Game, MAX_SIZE, Position};
use crate::rle;

/// Symbols that may appear on a grid row, counts and row separators included.
const ROW_SYMBOLS: &str = "#@+$*.-_ |0123456789";


/// An ordered collection of Sokoban levels in XSB format.
#[derive(Debug)]
pub struct LevelSet {
    title: Option<String>,
    levels: Vec<Game>,
    rejected: Vec<(usize, Error)>,
}

impl LevelSet {
    /// Parse XSB-formatted Sokoban levels from a string.
    ///
    /// The format uses:
    /// - Standard Sokoban characters (#, @, +, $, *, ., space, - and _ for floor)
    /// - Optional run-length counts and `|` row separators inside a row
    /// - Blank lines or comment lines between levels
    ///
    /// The first comment line of the source becomes the set title and the last
    /// comment line before a level becomes that level's title. Levels that fail
    /// validation are skipped and reported by [`LevelSet::rejected`].
    pub fn from_text(contents: &str) -> Result<Self> {
        let mut set = LevelSet {
            title: None,
            levels: Vec::new(),
            rejected: Vec::new(),
        };
        let mut block: Vec<&str> = Vec::new();
        let mut block_title: Option<String> = None;
        let mut last_comment: Option<String> = None;
        let mut ordinal = 0;

        for line in contents.lines() {
            let line = line.trim_end();

            if is_grid_row(line) {
                if block.is_empty() {
                    block_title = last_comment.take();
                }
                block.push(line);
                continue;
            }

            // Anything else ends the current level
            if !block.is_empty() {
                set.add_block(ordinal, &block, block_title.take());
                ordinal += 1;
                block.clear();
            }

            if let Some(comment) = comment_text(line) {
                if set.title.is_none() && set.levels.is_empty() && set.rejected.is_empty() {
                    set.title = Some(comment);
                    last_comment = None;
                } else {
                    last_comment = Some(comment);
                }
            }
        }

        // Don't forget the last level if file doesn't end with empty line
        if !block.is_empty() {
            set.add_block(ordinal, &block, block_title.take());
        }

        if set.levels.is_empty() {
            return Err(Error::NoLevelsLoaded {
                rejected: set.rejected.len(),
            });
        }

        info!(
            "loaded {} levels ({} rejected) {:?}",
            set.levels.len(),
            set.rejected.len(),
            set.title.as_deref().unwrap_or("")
        );
        Ok(set)
    }

    /// Parse levels from raw bytes such as an embedded asset or a fetched body.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_text(&String::from_utf8_lossy(bytes))
    }

    /// Parse XSB-formatted Sokoban levels from a text file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    fn add_block(&mut self, ordinal: usize, block: &[&str], title: Option<String>) {
        match parse_level(&block.join("\n")) {
            Ok(mut game) => {
                game.set_index(self.levels.len());
                game.set_title(title);
                debug!(
                    "level {} [{}] is {}x{}",
                    self.levels.len() + 1,
                    game.fingerprint(),
                    game.width(),
                    game.height()
                );
                self.levels.push(game);
            }
            Err(err) => {
                warn!("skipping level block #{}: {}", ordinal + 1, err);
                self.rejected.push((ordinal, err));
            }
        }
    }

    /// Title of the whole set, taken from its first comment line.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&Game> {
        self.levels.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Game> {
        self.levels.get_mut(index)
    }

    /// Get the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Game> {
        self.levels.iter()
    }

    pub fn levels_mut(&mut self) -> &mut [Game] {
        &mut self.levels
    }

    /// Blocks that failed to parse, by their ordinal among all blocks.
    pub fn rejected(&self) -> &[(usize, Error)] {
        &self.rejected
    }

    pub fn solved_count(&self) -> usize {
        self.levels
            .iter()
            .filter(|game| game.known_solution().is_some())
            .count()
    }

    /// Index of the first level without a known solution.
    pub fn first_unsolved(&self) -> Option<usize> {
        self.levels
            .iter()
            .position(|game| game.known_solution().is_none())
    }

    /// Number of levels open for play when at most `max_unsolved` unsolved
    /// levels may be visible at once.
    pub fn unlocked_count(&self, max_unsolved: usize) -> usize {
        let mut unsolved = 0;
        for (index, game) in self.levels.iter().enumerate() {
            if game.known_solution().is_none() {
                unsolved += 1;
                if unsolved > max_unsolved {
                    return index;
                }
            }
        }
        self.levels.len()
    }

    /// True if `index` is the only level still lacking a solution.
    pub fn is_last_unsolved(&self, index: usize) -> bool {
        match self.levels.get(index) {
            Some(game) if game.known_solution().is_none() => self
                .levels
                .iter()
                .enumerate()
                .all(|(i, other)| i == index || other.known_solution().is_some()),
            _ => false,
        }
    }
}

impl<'a> IntoIterator for &'a LevelSet {
    type Item = &'a Game;
    type IntoIter = std::slice::Iter<'a, Game>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A grid row holds only row symbols, at least one wall, and no count left
/// dangling at its end. Anything else, such as a `#1` or `*****` title, is a
/// comment.
fn is_grid_row(line: &str) -> bool {
    line.contains('#')
        && line.chars().all(|ch| ROW_SYMBOLS.contains(ch))
        && rle::decompress_strict(line).is_ok()
}

fn comment_text(line: &str) -> Option<String> {
    let text = line.trim().trim_start_matches(';').trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Expand run-length counts and `|` separators into plain rows with trailing
/// blanks removed. Leading and trailing empty rows are dropped.
fn expand_rows(text: &str) -> Vec<String> {
    let mut rows: Vec<String> = text
        .lines()
        .flat_map(|line| {
            rle::decompress(line.trim_end())
                .split('|')
                .map(|row| row.trim_end().to_string())
                .collect::<Vec<_>>()
        })
        .collect();

    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }
    let leading = rows.iter().take_while(|row| row.is_empty()).count();
    rows.drain(..leading);
    rows
}

/// Text the fingerprint is computed over: explicit floor symbols become
/// blanks, trailing blanks are trimmed and rows are joined with `\n`.
fn normalize(rows: &[String]) -> String {
    rows.iter()
        .map(|row| row.replace(['-', '_'], " ").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a single Sokoban level from text.
///
/// Characters:
/// - `#` = Wall
/// - ` ` = Blank; floor only when reachable from the player
/// - `-`, `_` = Floor
/// - `.` = Goal
/// - `$` = Box
/// - `*` = Box on goal
/// - `@` = Player
/// - `+` = Player on goal
pub fn parse_level(text: &str) -> Result<Game> {
    let rows = expand_rows(text);

    let height = rows.len();
    let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);

    if width > MAX_SIZE || height > MAX_SIZE {
        return Err(Error::LevelTooLarge { width, height });
    }
    if width == 0 {
        return Err(Error::EmptyLevel);
    }

    let mut cells = [[Cell::empty(); MAX_SIZE]; MAX_SIZE];
    let mut players: Vec<Position> = Vec::new();
    let mut boxes = 0;
    let mut goals = 0;

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            cells[y][x] = match ch {
                '#' => Cell::WALL,
                ' ' => Cell::empty(),
                '-' | '_' => Cell::FLOOR,
                '.' => {
                    goals += 1;
                    Cell::FLOOR | Cell::GOAL
                }
                '$' => {
                    boxes += 1;
                    Cell::FLOOR | Cell::BOX
                }
                '*' => {
                    boxes += 1;
                    goals += 1;
                    Cell::FLOOR | Cell::GOAL | Cell::BOX
                }
                '@' => {
                    players.push((x as u8, y as u8));
                    Cell::FLOOR
                }
                '+' => {
                    goals += 1;
                    players.push((x as u8, y as u8));
                    Cell::FLOOR | Cell::GOAL
                }
                _ => return Err(Error::InvalidSymbol { symbol: ch, x, y }),
            };
        }
    }

    let player = match players.as_slice() {
        [player] => *player,
        _ => return Err(Error::PlayerCount(players.len())),
    };

    // Validate that the number of goals matches the number of boxes
    if boxes != goals {
        return Err(Error::UnbalancedLevel { boxes, goals });
    }
    if boxes == 0 {
        return Err(Error::EmptyLevel);
    }

    mark_floor(&mut cells, player, width, height);

    let fingerprint = Fingerprint::of_text(&normalize(&rows));
    Ok(Game::new(
        cells,
        width as u8,
        height as u8,
        player,
        fingerprint,
    ))
}

/// Flood-fill from the player through every non-wall cell, marking it floor.
/// Blanks the player can never reach stay outside the playfield.
fn mark_floor(
    cells: &mut [[Cell; MAX_SIZE]; MAX_SIZE],
    player: Position,
    width: usize,
    height: usize,
) {
    let mut stack: ArrayVec<Position, { MAX_SIZE * MAX_SIZE }> = ArrayVec::new();
    let mut visited = Bitboard::new();

    stack.push(player);
    visited.set(player);

    while let Some((x, y)) = stack.pop() {
        cells[y as usize][x as usize].insert(Cell::FLOOR);

        for dir in ALL_DIRECTIONS {
            let (dx, dy) = dir.delta();
            let nx = x as i32 + dx as i32;
            let ny = y as i32 + dy as i32;
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                continue;
            }
            let next = (nx as u8, ny as u8);
            if !cells[ny as usize][nx as usize].is_wall() && visited.insert(next) {
                stack.push(next);
            }
        }
    }
}
