//! Sokoban engine: XSB level parsing, move resolution, undoable move
//! histories, solution storage and the level catalog contract.

pub mod bits;
pub mod catalog;
pub mod error;
pub mod game;
pub mod history;
pub mod levels;
pub mod logging;
pub mod moves;
pub mod rle;
pub mod session;
pub mod store;

pub use error::{Error, Result};
pub use game::{Cell, Direction, Fingerprint, Game, Position};
pub use history::{History, Score};
pub use levels::LevelSet;
pub use moves::{Move, Outcome};
pub use session::{Playback, Session};
pub use store::{FileStore, MemoryStore, SolutionStore};
