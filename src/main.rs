use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use log::{info, warn};

use sokoban::catalog::{self, DirTransport};
use sokoban::game::Direction;
use sokoban::logging::{init_log, level_from_flags};
use sokoban::store::attach_best_known;
use sokoban::{
    Error, FileStore, Game, LevelSet, MemoryStore, Playback, Result, Score, Session, SolutionStore,
};

#[derive(Parser)]
#[command(name = "sokoban")]
#[command(about = "Play and manage Sokoban levels", long_about = None)]
struct Args {
    /// Directory holding saved solutions
    #[arg(long, global = true, value_name = "DIR", env = "SOKOBAN_STORE")]
    store_dir: Option<PathBuf>,

    /// More log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the levels of a file with their best known scores
    Levels {
        /// Path to the levels file (XSB format)
        #[arg(value_name = "FILE")]
        levels_file: PathBuf,
    },

    /// Play moves on a level and record the solution if it gets solved
    Play {
        #[arg(value_name = "FILE")]
        levels_file: PathBuf,

        /// Level number to play (1-indexed)
        #[arg(value_name = "LEVEL")]
        level_num: usize,

        /// Moves to make: u/d/l/r with optional counts, `z` undoes one move
        #[arg(value_name = "MOVES", default_value = "")]
        moves: String,

        /// Replay this solution string instead of free moves
        #[arg(short, long, conflicts_with = "moves")]
        solution: Option<String>,

        /// Play back the best known solution
        #[arg(short = 'k', long, conflicts_with_all = ["moves", "solution"])]
        known: bool,

        /// Continue from the autosave slot
        #[arg(short, long)]
        restore: bool,

        /// Write the history to the autosave slot afterwards
        #[arg(short, long)]
        autosave: bool,

        /// Print the board after every move
        #[arg(short, long)]
        print_steps: bool,
    },

    /// Print a level with its best known solution in XSB format
    Export {
        #[arg(value_name = "FILE")]
        levels_file: PathBuf,

        #[arg(value_name = "LEVEL")]
        level_num: usize,

        /// Print the autosaved position and its moves instead
        #[arg(short, long)]
        progress: bool,
    },

    /// Browse a mirrored level catalog
    Catalog {
        /// Directory containing index.txt and the level files it lists
        #[arg(value_name = "DIR")]
        mirror: PathBuf,

        /// Fetch and list the levels of entry N (1-indexed)
        #[arg(short, long, value_name = "N")]
        fetch: Option<usize>,
    },
}

enum Input {
    Moves(String),
    Solution(String),
    Known,
}

struct PlayOpts {
    level_num: usize,
    input: Input,
    restore: bool,
    autosave: bool,
    print_steps: bool,
}

fn open_store(store_dir: Option<PathBuf>) -> Box<dyn SolutionStore> {
    match store_dir.or_else(FileStore::default_location) {
        Some(dir) => {
            info!("using solution store {}", dir.display());
            Box::new(FileStore::new(dir))
        }
        None => {
            warn!("no data directory available, solutions will not be kept");
            Box::new(MemoryStore::new())
        }
    }
}

fn load_levels(path: &Path, store: &dyn SolutionStore) -> Result<LevelSet> {
    let mut levels = LevelSet::from_file(path)?;
    for (ordinal, err) in levels.rejected() {
        eprintln!("skipped level block #{}: {}", ordinal + 1, err);
    }
    attach_best_known(store, levels.levels_mut());
    Ok(levels)
}

fn pick_level(levels: &LevelSet, level_num: usize) -> &Game {
    match level_num.checked_sub(1).and_then(|i| levels.get(i)) {
        Some(game) => game,
        None => {
            eprintln!(
                "Error: level {} not found (file contains {} levels)",
                level_num,
                levels.len()
            );
            process::exit(1);
        }
    }
}

fn best_score(game: &Game) -> String {
    match game.known_solution().map(Score::of) {
        Some(Ok(score)) => score.to_string(),
        Some(Err(_)) => "?".to_string(),
        None => "-".to_string(),
    }
}

fn list_levels(levels: &LevelSet) {
    if let Some(title) = levels.title() {
        println!("{}", title);
    }
    for game in levels {
        println!(
            "level: {:<3}  id: {}  size: {:>2}x{:<2}  boxes: {:<3}  best: {:<10}  {}",
            game.index() + 1,
            game.fingerprint(),
            game.width(),
            game.height(),
            game.box_count(),
            best_score(game),
            game.title().unwrap_or("")
        );
    }
    println!("---");
    let next = match levels.first_unsolved() {
        Some(index) => format!("next unsolved: {}", index + 1),
        None => "all solved".to_string(),
    };
    println!(
        "solved: {:>3}/{:<3}  rejected: {}  {}",
        levels.solved_count(),
        levels.len(),
        levels.rejected().len(),
        next
    );
}

fn print_progress(session: &Session, label: &str) {
    let history = session.history();
    println!(
        "{} (moves: {}, pushes: {}):\n{}",
        label,
        history.move_count(),
        history.push_count(),
        session.game()
    );
}

fn play_moves(session: &mut Session, moves: &str, print_steps: bool) -> Result<()> {
    for (position, ch) in sokoban::rle::decompress_strict(moves)?.chars().enumerate() {
        if ch == 'z' || ch == 'Z' {
            session.undo()?;
            if print_steps {
                print_progress(session, "Undo");
            }
            continue;
        }
        let Some((dir, _)) = Direction::from_symbol(ch) else {
            return Err(Error::InvalidSolutionSyntax {
                position,
                found: Some(ch),
            });
        };
        let outcome = session.push_move(dir);
        if print_steps {
            print_progress(session, &format!("{} {:?}", dir, outcome));
        }
    }
    Ok(())
}

fn play_back(session: &mut Session, mut playback: Playback, print_steps: bool) -> Result<()> {
    while let Some(outcome) = session.advance(&mut playback)? {
        if print_steps {
            print_progress(session, &format!("{:?} ({} left)", outcome, playback.remaining()));
        }
    }
    Ok(())
}

fn play_level(levels: &LevelSet, opts: PlayOpts, store: &mut dyn SolutionStore) -> Result<()> {
    let game = pick_level(levels, opts.level_num);
    let mut session = Session::new(game.clone());

    if opts.restore && session.restore_progress(store)? {
        print_progress(&session, "Restored");
    }

    match opts.input {
        Input::Moves(moves) => play_moves(&mut session, &moves, opts.print_steps)?,
        Input::Solution(solution) => {
            let playback = session.play_solution(&solution)?;
            play_back(&mut session, playback, opts.print_steps)?;
        }
        Input::Known => {
            let Some(playback) = session.play_known_solution() else {
                println!("level {} has no known solution", opts.level_num);
                return Ok(());
            };
            play_back(&mut session, playback?, opts.print_steps)?;
        }
    }

    print_progress(&session, &format!("Level {}", opts.level_num));
    println!("history: {}", session.history().to_compressed());

    if session.is_solved() {
        if session.record_solution(store)? {
            println!("solved! new best {}", session.history().score());
        } else {
            println!("solved! best stays {}", best_score(session.level()));
        }
    }
    if opts.autosave {
        session.save_progress(store)?;
    }
    Ok(())
}

fn browse_catalog(mirror: PathBuf, fetch: Option<usize>) -> Result<()> {
    let transport = DirTransport::new(mirror);
    let catalog = catalog::fetch_catalog(&transport)?;

    match fetch {
        None => {
            for (i, entry) in catalog.entries().iter().enumerate() {
                println!(
                    "{:<4} {:<24} {:<32} {:<20} {}",
                    i + 1,
                    entry.path,
                    entry.title,
                    entry.author,
                    entry.description
                );
            }
        }
        Some(n) => {
            let Some(entry) = n.checked_sub(1).and_then(|i| catalog.get(i)) else {
                eprintln!("Error: catalog has {} entries", catalog.len());
                process::exit(1);
            };
            let levels = catalog::fetch_level(&transport, entry)?;
            list_levels(&levels);
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut store = open_store(args.store_dir);

    match args.command {
        Command::Levels { levels_file } => {
            let levels = load_levels(&levels_file, &*store)?;
            list_levels(&levels);
        }
        Command::Play {
            levels_file,
            level_num,
            moves,
            solution,
            known,
            restore,
            autosave,
            print_steps,
        } => {
            let levels = load_levels(&levels_file, &*store)?;
            let input = match (solution, known) {
                (Some(solution), _) => Input::Solution(solution),
                (None, true) => Input::Known,
                (None, false) => Input::Moves(moves),
            };
            let opts = PlayOpts {
                level_num,
                input,
                restore,
                autosave,
                print_steps,
            };
            play_level(&levels, opts, &mut *store)?;
        }
        Command::Export {
            levels_file,
            level_num,
            progress,
        } => {
            let levels = load_levels(&levels_file, &*store)?;
            let mut session = Session::new(pick_level(&levels, level_num).clone());
            if progress {
                session.restore_progress(&*store)?;
                print!("{}", session.snapshot_progress());
            } else {
                print!("{}", session.snapshot());
            }
        }
        Command::Catalog { mirror, fetch } => browse_catalog(mirror, fetch)?,
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_log(level_from_flags(args.verbose, args.quiet)) {
        eprintln!("Error initialising logging: {}", e);
    }

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
