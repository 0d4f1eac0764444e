use anyhow::{Context, Result};
use clap::Parser;
use salmon_bot::board::STARTPOS;
use salmon_bot::config::{MAX_DEPTH, TIME_THRESHOLD_MS};
use salmon_bot::{Board, GameState, Search, SearchConfig, TurnTimer};

#[derive(Parser, Debug)]
#[command(name = "salmon-bot")]
#[command(about = "Picks chess moves with a time-bounded iterative-deepening search")]
struct Args {
    /// Starting position in FEN
    #[arg(short, long, default_value = STARTPOS)]
    fen: String,

    /// Moves to play from the starting position first, e.g. "e2e4 e7e5"
    #[arg(short, long, default_value = "")]
    moves: String,

    /// Time budget per move in milliseconds
    #[arg(short, long, default_value_t = TIME_THRESHOLD_MS)]
    budget_ms: u64,

    /// Exclusive upper bound on the search depth
    #[arg(short = 'd', long, default_value_t = MAX_DEPTH)]
    max_depth: usize,

    /// Number of moves the bot plays before exiting
    #[arg(short, long, default_value_t = 1)]
    plies: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut board = Board::from_fen(&args.fen).context("invalid --fen")?;
    for text in args.moves.split_whitespace() {
        let mv = board
            .parse_move(text)
            .with_context(|| format!("cannot play {text:?} from {}", board.to_fen()))?;
        board.make_move(mv);
    }

    let mut search = Search::new(SearchConfig {
        max_depth: args.max_depth,
        time_threshold_ms: args.budget_ms,
        ..SearchConfig::default()
    });
    let mut timer = TurnTimer::new();

    println!("{board}\n");
    for _ in 0..args.plies {
        if board.game_state() != GameState::Ongoing {
            break;
        }

        timer.reset();
        let report = search.think(&mut board, &timer)?;
        println!(
            "{} score {} depth {} nodes {}",
            report.best_move, report.score, report.depth, report.nodes
        );
        board.make_move(report.best_move);
    }

    println!("\n{board}\n{}", board.to_fen());
    match board.game_state() {
        GameState::Ongoing => {}
        state => println!("{state:?}"),
    }
    Ok(())
}
