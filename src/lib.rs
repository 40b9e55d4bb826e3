//! Real-time multiplayer session layer for Makao.
//!
//! The crate is organized leaves-first:
//!
//! - [`cards`]: immutable card model, deck construction, shuffling
//! - [`game`]: Makao rules state machine and per-viewer state rendering
//! - [`table`]: one room's membership, seating, operator, and fan-out scope
//! - [`lobby`]: process-wide presence registry and table directory
//! - [`protocol`]: client/server wire messages
//! - [`hosting`]: HTTP server, WebSocket bridging, identity resolution
//!
//! All lobby, table, and engine mutations run on a single lobby task: each
//! inbound command executes to completion before the next one is processed.

pub mod cards;
pub mod game;
pub mod hosting;
pub mod lobby;
pub mod protocol;
pub mod table;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Seat index at a table (0-based playing position).
pub type Seat = usize;
/// Table identifier, allocated from [`TABLE_ID_BASE`] upward.
pub type TableId = u64;
/// Per-connection identifier, unique for the process lifetime.
pub type ConnId = u64;

// ============================================================================
// TABLE & LOBBY CONFIGURATION
// ============================================================================
/// Number of seats at every table. Membership is unbounded; seating is not.
pub const SEATS: usize = 4;
/// First table id handed out; allocation fills the smallest gap above it.
pub const TABLE_ID_BASE: TableId = 100;
/// How long a fully-disconnected user keeps their membership and seat.
pub const GRACE_PERIOD: std::time::Duration = std::time::Duration::from_secs(5);

// ============================================================================
// GAME CONFIGURATION
// ============================================================================
/// Cards dealt to every occupied seat when a game starts.
pub const HAND_SIZE: usize = 5;
/// Whether the full deck carries the two jokers.
pub const JOKERS: bool = true;
/// Forced-draw penalty added by playing a Two.
pub const DRAW_PENALTY_TWO: usize = 2;
/// Forced-draw penalty added by playing a Three.
pub const DRAW_PENALTY_THREE: usize = 3;
/// Forced-draw penalty added by playing the King of Hearts or Spades.
pub const DRAW_PENALTY_KING: usize = 5;
/// How many plays an Ace's suit demand stays in force.
pub const SUIT_DEMAND_TURNS: usize = 1;
/// How many plays a Jack's rank demand stays in force.
pub const RANK_DEMAND_TURNS: usize = 2;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
