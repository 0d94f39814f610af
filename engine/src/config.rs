/// Default target depth, in plies, for a search with no explicit depth limit.
const DEFAULT_DEPTH: u8 = 10;
/// Default cutoff below which a subtree's score is still worth caching.
const DEFAULT_MAX_TRANSPOSITION_DEPTH: u8 = 7;
/// Default count of moves per node searched at full depth before late moves
/// get reduced.
const DEFAULT_NUM_EARLY_MOVES: usize = 4;
/// Default node count between checks of the external search limit.
const DEFAULT_LIMIT_UPDATE_INCREMENT: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Tunables that shape a search without changing its correctness: how deep to
/// go, how much of the tree the transposition table covers, how many moves at
/// each node get a full-depth search before reductions kick in, and how often
/// the search checks in with its time/node limit.
pub struct SearchConfig {
    /// Target depth, in plies, for the iterative-deepening loop.
    pub depth: u8,
    /// Deepest ply at which the search still reads and writes the
    /// transposition table; below it, entries are too shallow to be useful.
    pub max_transposition_depth: u8,
    /// How many moves at each node are searched to full depth before late
    /// move reduction starts trimming the rest.
    pub num_early_moves: usize,
    /// How many nodes elapse between polls of the search limit; too low
    /// wastes cycles on the check, too high overshoots the limit.
    pub limit_update_increment: u64,
}

impl SearchConfig {
    #[must_use]
    /// Build a `SearchConfig` with the engine's default tuning.
    pub fn new() -> SearchConfig {
        SearchConfig {
            depth: DEFAULT_DEPTH,
            max_transposition_depth: DEFAULT_MAX_TRANSPOSITION_DEPTH,
            num_early_moves: DEFAULT_NUM_EARLY_MOVES,
            limit_update_increment: DEFAULT_LIMIT_UPDATE_INCREMENT,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig::new()
    }
}
