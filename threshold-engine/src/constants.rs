//! Centralized tuning constants for the threshold engine.
//!
//! Trial counts, search caps and turn modelling live here so the math can
//! only change through reviewed code.

// Sampling -----------------------------------------------------------------
/// Monte Carlo trials for primary goal evaluation.
pub const DEFAULT_TRIALS: u32 = 50_000;
/// Monte Carlo trials per step of the recommendation search.
pub const RECOMMEND_TRIALS: u32 = 20_000;
/// Evaluation cache capacity before FIFO eviction.
pub const CACHE_CAPACITY: usize = 200;

// Turn model ---------------------------------------------------------------
/// Sites seen in the opening draw.
pub const OPENING_SITES: usize = 3;
/// Cost assumed for non-site cards that report none.
pub const DEFAULT_CARD_COST: u32 = 3;
pub const MIN_TARGET_TURN: u8 = 1;
pub const MAX_TARGET_TURN: u8 = 10;

// Targets and search -------------------------------------------------------
/// Default reliability target.
pub const DEFAULT_TARGET: f64 = 0.9;
/// Target presets offered to users.
pub const TARGET_PRESETS: [f64; 3] = [0.8, 0.9, 0.95];

/// Upper bound on added sources when searching single-element fixes.
pub const SINGLE_ELEMENT_ADD_CAP: u32 = 20;
/// Upper bound on total added sources for multi-element fixes.
pub const MULTI_ELEMENT_ADD_CAP: u32 = 10;

/// z-score of a two-sided 95% normal interval.
pub const Z_95: f64 = 1.96;
/// Trials between deadline checks in the simulation loop.
pub const DEADLINE_CHECK_INTERVAL: u32 = 1024;
