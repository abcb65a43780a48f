//! User level curve.
//!
//! Levels 1-5 use hand-tuned thresholds; from level 6 on every level costs a
//! flat 400 XP.

/// Experience floors of levels 1 through 6
const FLOORS: [u64; 6] = [0, 100, 250, 450, 700, 1000];
const LINEAR_START: u64 = 1000;
const LINEAR_STEP: u64 = 400;
const LINEAR_FIRST_LEVEL: u32 = 6;

/// Level for a cumulative experience total
pub fn level_for_total_exp(total_exp: u64) -> u32 {
    if total_exp >= LINEAR_START {
        let steps = u32::try_from((total_exp - LINEAR_START) / LINEAR_STEP).unwrap_or(u32::MAX);
        return LINEAR_FIRST_LEVEL.saturating_add(steps);
    }
    FLOORS.iter().take_while(|&&floor| floor <= total_exp).count() as u32
}

/// Cumulative experience at which `level` starts
///
/// Levels below 1 are treated as level 1.
pub fn exp_floor_for_level(level: u32) -> u64 {
    match level {
        0 | 1 => 0,
        2..=6 => FLOORS[(level - 1) as usize],
        _ => LINEAR_START + u64::from(level - LINEAR_FIRST_LEVEL) * LINEAR_STEP,
    }
}

/// Cumulative experience at which `level` ends (the next level's floor)
pub fn exp_ceil_for_level(level: u32) -> u64 {
    exp_floor_for_level(level.max(1).saturating_add(1))
}

/// Fraction of the way from the current level's floor to its ceiling
pub fn level_progress(total_exp: u64) -> f64 {
    let level = level_for_total_exp(total_exp);
    let floor = exp_floor_for_level(level);
    let ceil = exp_ceil_for_level(level);
    if ceil <= floor {
        return 1.0;
    }
    (total_exp.saturating_sub(floor)) as f64 / (ceil - floor) as f64
}
