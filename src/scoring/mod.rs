pub mod outcome;
pub mod policy;

pub use outcome::{classify, to_superscript, ClassifiedResult, Outcome, OutcomeHint};
pub use policy::{
    fastest_lap_bonus, paid_positions, points_for, points_for_position, points_table,
    race_points_multiplier, UNCLASSIFIED_POSITION,
};
