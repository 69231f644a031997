/// Slidepath: a sliding-tile path puzzle on a wrap-around grid.
///
/// `domain` holds the pure data model and rules, `sim` the stateful
/// board, the movement engine, events and level loading.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
