pub mod direction;
pub mod grid;
pub mod player;
pub mod rules;
pub mod tile;
