// Engine core: toroidal board plus alpha-beta search with a chance layer.
pub mod board;
pub mod perft;
pub mod search;
