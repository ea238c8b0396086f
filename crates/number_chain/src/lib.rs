mod board;
pub use board::*;

mod config;
pub use config::*;

mod direction;
pub use direction::*;

mod error;
pub use error::*;

mod game;
pub use game::*;

mod graph;
pub use graph::*;

mod merge;
pub use merge::*;

mod presentation;
pub use presentation::*;

mod selection;
pub use selection::*;

mod spawner;
pub use spawner::*;

mod topology;
pub use topology::*;

mod value;
pub use value::*;

pub mod plugin;
pub use plugin::NumberChainPlugin;
