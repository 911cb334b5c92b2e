pub mod play;
pub mod style;

pub use play::run_play;
