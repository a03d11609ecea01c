pub mod layout;
mod palette;
mod quiz;
mod screen;

pub use layout::calculate_quiz_chunks;
pub use palette::{parse_hex, Palette};
pub use quiz::{draw_quit_confirmation, draw_quiz};
pub use screen::{capitalize, OptionMark, OptionView, Screen, Status};
