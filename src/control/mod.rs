mod debounce;
mod keyboard;

#[cfg(test)]
mod tests;

pub use debounce::KeyDebouncer;
pub use keyboard::{filter_key, map_key, KeyAction, KeyboardControl};
