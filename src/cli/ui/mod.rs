pub mod prompts;
pub mod spinner;

pub use prompts::{confirm, is_interactive, password_or_prompt, text_or_prompt};
pub use spinner::{Spinner, with_spinner};
