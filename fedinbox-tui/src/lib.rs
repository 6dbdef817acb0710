mod feeders;
mod keys;
mod styles;
mod tui;
mod view;

pub use feeders::spawn_tui_feeders;
pub use keys::{Action, action_for};
pub use tui::{InboxTui, TuiMsg, run_inbox};
pub use view::{ViewSnap, draw};
