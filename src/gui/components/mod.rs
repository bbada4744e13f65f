pub mod dialogs;
pub mod nav_bar;

pub use dialogs::{confirm_ui, notice_ui, Notice, PathAction, PathDialog, PathPurpose};
pub use nav_bar::{nav_ui, Presentation};
