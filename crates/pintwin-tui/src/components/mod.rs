//! UI panels making up the single console screen.

mod dashboard;
mod forms;
mod pin_grid;
mod status_bar;

pub use dashboard::Dashboard;
