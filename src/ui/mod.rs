//! Terminal UI: a single window with the contact form on the left and the
//! live-filtered results on the right.

pub mod app;
pub mod draw;
pub mod edit;
pub mod panes;
