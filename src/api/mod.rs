// Presentation-facing surface: display records and process bootstrap.

pub mod simple;
pub mod viewer_api;
