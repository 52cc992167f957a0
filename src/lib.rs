// Timegrid library
// Layout, pointer interaction and sync core for a day/week time-tracking grid

pub mod errors;
pub mod interaction;
pub mod models;
pub mod services;
pub mod utils;
