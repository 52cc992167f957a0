pub mod clock;
pub mod date;
pub mod logging;
pub mod time_math;
