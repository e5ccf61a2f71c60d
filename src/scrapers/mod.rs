pub mod eveil_spirituel;

pub use eveil_spirituel::{CalendarSource, EventParser};
