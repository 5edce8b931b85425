pub mod api;
pub mod history_frame;
pub mod location;
pub mod units;
pub mod weather_record;
