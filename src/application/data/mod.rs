mod listing_style;
mod log_level;

pub use listing_style::ListingStyle;
pub use log_level::LogLevel;
