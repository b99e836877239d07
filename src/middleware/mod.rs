/// Middleware module
///
/// Request logging and visit counting.

mod hit_counter;
mod logger;

pub use hit_counter::CountHits;
pub use logger::RequestLogger;
