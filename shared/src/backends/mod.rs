mod native;

pub use native::{instant::Instant, timer::Timer};
