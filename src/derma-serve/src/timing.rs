use chrono::{DateTime, Utc};
use log::info;

/// Wall-clock timer that logs its duration when stopped.
pub struct Timer {
    name: String,
    started: DateTime<Utc>,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Timer {
            name: name.into(),
            started: Utc::now(),
        }
    }

    /// Log and return the elapsed milliseconds.
    pub fn stop(self) -> i64 {
        let elapsed = (Utc::now() - self.started).num_milliseconds();
        info!("{} took {} msec", self.name, elapsed);
        elapsed
    }
}
