//! Run-scoped generated test data
//!
//! Values are derived from one millisecond timestamp taken when the run
//! starts. Each is generated on first use and stays fixed for the rest of the
//! run, so a later step can check for the exact name an earlier step typed.

use chrono::Utc;

#[derive(Debug, Clone)]
pub struct Scratch {
    max_app_name_length: usize,
    stamp: i64,
    app_name: Option<String>,
    env_key: Option<String>,
    env_value: Option<String>,
}

impl Scratch {
    pub fn new(max_app_name_length: usize) -> Self {
        Self::with_stamp(max_app_name_length, Utc::now().timestamp_millis())
    }

    pub fn with_stamp(max_app_name_length: usize, stamp: i64) -> Self {
        Self {
            max_app_name_length,
            stamp,
            app_name: None,
            env_key: None,
            env_value: None,
        }
    }

    /// Name for the launched example app, at most `max_app_name_length` chars
    pub fn app_name(&mut self) -> &str {
        let (stamp, max) = (self.stamp, self.max_app_name_length);
        self.app_name.get_or_insert_with(|| {
            format!("example-app-{}", stamp).chars().take(max).collect()
        })
    }

    pub fn env_key(&mut self) -> &str {
        let stamp = self.stamp;
        self.env_key.get_or_insert_with(|| format!("TEST_{}", stamp))
    }

    pub fn env_value(&mut self) -> &str {
        let stamp = self.stamp;
        self.env_value.get_or_insert_with(|| stamp.to_string())
    }

    /// App name, if a step has generated it
    pub fn generated_app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_from_stamp() {
        let mut scratch = Scratch::with_stamp(30, 1_400_000_000_000);
        assert_eq!(scratch.app_name(), "example-app-1400000000000");
        assert_eq!(scratch.env_key(), "TEST_1400000000000");
        assert_eq!(scratch.env_value(), "1400000000000");
    }

    #[test]
    fn test_app_name_truncated() {
        let mut scratch = Scratch::with_stamp(16, 1_400_000_000_000);
        assert_eq!(scratch.app_name(), "example-app-1400");
    }

    #[test]
    fn test_values_stable_once_generated() {
        let mut scratch = Scratch::new(30);
        assert!(scratch.generated_app_name().is_none());
        let first = scratch.app_name().to_string();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_eq!(scratch.app_name(), first);
        assert_eq!(scratch.generated_app_name(), Some(first.as_str()));
        let key = scratch.env_key().to_string();
        assert_eq!(scratch.env_key(), key);
    }
}
