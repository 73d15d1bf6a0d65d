//! Environment Probe: a single process-wide flag reporting whether this
//! process is running in the cloud environment or locally. Every other
//! component consults this once, at construction time, to choose its
//! backend; the flag itself is never re-read after startup.

/// Snapshot of the `RUNNING_IN_CLOUD` decision, taken once from
/// [`common::Config`] and handed to every component that needs to pick a
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentProbe {
    running_in_cloud: bool,
}

impl EnvironmentProbe {
    #[must_use]
    pub fn new(running_in_cloud: bool) -> Self {
        Self { running_in_cloud }
    }

    #[must_use]
    pub fn is_cloud(&self) -> bool {
        self.running_in_cloud
    }
}

impl From<&common::Config> for EnvironmentProbe {
    fn from(config: &common::Config) -> Self {
        Self::new(config.running_in_cloud)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_the_flag_it_was_built_with() {
        assert!(EnvironmentProbe::new(true).is_cloud());
        assert!(!EnvironmentProbe::new(false).is_cloud());
    }
}
