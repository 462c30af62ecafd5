//! Display labels supplied by the embedding application.

/// Provides localized labels the registry cannot derive from stored data.
pub trait GroupLabels: Send + Sync {
    /// Name shown for the main group, regardless of its stored names.
    fn main_group_label(&self) -> String;
}

/// Labels fixed at construction time (e.g. read from configuration).
#[derive(Debug, Clone)]
pub struct StaticLabels {
    main_group: String,
}

impl StaticLabels {
    pub fn new(main_group: impl Into<String>) -> Self {
        Self {
            main_group: main_group.into(),
        }
    }
}

impl Default for StaticLabels {
    fn default() -> Self {
        Self::new("Connected devices")
    }
}

impl GroupLabels for StaticLabels {
    fn main_group_label(&self) -> String {
        self.main_group.clone()
    }
}
