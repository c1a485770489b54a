use dark_std::sync::SyncVec;

/// Drops records at the front door, before fan-out to sinks.
pub trait Filter: Send + Sync {
    /// true means the record is rejected
    fn filter(&self, module: &str) -> bool;
}

pub struct NoFilter {}

impl Filter for NoFilter {
    fn filter(&self, _module: &str) -> bool {
        false
    }
}

/// Rejects records originating from the listed module prefixes.
pub struct ModuleFilter {
    pub modules: SyncVec<String>,
}

impl ModuleFilter {
    pub fn new() -> ModuleFilter {
        Self {
            modules: SyncVec::new(),
        }
    }
}

impl Filter for ModuleFilter {
    fn filter(&self, module: &str) -> bool {
        for x in self.modules.iter() {
            if module.starts_with(x.as_str()) {
                return true;
            }
        }
        false
    }
}
