use crate::config::CycleGuard;
use crate::reflect::TypeInfo;

/// Types currently being injected, outermost first
#[derive(Debug, Default, Clone)]
pub struct InjectionPath {
    pub types: Vec<&'static TypeInfo>,
}

impl InjectionPath {
    /// Create a new injection path
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// Enter a type
    pub fn push(&mut self, info: &'static TypeInfo) {
        self.types.push(info);
    }

    /// Leave the innermost type
    pub fn pop(&mut self) -> Option<&'static TypeInfo> {
        self.types.pop()
    }

    /// Check if the path contains a type (for cycle detection)
    pub fn contains(&self, info: &TypeInfo) -> bool {
        self.types.iter().any(|entry| entry.is(info))
    }

    /// Innermost type being injected
    pub fn current(&self) -> Option<&'static TypeInfo> {
        self.types.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.types.len()
    }

    /// Whether injection may descend into a value of type `info`
    pub fn allows(&self, info: &TypeInfo, guard: CycleGuard) -> bool {
        match guard {
            CycleGuard::Ancestry => !self.contains(info),
            CycleGuard::SelfOnly => self.current().map_or(true, |current| !current.is(info)),
        }
    }

    /// Get the path as a string for log messages
    pub fn path_string(&self) -> String {
        self.types
            .iter()
            .map(|info| info.name)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
