/// Per-call options.
///
/// Carried by value into every manager call rather than stored on the
/// manager, so concurrent callers never see each other's mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    /// Serve from storage only. No adapter is ever called.
    pub offline: bool,
    /// Skip freshness checks and fetch, falling back to storage on failure.
    pub force_refresh: bool,
}
impl Context {
    pub fn online() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self { offline: true, ..Self::default() }
    }

    pub fn with_force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}
