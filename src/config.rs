//! Compile-time options: the seed and well-known names the pipeline uses.

/// Fixed-but-configurable knobs for a single compilation.
///
/// A fresh [`Options`] is created per call to [`crate::driver::compile`] —
/// nothing here is process-wide static state.
#[derive(Debug, Clone)]
pub struct Options {
    /// Seeds the identifier mint. Fixed seed, fixed input order -> fixed
    /// output names.
    pub seed: u64,

    /// The host's continuation-pointer table, e.g. `global.event_ptrs`.
    pub event_ptr_table: String,

    /// The sentinel identifier recognized as an async boundary, e.g. `await`.
    pub await_name: String,

    /// The table that local variables are rewritten into, e.g. `global.locals`.
    pub locals_table: String,

    /// Whether the driver should additionally emit a Graphviz dot dump of the
    /// post-pipeline graph set.
    pub render_debug_graphs: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            seed: 0,
            event_ptr_table: "global.event_ptrs".to_string(),
            await_name: "await".to_string(),
            locals_table: "global.locals".to_string(),
            render_debug_graphs: false,
        }
    }
}

impl Options {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}
