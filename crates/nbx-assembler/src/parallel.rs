use nbx_bundle::Slot;
use rayon::prelude::*;

use crate::error::AssemblyResult;

/// Apply `f` to every slot, in parallel when `parallel` is set.
///
/// Results keep slot order. The first error wins and the remaining results
/// are discarded.
pub(crate) fn map_slots<T, F>(slots: &[Slot], parallel: bool, f: F) -> AssemblyResult<Vec<T>>
where
    T: Send,
    F: Fn(&Slot) -> AssemblyResult<T> + Send + Sync,
{
    if parallel {
        slots.par_iter().map(f).collect()
    } else {
        slots.iter().map(f).collect()
    }
}
