use core::cmp::Ordering;

use super::RenderCommand;

/// Batch ordering for pool commands.
///
/// Ordering rules:
/// 1) `z`: ascending (back-to-front)
/// 2) `texture`: ascending, a tie-break that only serves batch contiguity
///
/// Commands with equal z but different textures may swap relative to
/// submission order. Commands with equal z and equal texture keep their
/// submission order when used with a stable sort.
#[inline]
pub fn batch_order(a: &RenderCommand, b: &RenderCommand) -> Ordering {
    match a.z.cmp(&b.z) {
        Ordering::Equal => a.texture.cmp(&b.texture),
        o => o,
    }
}
