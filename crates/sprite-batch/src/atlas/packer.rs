//! Rectangle bin packing.
//!
//! Pure functions over `(width, height)` sizes; no pixels, no IO.

/// Top-left corner assigned to one input size.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct FreeRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl FreeRect {
    #[inline]
    fn contains(&self, o: &FreeRect) -> bool {
        o.x >= self.x && o.y >= self.y && o.x + o.w <= self.x + self.w && o.y + o.h <= self.y + self.h
    }
}

/// Smallest power of two `>= v` (1 for 0).
#[inline]
pub fn next_power_of_two(v: u32) -> u32 {
    v.max(1).next_power_of_two()
}

/// First atlas side to try.
///
/// `ceil(sqrt(Σ (w + p)(h + p) × overhead))` rounded up to a power of two,
/// raised further when a single padded size would not fit.
pub fn estimate_side(sizes: &[(u32, u32)], padding: u32, overhead: f64) -> u32 {
    let area: u64 = sizes
        .iter()
        .map(|&(w, h)| (w + padding) as u64 * (h + padding) as u64)
        .sum();
    let min = (area as f64 * overhead).sqrt().ceil() as u32;
    let mut side = next_power_of_two(min);

    let largest = sizes.iter().map(|&(w, h)| w.max(h) + padding).max().unwrap_or(0);
    if side < largest {
        side = next_power_of_two(largest);
    }
    side
}

/// Packs `sizes` in the given order, doubling the side from `initial_side`
/// until everything fits or the side would exceed `max_side`.
///
/// Each size occupies `(w + padding) × (h + padding)`. Returns the final
/// side and one placement per input, in input order.
pub fn pack(
    sizes: &[(u32, u32)],
    padding: u32,
    initial_side: u32,
    max_side: u32,
) -> Option<(u32, Vec<Placement>)> {
    let mut side = initial_side.max(1);
    while side <= max_side {
        if let Some(placements) = try_pack(sizes, padding, side) {
            return Some((side, placements));
        }
        log::debug!("atlas side {side} too small, trying {}", side.saturating_mul(2));
        side = side.checked_mul(2)?;
    }
    None
}

/// One MaxRects pass at a fixed side: best short side fit, right/bottom split,
/// containment pruning.
fn try_pack(sizes: &[(u32, u32)], padding: u32, side: u32) -> Option<Vec<Placement>> {
    let mut free = vec![FreeRect { x: 0, y: 0, w: side, h: side }];
    let mut out = Vec::with_capacity(sizes.len());

    for &(w, h) in sizes {
        let (w, h) = (w + padding, h + padding);
        let best = find_best(&free, w, h)?;
        let used = free.remove(best);

        out.push(Placement { x: used.x, y: used.y });
        split(&mut free, used, w, h);
        prune(&mut free);
    }

    Some(out)
}

fn find_best(free: &[FreeRect], w: u32, h: u32) -> Option<usize> {
    let mut best = None;
    let mut best_fit = u32::MAX;

    for (i, r) in free.iter().enumerate() {
        if r.w >= w && r.h >= h {
            let fit = (r.w - w).min(r.h - h);
            if fit < best_fit {
                best = Some(i);
                best_fit = fit;
            }
        }
    }

    best
}

fn split(free: &mut Vec<FreeRect>, used: FreeRect, w: u32, h: u32) {
    if used.w > w {
        free.push(FreeRect { x: used.x + w, y: used.y, w: used.w - w, h });
    }
    if used.h > h {
        free.push(FreeRect { x: used.x, y: used.y + h, w: used.w, h: used.h - h });
    }
}

fn prune(free: &mut Vec<FreeRect>) {
    let mut i = 0;
    while i < free.len() {
        let contained = free
            .iter()
            .enumerate()
            .any(|(j, other)| j != i && other.contains(&free[i]));
        if contained {
            free.remove(i);
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: (Placement, (u32, u32)), b: (Placement, (u32, u32)), pad: u32) -> bool {
        let (pa, (aw, ah)) = a;
        let (pb, (bw, bh)) = b;
        pa.x < pb.x + bw + pad
            && pb.x < pa.x + aw + pad
            && pa.y < pb.y + bh + pad
            && pb.y < pa.y + ah + pad
    }

    fn assert_valid(sizes: &[(u32, u32)], pad: u32, side: u32, placements: &[Placement]) {
        assert_eq!(sizes.len(), placements.len());
        for (i, (&p, &(w, h))) in placements.iter().zip(sizes).enumerate() {
            assert!(p.x + w + pad <= side && p.y + h + pad <= side, "#{i} out of bounds");
            for j in (i + 1)..sizes.len() {
                assert!(
                    !overlaps((p, (w, h)), (placements[j], sizes[j]), pad),
                    "#{i} overlaps #{j}"
                );
            }
        }
    }

    #[test]
    fn next_power_of_two_rounds_up() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(34), 64);
        assert_eq!(next_power_of_two(64), 64);
        assert_eq!(next_power_of_two(65), 128);
    }

    #[test]
    fn estimate_for_small_set() {
        // (3·3 + 32·22 + 12·12) · 1.3 = 1114.1 → 34 → 64
        let sizes = [(1, 1), (30, 20), (10, 10)];
        assert_eq!(estimate_side(&sizes, 2, 1.3), 64);
    }

    #[test]
    fn estimate_is_raised_for_one_large_asset() {
        // Area alone suggests 64, but one side needs 300 + 2.
        let sizes = [(300, 1)];
        assert_eq!(estimate_side(&sizes, 2, 1.3), 512);
    }

    #[test]
    fn packs_small_set_without_overlap() {
        let sizes = [(30, 20), (10, 10), (1, 1)];
        let initial = estimate_side(&sizes, 2, 1.3);
        let (side, placements) = pack(&sizes, 2, initial, 8192).unwrap();
        assert_eq!(side, 64);
        assert_eq!(placements[0], Placement { x: 0, y: 0 });
        assert_valid(&sizes, 2, side, &placements);
    }

    #[test]
    fn doubles_until_everything_fits() {
        let sizes = [(10, 10); 4];
        let (side, placements) = pack(&sizes, 0, 16, 64).unwrap();
        assert_eq!(side, 32);
        assert_eq!(
            placements,
            vec![
                Placement { x: 0, y: 0 },
                Placement { x: 10, y: 0 },
                Placement { x: 20, y: 0 },
                Placement { x: 0, y: 10 },
            ]
        );
    }

    #[test]
    fn gives_up_past_max_side() {
        assert!(pack(&[(100, 100)], 0, 16, 64).is_none());
        assert!(pack(&[(10, 10)], 0, 128, 64).is_none());
    }

    #[test]
    fn many_mixed_sizes_never_overlap() {
        // Deterministic pseudo-random sizes.
        let mut seed = 0x2545_f491u32;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed
        };
        let mut sizes: Vec<(u32, u32)> = (0..200).map(|_| (1 + next() % 48, 1 + next() % 48)).collect();
        sizes.sort_by_key(|&(w, h)| std::cmp::Reverse(w as u64 * h as u64));

        let initial = estimate_side(&sizes, 2, 1.3);
        let (side, placements) = pack(&sizes, 2, initial, 8192).unwrap();
        assert!(side.is_power_of_two());
        assert_valid(&sizes, 2, side, &placements);
    }

    #[test]
    fn packing_is_deterministic() {
        let sizes = [(17, 5), (9, 9), (3, 30), (1, 1)];
        let a = pack(&sizes, 1, 16, 256).unwrap();
        let b = pack(&sizes, 1, 16, 256).unwrap();
        assert_eq!(a, b);
    }
}
