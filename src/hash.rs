//! Counter-based deterministic randomness.
//!
//! A draw is a pure function of `(seed, index)` (plus a lane when one item
//! needs several independent numbers), so a sampling decision does not
//! depend on chunk boundaries or on which worker sees the point. Each seed
//! selects a splitmix64 sequence and `index` seeks straight to its position.

const GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;
/// Odd constant separating lanes of the same item
const LANE_STEP: u64 = 0xd1b5_4a32_d192_ed03;

/// splitmix64 output finalizer
#[inline(always)]
fn finalize(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Top 53 bits as a uniform float in [0, 1)
#[inline(always)]
fn unit(bits: u64) -> f64 {
    (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Raw 64-bit output at position `index` of the stream for `seed`
#[inline(always)]
pub fn bits(seed: u64, index: u64) -> u64 {
    let origin = finalize(seed ^ GAMMA);
    finalize(origin.wrapping_add(index.wrapping_add(1).wrapping_mul(GAMMA)))
}

/// Uniform draw in [0, 1) for item `index` of a stream sampled with `seed`
#[inline(always)]
pub fn draw(seed: u64, index: u64) -> f64 {
    unit(bits(seed, index))
}

/// Independent draw number `lane` for item `index`; lane 0 equals [`draw`]
#[inline(always)]
pub fn draw_lane(seed: u64, index: u64, lane: u64) -> f64 {
    unit(bits(seed ^ lane.wrapping_mul(LANE_STEP), index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_is_pure() {
        assert_eq!(draw(42, 7), draw(42, 7));
        assert_ne!(draw(42, 7), draw(43, 7));
        assert_ne!(draw(42, 7), draw(42, 8));
    }

    #[test]
    fn test_draw_in_unit_interval() {
        for i in 0..10_000 {
            let v = draw(1, i);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_draw_roughly_uniform() {
        let below_half = (0..10_000).filter(|&i| draw(42, i) < 0.5).count();
        assert!((4_700..5_300).contains(&below_half), "got {below_half}");
    }

    #[test]
    fn test_lanes_are_independent() {
        assert_eq!(draw_lane(9, 3, 0), draw(9, 3));
        assert_ne!(draw_lane(9, 3, 1), draw_lane(9, 3, 2));
        let both_low = (0..10_000)
            .filter(|&i| draw_lane(5, i, 1) < 0.5 && draw_lane(5, i, 2) < 0.5)
            .count();
        assert!((2_300..2_700).contains(&both_low), "got {both_low}");
    }
}
