//! SipHash-2-4 specialized to the kernel's `siphash_3u32(a, b, c, key)`.
//!
//! Only the three-word form is needed here — packets are sharded into
//! buckets by `siphash3u32(dst, src, proto, k1, k2) mod B`. Two compression
//! rounds run per 8-byte block, four run at finalization; the output is
//! `v0 ^ v1 ^ v2 ^ v3`. See <https://www.aumasson.jp/siphash/siphash.pdf>.

const C0: u64 = 0x736f_6d65_7073_6575;
const C1: u64 = 0x646f_7261_6e64_6f6d;
const C2: u64 = 0x6c79_6765_6e65_7261;
const C3: u64 = 0x7465_6462_7974_6573;

macro_rules! sipround {
    ($v0:expr, $v1:expr, $v2:expr, $v3:expr) => {{
        $v0 = $v0.wrapping_add($v1);
        $v1 = $v1.rotate_left(13);
        $v1 ^= $v0;
        $v0 = $v0.rotate_left(32);
        $v2 = $v2.wrapping_add($v3);
        $v3 = $v3.rotate_left(16);
        $v3 ^= $v2;
        $v0 = $v0.wrapping_add($v3);
        $v3 = $v3.rotate_left(21);
        $v3 ^= $v0;
        $v2 = $v2.wrapping_add($v1);
        $v1 = $v1.rotate_left(17);
        $v1 ^= $v2;
        $v2 = $v2.rotate_left(32);
    }};
}

/// SipHash-2-4 over three 32-bit words, keyed by `(k0, k1)`.
///
/// `a` and `b` pack into the first 8-byte block as `(b << 32) | a`; the
/// final block is `(12 << 56) | c` (12 = 3 inputs × 4 bytes), matching the
/// Linux kernel's `siphash_3u32`.
pub fn siphash3u32(a: u32, b: u32, c: u32, k0: u64, k1: u64) -> u64 {
    let mut v0 = C0 ^ k0;
    let mut v1 = C1 ^ k1;
    let mut v2 = C2 ^ k0;
    let mut v3 = C3 ^ k1;

    let m0 = ((b as u64) << 32) | (a as u64);
    v3 ^= m0;
    sipround!(v0, v1, v2, v3);
    sipround!(v0, v1, v2, v3);
    v0 ^= m0;

    let m1 = (12u64 << 56) | (c as u64);
    v3 ^= m1;
    sipround!(v0, v1, v2, v3);
    sipround!(v0, v1, v2, v3);
    v0 ^= m1;

    v2 ^= 0xff;
    sipround!(v0, v1, v2, v3);
    sipround!(v0, v1, v2, v3);
    sipround!(v0, v1, v2, v3);
    sipround!(v0, v1, v2, v3);

    (v0 ^ v1) ^ (v2 ^ v3)
}

/// `siphash3u32(dst, src, proto, k1, k2) mod bucket_count`, the sharding
/// function shared by every per-bucket method.
pub fn bucket_index(dst: u32, src: u32, proto: u32, k1: u64, k2: u64, bucket_count: usize) -> usize {
    (siphash3u32(dst, src, proto, k1, k2) % bucket_count as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Known-answer vectors for `siphash3u32` under the canonical SipHash
    /// test key (bytes `0x00..=0x0f`, the key used throughout the Aumasson
    /// reference implementation and its test suite). Independently
    /// recomputed from the algorithm in this module's doc comment — word
    /// packing, 2 compression rounds, 4 finalization rounds — rather than
    /// asserted against this file's own output, so a regression in the
    /// round/constant sequence here would actually be caught.
    #[test]
    fn matches_reference_vectors_under_the_canonical_test_key() {
        let k0 = 0x0706_0504_0302_0100;
        let k1 = 0x0f0e_0d0c_0b0a_0908;
        assert_eq!(siphash3u32(0, 0, 0, k0, k1), 0xcda0_1f60_ffc8_5be6);
        assert_eq!(
            siphash3u32(0x4142_4344, 0x4546_4748, 0x494a_4b4c, k0, k1),
            0xe753_f14f_506c_291b
        );
        assert_eq!(siphash3u32(1, 2, 3, 0, 0), 0x165d_1284_4002_0c85);
    }

    #[test]
    fn deterministic_for_same_inputs_and_key() {
        let a = siphash3u32(1, 2, 3, 0x0001_0203_0405_0607, 0x1011_1213_1415_1617);
        let b = siphash3u32(1, 2, 3, 0x0001_0203_0405_0607, 0x1011_1213_1415_1617);
        assert_eq!(a, b);
    }

    #[test]
    fn sensitive_to_each_input_word() {
        let k0 = 0x0001_0203_0405_0607;
        let k1 = 0x1011_1213_1415_1617;
        let base = siphash3u32(1, 2, 3, k0, k1);
        assert_ne!(base, siphash3u32(2, 2, 3, k0, k1));
        assert_ne!(base, siphash3u32(1, 3, 3, k0, k1));
        assert_ne!(base, siphash3u32(1, 2, 4, k0, k1));
    }

    #[test]
    fn sensitive_to_key() {
        let base = siphash3u32(1, 2, 3, 0, 0);
        assert_ne!(base, siphash3u32(1, 2, 3, 1, 0));
        assert_ne!(base, siphash3u32(1, 2, 3, 0, 1));
    }

    #[test]
    fn bucket_index_is_in_range() {
        let k0 = 0xdead_beef_cafe_babe;
        let k1 = 0x1234_5678_9abc_def0;
        for i in 0..10_000u32 {
            let idx = bucket_index(i, i.wrapping_mul(7), i % 17, k0, k1, 37);
            assert!(idx < 37);
        }
    }

    #[test]
    fn distributes_across_buckets() {
        // Not a statistical test — just checks a fuzzed input set doesn't
        // collapse onto a single bucket, which would indicate a broken mix.
        let k0 = 0x1111_2222_3333_4444;
        let k1 = 0x5555_6666_7777_8888;
        let mut seen = std::collections::HashSet::new();
        for i in 0..1000u32 {
            seen.insert(bucket_index(i, i ^ 0xabcd, i.wrapping_add(3), k0, k1, 16));
        }
        assert!(seen.len() > 1);
    }
}
