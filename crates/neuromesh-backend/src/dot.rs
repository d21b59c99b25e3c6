//! Dot-product strategies: a scalar reference implementation and a
//! SIMD-accelerated one built on `wide`. Both must be numerically equivalent
//! to within the tolerance checked in `tests::scalar_and_simd_agree`.

use wide::f32x8;

/// A strategy for computing `sum(a[i] * b[i])` over equal-length slices.
/// Implementations are stateless and `Send + Sync` so a single backend
/// instance can serve concurrent callers.
pub trait DotProduct: Send + Sync + Default {
    /// Name used in logs and diagnostics.
    const NAME: &'static str;

    /// Computes the dot product of `a` and `b`. Panics if lengths differ;
    /// callers are expected to have already validated shapes.
    fn dot(a: &[f32], b: &[f32]) -> f32;
}

/// Plain scalar loop, used when no SIMD path is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarDot;

impl DotProduct for ScalarDot {
    const NAME: &'static str = "scalar";

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }
}

/// 8-wide SIMD lanes via `wide::f32x8`, with a scalar tail for the remainder.
#[derive(Debug, Default, Clone, Copy)]
pub struct WideDot;

impl DotProduct for WideDot {
    const NAME: &'static str = "simd";

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        let chunks = a.len() / 8;
        let mut acc = f32x8::ZERO;
        for i in 0..chunks {
            let va = f32x8::from(<[f32; 8]>::try_from(&a[i * 8..i * 8 + 8]).unwrap());
            let vb = f32x8::from(<[f32; 8]>::try_from(&b[i * 8..i * 8 + 8]).unwrap());
            acc += va * vb;
        }
        let mut total: f32 = acc.to_array().iter().sum();
        for i in chunks * 8..a.len() {
            total += a[i] * b[i];
        }
        total
    }
}

/// Detects whether the SIMD path should be preferred on this host.
///
/// `wide` emulates its vector types everywhere, so this is an optimization
/// hint rather than a correctness gate: x86_64 hosts are probed for AVX2,
/// every other architecture is assumed to benefit from the wide path too.
#[must_use]
pub fn simd_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::is_x86_feature_detected!("avx2")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_and_simd_agree() {
        let a: Vec<f32> = (0..37).map(|i| i as f32 * 0.5).collect();
        let b: Vec<f32> = (0..37).map(|i| (37 - i) as f32 * 0.25).collect();
        let scalar = ScalarDot::dot(&a, &b);
        let simd = WideDot::dot(&a, &b);
        assert!((scalar - simd).abs() < 1e-3, "{scalar} vs {simd}");
    }
}
