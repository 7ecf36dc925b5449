// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The geometry cache: memoizes mesh materialization keyed by a 128-bit
//! fingerprint of a [`GeometryPlan`]'s canonical byte encoding, wrapping
//! [`crate::lru::LruCache`] behind a single mutex.

use std::sync::Mutex;

use shapescript_scene_port::{EngineError, GeometryEngine, GeometryKind, GeometryPlan, MeshSummary};

/// Default cost bound: a 1 GB equivalent, expressed here as a
/// polygon-count budget (the cost unit the evaluator actually supplies),
/// at a rough 64 bytes/polygon estimate.
const DEFAULT_COST_LIMIT: u64 = (1 << 30) / 64;

/// A 128-bit fingerprint of a [`GeometryPlan`]'s cacheable inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u128);

impl Fingerprint {
    /// Hashes `plan`'s canonical encoding with blake3, truncated to the
    /// first 16 bytes of the digest.
    #[must_use]
    pub fn of(plan: &GeometryPlan) -> Self {
        let bytes = canonical_encoding(plan);
        let digest = blake3::hash(&bytes);
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&digest.as_bytes()[..16]);
        Fingerprint(u128::from_le_bytes(buf))
    }
}

/// Encodes a plan's cacheable fields — *not* its transform, since the
/// cache key is built from type, transform-free parameters, children
/// fingerprints, detail, and smoothing — into a flat byte buffer
/// suitable for hashing. The encoding need not be human-readable, only
/// stable and collision-resistant for equal-vs-unequal plans.
fn canonical_encoding(plan: &GeometryPlan) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(plan.kind as u32).to_le_bytes());
    buf.extend_from_slice(&(plan.params.len() as u32).to_le_bytes());
    for param in &plan.params {
        buf.extend_from_slice(&param.to_bits().to_le_bytes());
    }
    buf.extend_from_slice(&plan.detail.to_le_bytes());
    match plan.smoothing {
        Some(s) => {
            buf.push(1);
            buf.extend_from_slice(&s.to_bits().to_le_bytes());
        }
        None => buf.push(0),
    }
    buf.extend_from_slice(&(plan.children.len() as u32).to_le_bytes());
    for child in &plan.children {
        buf.extend_from_slice(&child.to_le_bytes());
    }
    buf.extend_from_slice(&plan.material.color[0].to_bits().to_le_bytes());
    buf.extend_from_slice(&plan.material.color[1].to_bits().to_le_bytes());
    buf.extend_from_slice(&plan.material.color[2].to_bits().to_le_bytes());
    buf.extend_from_slice(&plan.material.color[3].to_bits().to_le_bytes());
    buf
}

/// Memoizes [`GeometryEngine::build`] results by plan fingerprint.
pub struct GeometryCache {
    entries: Mutex<crate::lru::LruCache<Fingerprint, MeshSummary>>,
}

impl GeometryCache {
    /// Builds a cache with the default bounds: unbounded count, ~1 GB
    /// equivalent cost.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(usize::MAX, DEFAULT_COST_LIMIT)
    }

    /// Builds a cache with explicit bounds.
    #[must_use]
    pub fn with_limits(count_limit: usize, cost_limit: u64) -> Self {
        Self { entries: Mutex::new(crate::lru::LruCache::new(count_limit, cost_limit)) }
    }

    /// Returns the cached mesh for `plan`'s fingerprint, or builds it via
    /// `engine`, inserting the result with a cost equal to its polygon
    /// count.
    pub fn get_or_build(&self, plan: &GeometryPlan, engine: &dyn GeometryEngine) -> Result<MeshSummary, EngineError> {
        let fingerprint = Fingerprint::of(plan);
        {
            let mut entries = self.entries.lock().expect("geometry cache mutex poisoned");
            if let Some(summary) = entries.get(&fingerprint) {
                return Ok(summary.clone());
            }
        }
        // The engine call happens with the lock released: holding the
        // cache lock across an external call would block every other
        // evaluation thread on one engine invocation.
        let summary = engine.build(plan)?;
        let cost = summary.polygon_count.max(1);
        let mut entries = self.entries.lock().expect("geometry cache mutex poisoned");
        entries.put(fingerprint, summary.clone(), cost);
        Ok(summary)
    }

    /// Drops every cached entry — invoked when a document closes or a
    /// global memory-pressure signal fires.
    pub fn on_pressure(&self) {
        self.entries.lock().expect("geometry cache mutex poisoned").clear();
    }

    /// The number of entries currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("geometry cache mutex poisoned").len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cost for CSG results that fold multiple children (`hull`,
/// `minkowski`, and the boolean operators): the produced mesh's own
/// polygon count, per the Open Question resolved in `SPEC_FULL.md` §13 —
/// not the sum of operand costs, since eviction should track what is
/// actually held in memory for re-use, not what it took to build.
#[must_use]
pub fn cost_for_kind(_kind: GeometryKind, summary: &MeshSummary) -> u64 {
    summary.polygon_count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapescript_geom::Bounds;
    use shapescript_scene_port::MaterialSpec;

    struct StubEngine;
    impl GeometryEngine for StubEngine {
        fn build(&self, _plan: &GeometryPlan) -> Result<MeshSummary, EngineError> {
            Ok(MeshSummary { bounds: Bounds::EMPTY, polygon_count: 12, watertight: true })
        }
    }

    fn sample_plan() -> GeometryPlan {
        GeometryPlan {
            kind: GeometryKind::Cube,
            params: vec![1.0, 1.0, 1.0],
            detail: 16,
            smoothing: None,
            children: vec![],
            material: MaterialSpec::default(),
        }
    }

    #[test]
    fn equal_plans_fingerprint_equal() {
        assert_eq!(Fingerprint::of(&sample_plan()), Fingerprint::of(&sample_plan()));
    }

    #[test]
    fn differing_params_fingerprint_differently() {
        let mut other = sample_plan();
        other.params[0] = 2.0;
        assert_ne!(Fingerprint::of(&sample_plan()), Fingerprint::of(&other));
    }

    #[test]
    fn second_build_is_served_from_cache() {
        let cache = GeometryCache::new();
        let plan = sample_plan();
        let first = cache.get_or_build(&plan, &StubEngine).unwrap();
        let second = cache.get_or_build(&plan, &StubEngine).unwrap();
        assert_eq!(first.polygon_count, second.polygon_count);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn pressure_clears_cache() {
        let cache = GeometryCache::new();
        cache.get_or_build(&sample_plan(), &StubEngine).unwrap();
        assert!(!cache.is_empty());
        cache.on_pressure();
        assert!(cache.is_empty());
    }
}
