//! C1: propagation engines. Two backends behind one trait, selected per
//! request (`auto`/`geometric`/`analytic`) by the caller (`channel-service`).
//!
//! `AnalyticEngine` is the always-available fallback (free-space path loss
//! plus a flat indoor margin). `GeometricEngine` stands in for a ray-traced
//! or measured scene backend: no such backend ships here, so it only answers
//! once a trivial JSON override file has been loaded, and reports
//! `EngineUnavailable` otherwise. This mirrors the spec's own framing of the
//! geometric engine as a pluggable, possibly-absent collaborator.

use crate::error::ComputeError;
use channel_model::Position;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathResult {
    pub path_loss_db: f64,
    pub rms_delay_spread_ns: f64,
}

pub trait PropagationEngine: Send + Sync {
    /// Load (or re-load) a scene. Implementations reject a second load with
    /// `SceneReloadUnsupported` (spec: a scene, once loaded, is immutable for
    /// the engine's lifetime).
    fn load_scene(&mut self, scene_ref: &str) -> Result<(), ComputeError>;

    fn compute_path(&self, tx: Position, rx: Position) -> Result<PathResult, ComputeError>;

    /// Whether this engine's `path_loss_db` already folds in antenna gain,
    /// so callers must not add `g_tx`/`g_rx` again in the link budget.
    fn antenna_gain_embedded(&self) -> bool;

    fn is_loaded(&self) -> bool;
}

#[derive(Debug, Clone)]
struct Loaded {
    scene_ref: String,
}

/// Free-space path loss plus a fixed indoor clutter margin:
/// `PL_dB = 20*log10(d_m) + 20*log10(f_c_Hz) - 147.55 + indoor_loss_db`.
#[derive(Debug, Clone)]
pub struct AnalyticEngine {
    loaded: Option<Loaded>,
    frequency_hz: f64,
    indoor_loss_db: f64,
}

impl AnalyticEngine {
    pub fn new(frequency_hz: f64) -> Self {
        Self {
            loaded: None,
            frequency_hz,
            indoor_loss_db: 10.0,
        }
    }

    pub fn with_indoor_loss_db(mut self, indoor_loss_db: f64) -> Self {
        self.indoor_loss_db = indoor_loss_db;
        self
    }
}

impl PropagationEngine for AnalyticEngine {
    fn load_scene(&mut self, scene_ref: &str) -> Result<(), ComputeError> {
        if self.loaded.is_some() {
            return Err(ComputeError::SceneReloadUnsupported);
        }
        self.loaded = Some(Loaded {
            scene_ref: scene_ref.to_string(),
        });
        Ok(())
    }

    fn compute_path(&self, tx: Position, rx: Position) -> Result<PathResult, ComputeError> {
        if self.loaded.is_none() {
            return Err(ComputeError::SceneNotLoaded);
        }
        let distance_m = tx.distance(&rx).max(0.1);
        let path_loss_db = 20.0 * distance_m.log10() + 20.0 * self.frequency_hz.log10() - 147.55
            + self.indoor_loss_db;
        Ok(PathResult {
            path_loss_db,
            rms_delay_spread_ns: 0.0,
        })
    }

    fn antenna_gain_embedded(&self) -> bool {
        false
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }
}

/// A scene-driven engine. With no ray-tracer in this workspace, "loading a
/// scene" means reading a flat JSON map of `"tx|rx" -> path_loss_db` pairs;
/// anything not in the map, or no scene at all, is `EngineUnavailable`.
#[derive(Debug, Clone, Default)]
pub struct GeometricEngine {
    loaded: Option<Loaded>,
    overrides: HashMap<String, PathResult>,
}

impl GeometricEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a trivial override scene: JSON object of `"node_a|node_b" ->
    /// {"path_loss_db": ..., "rms_delay_spread_ns": ...}`. `tx`/`rx` in
    /// `compute_path` are positions, not node names, so callers key the
    /// override map by pre-resolved node-id pairs via [`GeometricEngine::key`].
    pub fn load_overrides(
        &mut self,
        scene_ref: &str,
        overrides: HashMap<String, PathResult>,
    ) -> Result<(), ComputeError> {
        if self.loaded.is_some() {
            return Err(ComputeError::SceneReloadUnsupported);
        }
        self.loaded = Some(Loaded {
            scene_ref: scene_ref.to_string(),
        });
        self.overrides = overrides;
        Ok(())
    }

    pub fn key(node_a: &str, node_b: &str) -> String {
        format!("{node_a}|{node_b}")
    }

    pub fn lookup(&self, key: &str) -> Result<PathResult, ComputeError> {
        if self.loaded.is_none() {
            return Err(ComputeError::EngineUnavailable(
                "no geometric scene loaded".to_string(),
            ));
        }
        self.overrides.get(key).copied().ok_or_else(|| {
            ComputeError::EngineUnavailable(format!("no override for link '{key}'"))
        })
    }
}

impl PropagationEngine for GeometricEngine {
    fn load_scene(&mut self, scene_ref: &str) -> Result<(), ComputeError> {
        self.load_overrides(scene_ref, HashMap::new())
    }

    fn compute_path(&self, _tx: Position, _rx: Position) -> Result<PathResult, ComputeError> {
        Err(ComputeError::EngineUnavailable(
            "GeometricEngine requires node-keyed lookup; use `lookup` with a resolved key"
                .to_string(),
        ))
    }

    fn antenna_gain_embedded(&self) -> bool {
        true
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analytic_requires_scene_load() {
        let engine = AnalyticEngine::new(5.18e9);
        let err = engine
            .compute_path(Position::origin(), Position::new(10.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, ComputeError::SceneNotLoaded));
    }

    #[test]
    fn analytic_rejects_second_load() {
        let mut engine = AnalyticEngine::new(5.18e9);
        engine.load_scene("scene.json").unwrap();
        let err = engine.load_scene("scene.json").unwrap_err();
        assert!(matches!(err, ComputeError::SceneReloadUnsupported));
    }

    #[test]
    fn analytic_path_loss_grows_with_distance() {
        let mut engine = AnalyticEngine::new(5.18e9).with_indoor_loss_db(0.0);
        engine.load_scene("scene.json").unwrap();
        let near = engine
            .compute_path(Position::origin(), Position::new(10.0, 0.0, 0.0))
            .unwrap();
        let far = engine
            .compute_path(Position::origin(), Position::new(100.0, 0.0, 0.0))
            .unwrap();
        assert!(far.path_loss_db > near.path_loss_db);
        // 10x distance -> +20 dB for free-space path loss.
        assert!((far.path_loss_db - near.path_loss_db - 20.0).abs() < 1e-6);
    }

    #[test]
    fn geometric_unavailable_without_scene() {
        let engine = GeometricEngine::new();
        let err = engine.lookup("a|b").unwrap_err();
        assert!(matches!(err, ComputeError::EngineUnavailable(_)));
    }

    #[test]
    fn geometric_returns_loaded_override() {
        let mut engine = GeometricEngine::new();
        let mut overrides = HashMap::new();
        overrides.insert(
            GeometricEngine::key("a", "b"),
            PathResult {
                path_loss_db: 72.0,
                rms_delay_spread_ns: 15.0,
            },
        );
        engine.load_overrides("scene.json", overrides).unwrap();
        let result = engine.lookup(&GeometricEngine::key("a", "b")).unwrap();
        assert_eq!(result.path_loss_db, 72.0);
    }
}
