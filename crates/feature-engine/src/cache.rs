//! Process-wide fitted artifact cache

use crate::fitter::{FittedArtifacts, TransformFitter};
use crate::FeatureError;
use data_prep::{CategoricalEncoder, OutlierFilter};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::info;

type BuildFn = dyn Fn() -> Result<FittedArtifacts, FeatureError> + Send + Sync;

/// Builds `FittedArtifacts` on first use and hands out the same instance
/// for the rest of the process lifetime.
///
/// Concurrent first callers run the build exactly once; the others wait
/// for it and receive the shared result. A failed build is not cached.
pub struct ArtifactCache {
    cell: OnceLock<Arc<FittedArtifacts>>,
    build_lock: Mutex<()>,
    builder: Box<BuildFn>,
}

impl ArtifactCache {
    /// Cache that runs `builder` on first access
    pub fn new<F>(builder: F) -> Self
    where
        F: Fn() -> Result<FittedArtifacts, FeatureError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            build_lock: Mutex::new(()),
            builder: Box::new(builder),
        }
    }

    /// Cache that fits from the dataset CSV on first access
    pub fn from_dataset(path: PathBuf, filter: OutlierFilter, fitter: TransformFitter) -> Self {
        let encoder = CategoricalEncoder::student_dataset();
        Self::new(move || {
            info!("Fitting transform artifacts from {}", path.display());
            fitter.fit_csv(&path, &filter, &encoder)
        })
    }

    /// Cache holding already-built artifacts
    pub fn prebuilt(artifacts: FittedArtifacts) -> Self {
        let cache = Self::new(|| {
            Err(FeatureError::Artifacts(
                "prebuilt artifact cache has no builder".to_string(),
            ))
        });
        let _ = cache.cell.set(Arc::new(artifacts));
        cache
    }

    /// Artifacts if already built
    pub fn get(&self) -> Option<Arc<FittedArtifacts>> {
        self.cell.get().cloned()
    }

    pub fn is_built(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the cached artifacts, building them on first call
    pub fn get_or_build(&self) -> Result<Arc<FittedArtifacts>, FeatureError> {
        if let Some(artifacts) = self.cell.get() {
            return Ok(Arc::clone(artifacts));
        }

        // The guarded value is (), so a poisoned lock carries no broken state
        let _guard = self.build_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(artifacts) = self.cell.get() {
            return Ok(Arc::clone(artifacts));
        }

        let artifacts = Arc::new((self.builder)()?);
        let _ = self.cell.set(Arc::clone(&artifacts));
        info!(
            "Artifact cache populated: {} classes, {} training rows",
            artifacts.class_names().len(),
            artifacts.training_rows()
        );
        Ok(artifacts)
    }
}

impl fmt::Debug for ArtifactCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactCache")
            .field("built", &self.is_built())
            .finish()
    }
}
