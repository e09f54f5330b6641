use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::renderer::MeshPassType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchingSettings {
    /// Size of the pass refresh pool. Zero means one worker per pass kind.
    #[serde(default)]
    pub worker_threads: usize,
    /// Upload only dirty objects while they make up less than this fraction
    /// of the object table.
    #[serde(default = "BatchingSettings::default_partial_upload_ratio")]
    pub partial_upload_ratio: f32,
    #[serde(default = "BatchingSettings::default_initial_object_capacity")]
    pub initial_object_capacity: usize,
}

impl Default for BatchingSettings {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            partial_upload_ratio: Self::default_partial_upload_ratio(),
            initial_object_capacity: Self::default_initial_object_capacity(),
        }
    }
}

impl BatchingSettings {
    pub fn load() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            info!("Using default batching settings for WebAssembly build");
            return Self::default();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::load_from_path("batching.json")
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<BatchingSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded batching settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default batching settings.",
                        path, err
                    );
                    BatchingSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Batching settings file {:?} not found. Using default settings.",
                    path
                );
                BatchingSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default batching settings.",
                    path, err
                );
                BatchingSettings::default()
            }
        }
    }

    pub fn validate(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.partial_upload_ratio) {
            warn!(
                "Partial upload ratio {} is outside [0, 1]. Using default value.",
                self.partial_upload_ratio
            );
            self.partial_upload_ratio = Self::default_partial_upload_ratio();
        }

        self
    }

    /// Number of threads the refresh pool is built with.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            MeshPassType::COUNT
        } else {
            self.worker_threads
        }
    }

    const fn default_partial_upload_ratio() -> f32 {
        0.8
    }

    const fn default_initial_object_capacity() -> usize {
        1024
    }
}
