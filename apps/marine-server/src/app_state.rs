use std::path::PathBuf;
use std::sync::Arc;

use marine_kernel::Kernel;

#[derive(Clone)]
pub(crate) struct AppState {
    kernel: Kernel,
    sql_candidates: Arc<Vec<PathBuf>>,
    endpoints: Arc<Vec<String>>,
    endpoints_meta: Arc<Vec<serde_json::Value>>,
}

impl AppState {
    pub fn new(
        kernel: Kernel,
        sql_candidates: Vec<PathBuf>,
        endpoints: Vec<String>,
        endpoints_meta: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            kernel,
            sql_candidates: Arc::new(sql_candidates),
            endpoints: Arc::new(endpoints),
            endpoints_meta: Arc::new(endpoints_meta),
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Configured initialisation scripts, in search order.
    pub fn sql_candidates(&self) -> &[PathBuf] {
        &self.sql_candidates
    }

    pub fn endpoints(&self) -> Arc<Vec<String>> {
        self.endpoints.clone()
    }

    pub fn endpoints_meta(&self) -> Arc<Vec<serde_json::Value>> {
        self.endpoints_meta.clone()
    }
}
