use serde::{Deserialize, Serialize};

/// The operator-configured gateway every route is expected to target
/// (§6, "Gateway & identity wiring": "their defaults are documented but
/// overridable").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub gateway_name: String,
    pub gateway_namespace: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            gateway_name: "maas-gateway".to_owned(),
            gateway_namespace: "maas-system".to_owned(),
        }
    }
}
