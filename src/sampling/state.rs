use serde::{Deserialize, Serialize};

/// Sampler lifecycle. `Cancelled` is terminal: a cancelled sampler is
/// rebuilt, never restarted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SamplerStatus {
    #[default]
    Idle,
    Running,
    Cancelled,
}
