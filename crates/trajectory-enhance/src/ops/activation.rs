//! Element-wise activation functions.

use serde::{Deserialize, Serialize};

/// Supported activation kinds.
///
/// The kind also selects the weight initialization scheme: ReLU-family
/// activations get He initialization, saturating ones get Xavier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    Relu,
    LeakyRelu,
    Gelu,
    Tanh,
    Sigmoid,
}

impl ActivationKind {
    /// True for the ReLU family (He initialization territory).
    #[must_use]
    pub fn is_rectified(self) -> bool {
        matches!(self, Self::Relu | Self::LeakyRelu | Self::Gelu)
    }
}

const LEAKY_SLOPE: f32 = 0.01;

/// GELU, tanh approximation.
fn gelu(x: f32) -> f32 {
    const SQRT_2_OVER_PI: f32 = 0.797_884_6;
    const COEFF: f32 = 0.044_715;
    0.5 * x * (1.0 + (SQRT_2_OVER_PI * (x + COEFF * x * x * x)).tanh())
}

/// Apply an activation function element-wise.
#[must_use]
pub fn apply_activation(v: &[f32], kind: ActivationKind) -> Vec<f32> {
    match kind {
        ActivationKind::Relu => v.iter().map(|&x| x.max(0.0)).collect(),
        ActivationKind::LeakyRelu => v
            .iter()
            .map(|&x| if x >= 0.0 { x } else { LEAKY_SLOPE * x })
            .collect(),
        ActivationKind::Gelu => v.iter().map(|&x| gelu(x)).collect(),
        ActivationKind::Tanh => v.iter().map(|&x| x.tanh()).collect(),
        ActivationKind::Sigmoid => v.iter().map(|&x| 1.0 / (1.0 + (-x).exp())).collect(),
    }
}
