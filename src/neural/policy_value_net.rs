use tch::{nn, TchError, Tensor};

use crate::neural::manager::NeuralConfig;
use crate::neural::res_net_block::ResNetBlock;

/// Two-headed network: shared conv trunk, policy logits and a tanh value.
///
/// ```text
/// conv3×3 -> BN -> ReLU -> [ResNetBlock × n] -> flatten -> fc -> ReLU
///                                                           ├─ policy (ACTION_SIZE logits)
///                                                           └─ value  (1, tanh)
/// ```
pub struct PolicyValueNet {
    stem_conv: nn::Conv2D,
    stem_bn: nn::BatchNorm,
    res_blocks: Vec<ResNetBlock>,
    fc: nn::Linear,
    policy_head: nn::Linear,
    value_head: nn::Linear,
}

impl PolicyValueNet {
    pub fn new(vs: &nn::VarStore, config: &NeuralConfig) -> Result<Self, TchError> {
        let p = vs.root();
        let (channels, height, width) = config.input_dim;

        let stem_conv = nn::conv2d(
            &p / "stem_conv",
            channels,
            config.filters,
            3,
            nn::ConvConfig {
                padding: 1,
                ..Default::default()
            },
        );
        let stem_bn = nn::batch_norm2d(&p / "stem_bn", config.filters, Default::default());

        let res_blocks = (0..config.num_res_blocks)
            .map(|idx| ResNetBlock::new_path(&(&p / format!("res_block_{idx}")), config.filters))
            .collect();

        // Padding 1 keeps the board size through the trunk
        let flatten_size = config.filters * height * width;
        log::debug!(
            "🔧 PolicyValueNet flatten_size: {} (filters={}, height={}, width={})",
            flatten_size,
            config.filters,
            height,
            width
        );
        let fc = nn::linear(&p / "fc", flatten_size, config.hidden, Default::default());
        let policy_head = nn::linear(&p / "policy_head", config.hidden, config.action_size, Default::default());
        let value_head = nn::linear(&p / "value_head", config.hidden, 1, Default::default());

        initialize_weights(vs)?;

        Ok(Self {
            stem_conv,
            stem_bn,
            res_blocks,
            fc,
            policy_head,
            value_head,
        })
    }

    /// Returns `(policy_logits [B, A], value [B, 1])`.
    pub fn forward_t(&self, x: &Tensor, train: bool) -> (Tensor, Tensor) {
        let mut h = x.apply(&self.stem_conv).apply_t(&self.stem_bn, train).relu();
        for block in &self.res_blocks {
            h = block.forward(&h, train);
        }
        let h = h.flatten(1, -1).apply(&self.fc).relu();

        let logits = h.apply(&self.policy_head);
        let value = h.apply(&self.value_head).tanh();
        (logits, value)
    }
}

/// Xavier-uniform weights for conv/linear layers, zero biases.
/// BatchNorm scales and running statistics keep their defaults.
pub fn initialize_weights(vs: &nn::VarStore) -> Result<(), TchError> {
    tch::no_grad(|| {
        for (name, mut param) in vs.variables() {
            let size = param.size();
            match size.len() {
                4 => {
                    let fan_in = (size[1] * size[2] * size[3]) as f64;
                    let fan_out = (size[0] * size[2] * size[3]) as f64;
                    let bound = (6.0 / (fan_in + fan_out)).sqrt();
                    param.f_uniform_(-bound, bound)?;
                }
                2 => {
                    let bound = (6.0 / (size[1] + size[0]) as f64).sqrt();
                    param.f_uniform_(-bound, bound)?;
                }
                1 if name.ends_with("bias") => {
                    param.f_zero_()?;
                }
                _ => {}
            }
        }
        Ok(())
    })
}

/// Mirrors the train/eval toggle of the underlying modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMode {
    Inference,
    Training,
}

impl NetworkMode {
    pub fn is_training(self) -> bool {
        self == NetworkMode::Training
    }
}
