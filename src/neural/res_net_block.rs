use tch::{nn, Tensor};

/// Residual block: two 3×3 convolutions with BatchNorm and an identity skip.
pub struct ResNetBlock {
    conv1: nn::Conv2D,
    bn1: nn::BatchNorm,
    conv2: nn::Conv2D,
    bn2: nn::BatchNorm,
}

impl ResNetBlock {
    pub fn new_path(path: &nn::Path, channels: i64) -> Self {
        let conv1 = nn::conv2d(&(path / "conv1"), channels, channels, 3, same_padding());
        let bn1 = nn::batch_norm2d(&(path / "bn1"), channels, Default::default());
        let conv2 = nn::conv2d(&(path / "conv2"), channels, channels, 3, same_padding());
        let bn2 = nn::batch_norm2d(&(path / "bn2"), channels, Default::default());

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
        }
    }

    pub fn forward(&self, x: &Tensor, train: bool) -> Tensor {
        let out = x.apply(&self.conv1).apply_t(&self.bn1, train).relu();
        let out = out.apply(&self.conv2).apply_t(&self.bn2, train);
        (out + x).relu()
    }
}

fn same_padding() -> nn::ConvConfig {
    nn::ConvConfig {
        padding: 1,
        ..Default::default()
    }
}
