//! Global-norm gradient clipping

use tch::nn;

/// Rescales all gradients of `vs` so their global L2 norm is at most `max_norm`.
///
/// Returns the norm measured before clipping. `max_norm <= 0` only measures.
pub fn clip_gradients(vs: &nn::VarStore, max_norm: f64) -> f64 {
    let params = vs.trainable_variables();
    let mut total_norm = 0.0;

    tch::no_grad(|| {
        let mut sq_sum = 0.0;
        for param in &params {
            let grad = param.grad();
            if grad.defined() {
                let norm = grad.norm().double_value(&[]);
                sq_sum += norm * norm;
            }
        }
        total_norm = f64::sqrt(sq_sum);

        if max_norm > 0.0 && total_norm > max_norm {
            let scale = max_norm / (total_norm + 1e-6);
            for param in &params {
                let mut grad = param.grad();
                if grad.defined() {
                    grad *= scale;
                }
            }
            log::debug!("✂️ Gradient norm {:.4} clipped to {:.4}", total_norm, max_norm);
        }
    });

    total_norm
}
