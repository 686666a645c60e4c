//! Adam optimizer with per-parameter moment state.

use std::collections::HashMap;

use ndarray::Array1;

pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    m: HashMap<String, Array1<f64>>,
    v: HashMap<String, Array1<f64>>,
    t: usize,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        }
    }

    /// Returns the update to subtract from the parameter named `param_name`.
    pub fn step(&mut self, param_name: &str, gradient: &Array1<f64>) -> Array1<f64> {
        self.t += 1;

        let m_t = self
            .m
            .entry(param_name.to_string())
            .or_insert_with(|| Array1::zeros(gradient.len()));
        let v_t = self
            .v
            .entry(param_name.to_string())
            .or_insert_with(|| Array1::zeros(gradient.len()));

        *m_t = &*m_t * self.beta1 + gradient * (1.0 - self.beta1);
        *v_t = &*v_t * self.beta2 + gradient.mapv(|x| x.powi(2)) * (1.0 - self.beta2);

        let m_hat = &*m_t / (1.0 - self.beta1.powi(self.t as i32));
        let v_hat = &*v_t / (1.0 - self.beta2.powi(self.t as i32));

        &m_hat * self.learning_rate / (v_hat.mapv(f64::sqrt) + self.epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_first_step_moves_against_gradient() {
        let mut adam = Adam::new(0.001);
        let update = adam.step("w", &array![1.0, -1.0]);

        // Bias-corrected first step has magnitude ~= learning rate.
        assert!((update[0] - 0.001).abs() < 1e-6);
        assert!((update[1] + 0.001).abs() < 1e-6);
    }

    #[test]
    fn test_moment_state_is_per_parameter() {
        let mut adam = Adam::new(0.001);
        adam.step("a", &array![10.0]);
        let update = adam.step("b", &array![1.0]);
        // Fresh moments for "b": update unaffected by "a"'s history.
        assert!(update[0] > 0.0);
        assert!(update[0] < 0.01);
    }
}
