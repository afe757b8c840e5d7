use rand::Rng;

use super::activation::Activation;
use crate::error::NetworkError;

/// Network architecture and learning rate.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub hidden_layers: usize,
    pub hidden_width: usize,
    /// Shared by every hidden and output node layer.
    pub activation: Activation,
    pub learning_rate: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            hidden_layers: 2,
            hidden_width: 13,
            activation: Activation::Sigmoid,
            learning_rate: 0.08,
        }
    }
}

/// Persisted weights and biases.
///
/// `weights[i][j][k]` connects node `j` of node layer `i` to node `k` of
/// node layer `i + 1`; `bias[i][k]` belongs to node `k` of node layer `i + 1`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameters {
    pub weights: Vec<Vec<Vec<f64>>>,
    pub bias: Vec<Vec<f64>>,
}

/// Dense connection between two node layers.
#[derive(Debug, Clone)]
struct DenseLayer {
    inputs: usize,
    outputs: usize,
    /// Row-major `inputs x outputs`.
    weights: Vec<f64>,
    bias: Vec<f64>,
}

impl DenseLayer {
    fn random<R: Rng + ?Sized>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        DenseLayer {
            inputs,
            outputs,
            weights: (0..inputs * outputs).map(|_| rng.random::<f64>()).collect(),
            bias: (0..outputs).map(|_| rng.random::<f64>()).collect(),
        }
    }

    fn weight(&self, from: usize, to: usize) -> f64 {
        self.weights[from * self.outputs + to]
    }

    fn is_finite(&self) -> bool {
        self.weights.iter().chain(&self.bias).all(|v| v.is_finite())
    }
}

/// Fully connected network evaluated one neuron at a time.
///
/// Node layer 0 is the input passthrough (identity activation); node layers
/// `1..=hidden_layers` are hidden; the last node layer is the output. Scratch
/// buffers are sized once at construction and reused by every call.
pub struct FeedForwardNetwork {
    widths: Vec<usize>,
    activations: Vec<Activation>,
    layers: Vec<DenseLayer>,
    pre_activation: Vec<Vec<f64>>,
    activation: Vec<Vec<f64>>,
    deltas: Vec<Vec<f64>>,
    /// Set by a forward pass; backpropagation reads that pass's buffers.
    primed: bool,
}

impl FeedForwardNetwork {
    pub fn new(
        input_size: usize,
        output_size: usize,
        hidden_layers: usize,
        hidden_width: usize,
        activation: Activation,
    ) -> Result<Self, NetworkError> {
        Self::with_rng(
            input_size,
            output_size,
            hidden_layers,
            hidden_width,
            activation,
            &mut rand::rng(),
        )
    }

    /// Build a network whose weights and biases are drawn from U[0, 1) using `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        hidden_layers: usize,
        hidden_width: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        for (name, value) in [
            ("input_size", input_size),
            ("output_size", output_size),
            ("hidden_layers", hidden_layers),
            ("hidden_width", hidden_width),
        ] {
            if value == 0 {
                return Err(NetworkError::InvalidShape(format!("{name} must be > 0")));
            }
        }

        let mut widths = Vec::with_capacity(hidden_layers + 2);
        widths.push(input_size);
        widths.extend(std::iter::repeat(hidden_width).take(hidden_layers));
        widths.push(output_size);

        let mut activations = vec![activation; widths.len()];
        activations[0] = Activation::Identity;

        let layers = widths
            .windows(2)
            .map(|pair| DenseLayer::random(pair[0], pair[1], rng))
            .collect();

        Ok(FeedForwardNetwork {
            pre_activation: widths.iter().map(|&w| vec![0.0; w]).collect(),
            activation: widths.iter().map(|&w| vec![0.0; w]).collect(),
            deltas: widths.iter().map(|&w| vec![0.0; w]).collect(),
            widths,
            activations,
            layers,
            primed: false,
        })
    }

    pub fn from_config(
        input_size: usize,
        output_size: usize,
        config: &NetworkConfig,
    ) -> Result<Self, NetworkError> {
        Self::new(
            input_size,
            output_size,
            config.hidden_layers,
            config.hidden_width,
            config.activation,
        )
    }

    /// Node counts of every node layer, input first.
    pub fn layer_widths(&self) -> &[usize] {
        &self.widths
    }

    pub fn input_size(&self) -> usize {
        self.widths[0]
    }

    pub fn output_size(&self) -> usize {
        self.widths[self.widths.len() - 1]
    }

    /// Override the activation of the output node layer.
    pub fn set_output_activation(&mut self, activation: Activation) {
        let last = self.activations.len() - 1;
        self.activations[last] = activation;
        self.primed = false;
    }

    /// Evaluate the network. The returned slice is the output scratch buffer
    /// and is overwritten by the next call.
    pub fn forward(&mut self, inputs: &[f64]) -> Result<&[f64], NetworkError> {
        if inputs.len() != self.input_size() {
            return Err(NetworkError::InputLength {
                expected: self.input_size(),
                found: inputs.len(),
            });
        }

        self.pre_activation[0].copy_from_slice(inputs);
        for i in 0..self.widths.len() {
            let f = self.activations[i];
            for j in 0..self.widths[i] {
                self.activation[i][j] = f.apply(self.pre_activation[i][j]);
            }

            let Some(layer) = self.layers.get(i) else {
                break;
            };
            let current = &self.activation[i];
            let next = &mut self.pre_activation[i + 1];
            next.fill(0.0);
            for j in 0..layer.inputs {
                for k in 0..layer.outputs {
                    next[k] += current[j] * layer.weight(j, k);
                }
            }
            for k in 0..layer.outputs {
                next[k] += layer.bias[k];
            }
        }

        self.primed = true;
        Ok(&self.activation[self.widths.len() - 1])
    }

    /// Output of the most recent forward pass.
    pub fn output(&self) -> &[f64] {
        &self.activation[self.widths.len() - 1]
    }

    /// Mean squared error between the last forward pass and `target`.
    pub fn mean_squared_error(&self, target: &[f64]) -> Result<f64, NetworkError> {
        self.check_target(target)?;
        let output = self.output();
        let sum: f64 = output
            .iter()
            .zip(target)
            .map(|(o, t)| (o - t) * (o - t))
            .sum();
        Ok(sum / output.len() as f64)
    }

    fn check_target(&self, target: &[f64]) -> Result<(), NetworkError> {
        if !self.primed {
            return Err(NetworkError::NoForwardPass);
        }
        if target.len() != self.output_size() {
            return Err(NetworkError::TargetLength {
                expected: self.output_size(),
                found: target.len(),
            });
        }
        Ok(())
    }

    /// One stochastic gradient step toward `target` for the squared error,
    /// using the buffers of the preceding forward pass.
    ///
    /// Bias updates are not scaled by the learning rate.
    pub fn apply_backpropagation(
        &mut self,
        target: &[f64],
        learning_rate: f64,
    ) -> Result<(), NetworkError> {
        self.check_target(target)?;
        let last = self.widths.len() - 1;

        for k in 0..self.widths[last] {
            self.deltas[last][k] = self.activation[last][k] - target[k];
        }

        // Hidden deltas, back to front, from the not-yet-updated weights.
        for i in (1..last).rev() {
            let f_next = self.activations[i + 1];
            let (head, tail) = self.deltas.split_at_mut(i + 1);
            let current = &mut head[i];
            let next = &tail[0];
            let next_activation = &self.activation[i + 1];
            let layer = &self.layers[i];

            for j in 0..self.widths[i] {
                let mut sum = 0.0;
                for k in 0..self.widths[i + 1] {
                    let slope = f_next.derivative_from_output(next_activation[k]);
                    sum += next[k] * slope * layer.weight(j, k);
                }
                current[j] = sum;
            }
        }

        for i in (0..self.layers.len()).rev() {
            let f_next = self.activations[i + 1];
            let layer = &mut self.layers[i];
            let from = &self.activation[i];
            let to = &self.activation[i + 1];
            let delta = &self.deltas[i + 1];

            for j in 0..layer.inputs {
                for k in 0..layer.outputs {
                    let gradient = delta[k] * f_next.derivative_from_output(to[k]) * from[j];
                    layer.weights[j * layer.outputs + k] -= learning_rate * gradient;
                }
            }
            for k in 0..layer.outputs {
                layer.bias[k] -= delta[k] * f_next.derivative_from_output(to[k]);
            }
        }

        if let Some(layer) = self.layers.iter().position(|l| !l.is_finite()) {
            return Err(NetworkError::Diverged { layer });
        }
        Ok(())
    }

    /// Copy the current weights and biases into their persisted form.
    pub fn parameters(&self) -> Parameters {
        Parameters {
            weights: self
                .layers
                .iter()
                .map(|layer| {
                    layer
                        .weights
                        .chunks(layer.outputs)
                        .map(<[f64]>::to_vec)
                        .collect()
                })
                .collect(),
            bias: self.layers.iter().map(|layer| layer.bias.clone()).collect(),
        }
    }

    /// Replace weights and biases. The shape is validated in full before
    /// anything is written, so a mismatch leaves the network untouched.
    pub fn load_parameters(&mut self, params: &Parameters) -> Result<(), NetworkError> {
        if params.weights.len() != self.layers.len() || params.bias.len() != self.layers.len() {
            return Err(NetworkError::ShapeMismatch(format!(
                "expected {} weight layers, found {} weight and {} bias layers",
                self.layers.len(),
                params.weights.len(),
                params.bias.len()
            )));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            let rows = &params.weights[i];
            if rows.len() != layer.inputs {
                return Err(NetworkError::ShapeMismatch(format!(
                    "layer {i}: expected {} weight rows, found {}",
                    layer.inputs,
                    rows.len()
                )));
            }
            if let Some((j, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != layer.outputs)
            {
                return Err(NetworkError::ShapeMismatch(format!(
                    "layer {i} row {j}: expected {} weights, found {}",
                    layer.outputs,
                    row.len()
                )));
            }
            if params.bias[i].len() != layer.outputs {
                return Err(NetworkError::ShapeMismatch(format!(
                    "layer {i}: expected {} biases, found {}",
                    layer.outputs,
                    params.bias[i].len()
                )));
            }
        }

        for (i, layer) in self.layers.iter_mut().enumerate() {
            for (j, row) in params.weights[i].iter().enumerate() {
                layer.weights[j * layer.outputs..(j + 1) * layer.outputs].copy_from_slice(row);
            }
            layer.bias.copy_from_slice(&params.bias[i]);
        }
        self.primed = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_network(seed: u64) -> FeedForwardNetwork {
        let mut rng = StdRng::seed_from_u64(seed);
        FeedForwardNetwork::with_rng(4, 3, 2, 5, Activation::Sigmoid, &mut rng).unwrap()
    }

    #[test]
    fn test_construction_shapes() {
        let net = small_network(1);
        assert_eq!(net.layer_widths(), &[4, 5, 5, 3]);

        let params = net.parameters();
        assert_eq!(params.weights.len(), 3);
        assert_eq!(params.weights[0].len(), 4);
        assert_eq!(params.weights[0][0].len(), 5);
        assert_eq!(params.weights[2].len(), 5);
        assert_eq!(params.weights[2][0].len(), 3);
        assert_eq!(params.bias[2].len(), 3);
    }

    #[test]
    fn test_initial_parameters_in_unit_interval() {
        let params = small_network(2).parameters();
        let all = params
            .weights
            .iter()
            .flatten()
            .flatten()
            .chain(params.bias.iter().flatten());
        for &v in all {
            assert!((0.0..1.0).contains(&v), "parameter {v} outside [0, 1)");
        }
    }

    #[test]
    fn test_rejects_zero_sizes() {
        for (i, o, h, w) in [(0, 3, 1, 2), (4, 0, 1, 2), (4, 3, 0, 2), (4, 3, 1, 0)] {
            let err = FeedForwardNetwork::new(i, o, h, w, Activation::Sigmoid)
                .err()
                .expect("zero size should be rejected");
            assert!(matches!(err, NetworkError::InvalidShape(_)));
        }
    }

    #[test]
    fn test_forward_output_shape_and_range() {
        let mut net = small_network(3);
        let output = net.forward(&[0.1, 0.9, 0.0, 1.0]).unwrap();
        assert_eq!(output.len(), 3);
        for &v in output {
            assert!(v > 0.0 && v < 1.0, "sigmoid output {v} outside (0, 1)");
        }
    }

    #[test]
    fn test_forward_identity_output_can_leave_unit_interval() {
        let mut net = small_network(4);
        net.set_output_activation(Activation::Identity);
        let output = net.forward(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        // Five hidden sigmoids near 1 times positive weights plus a positive bias.
        assert!(output.iter().any(|&v| v > 1.0));
    }

    #[test]
    fn test_forward_matches_hand_computation() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net =
            FeedForwardNetwork::with_rng(2, 1, 1, 1, Activation::Sigmoid, &mut rng).unwrap();
        net.load_parameters(&Parameters {
            weights: vec![vec![vec![0.5], vec![-1.0]], vec![vec![2.0]]],
            bias: vec![vec![0.25], vec![-0.5]],
        })
        .unwrap();

        let output = net.forward(&[1.0, 0.5]).unwrap()[0];
        let hidden = Activation::Sigmoid.apply(0.5 - 0.5 + 0.25);
        let expected = Activation::Sigmoid.apply(2.0 * hidden - 0.5);
        assert!((output - expected).abs() < 1e-12);
    }

    #[test]
    fn test_forward_does_not_mutate_parameters() {
        let mut net = small_network(5);
        let before = net.parameters();
        net.forward(&[0.3, 0.3, 0.3, 0.3]).unwrap();
        assert_eq!(net.parameters(), before);
    }

    #[test]
    fn test_forward_rejects_wrong_input_length() {
        let mut net = small_network(6);
        assert_eq!(
            net.forward(&[1.0, 2.0]).unwrap_err(),
            NetworkError::InputLength {
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn test_backprop_before_forward_fails() {
        let mut net = small_network(7);
        let before = net.parameters();
        assert_eq!(
            net.apply_backpropagation(&[0.0, 0.0, 0.0], 0.1),
            Err(NetworkError::NoForwardPass)
        );
        assert_eq!(net.parameters(), before);
    }

    #[test]
    fn test_backprop_rejects_wrong_target_length() {
        let mut net = small_network(8);
        net.forward(&[0.0; 4]).unwrap();
        assert_eq!(
            net.apply_backpropagation(&[0.0; 5], 0.1),
            Err(NetworkError::TargetLength {
                expected: 3,
                found: 5
            })
        );
    }

    #[test]
    fn test_backprop_reduces_error_on_fixed_example() {
        let mut net = small_network(9);
        let input = [0.2, 0.1, 0.0, 0.3];
        let target = [0.2, 0.8, 0.1];

        net.forward(&input).unwrap();
        let initial = net.mean_squared_error(&target).unwrap();

        for _ in 0..50 {
            net.apply_backpropagation(&target, 0.05).unwrap();
            net.forward(&input).unwrap();
        }
        let last = net.mean_squared_error(&target).unwrap();
        assert!(last < initial, "error did not fall: {initial} -> {last}");
    }

    #[test]
    fn test_backprop_detects_divergence() {
        let mut net = small_network(10);
        net.forward(&[1.0; 4]).unwrap();
        let err = net
            .apply_backpropagation(&[0.0; 3], f64::INFINITY)
            .unwrap_err();
        assert!(matches!(err, NetworkError::Diverged { .. }));
    }

    #[test]
    fn test_parameters_roundtrip_between_networks() {
        let mut source = small_network(11);
        let mut copy = small_network(12);
        copy.load_parameters(&source.parameters()).unwrap();

        let input = [0.5, 0.25, 0.75, 0.0];
        let a = source.forward(&input).unwrap().to_vec();
        let b = copy.forward(&input).unwrap().to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_parameters_shape_mismatch_leaves_network_untouched() {
        let mut net = small_network(13);
        let before = net.parameters();

        let mut wrong = before.clone();
        wrong.weights[1].pop();
        let err = net.load_parameters(&wrong).unwrap_err();
        assert!(matches!(err, NetworkError::ShapeMismatch(_)));
        assert_eq!(net.parameters(), before);

        let other = FeedForwardNetwork::new(4, 3, 1, 5, Activation::Sigmoid)
            .unwrap()
            .parameters();
        assert!(matches!(
            net.load_parameters(&other),
            Err(NetworkError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_parameters_json_keys() {
        let json = serde_json::to_string(&small_network(14).parameters()).unwrap();
        assert!(json.starts_with("{\"Weights\":"));
        assert!(json.contains("\"Bias\":"));
    }
}
