// Weight genome: the evolvable parameters of a feed-forward network
//
// A genome holds one (out x in) weight matrix per consecutive layer pair and,
// if enabled, one bias vector per layer pair. Every genome owns its storage;
// cloning produces an independent deep copy.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EvolutionError, Result};

/// Dense row-major matrix of genes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix from row-major values
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(EvolutionError::InvalidLayout(format!(
                "{}x{} matrix needs {} values, got {}",
                rows,
                cols,
                rows * cols,
                data.len()
            )));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Entries drawn independently from U[-1, 1]
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.random_range(-1.0..=1.0))
            .collect();
        Matrix { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Row-major view of all entries
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// Function applied after every hidden layer; the output layer stays linear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// No nonlinearity: the stacked layers collapse to one linear map
    Identity,
    Relu,
    Tanh,
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Identity
    }
}

impl Activation {
    #[inline]
    fn apply(&self, x: f32) -> f32 {
        match self {
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeightGenome {
    layer_sizes: Vec<usize>,
    weights: Vec<Matrix>,
    biases: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    activation: Activation,
}

impl WeightGenome {
    /// Creates a genome with uniform random genes in [-1, 1]
    ///
    /// # Arguments
    /// * `layer_sizes` - Layer widths, input first, output last (at least two)
    /// * `use_bias` - Whether bias vectors are allocated and evolved
    /// * `rng` - Source of the initial genes
    pub fn new_random<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        use_bias: bool,
        rng: &mut R,
    ) -> Result<Self> {
        validate_layer_sizes(layer_sizes)?;
        let weights = layer_sizes
            .windows(2)
            .map(|pair| Matrix::random(pair[1], pair[0], rng))
            .collect();
        let biases = if use_bias {
            Some(
                layer_sizes[1..]
                    .iter()
                    .map(|&n| (0..n).map(|_| rng.random_range(-1.0..=1.0)).collect())
                    .collect(),
            )
        } else {
            None
        };
        Ok(WeightGenome {
            layer_sizes: layer_sizes.to_vec(),
            weights,
            biases,
            activation: Activation::Identity,
        })
    }

    /// Assembles a genome from explicit parts, checking every shape
    pub fn from_parts(
        layer_sizes: Vec<usize>,
        weights: Vec<Matrix>,
        biases: Option<Vec<Vec<f32>>>,
    ) -> Result<Self> {
        let genome = WeightGenome {
            layer_sizes,
            weights,
            biases,
            activation: Activation::Identity,
        };
        genome.validate()?;
        Ok(genome)
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Checks that matrices and biases conform to the layer list
    pub fn validate(&self) -> Result<()> {
        validate_layer_sizes(&self.layer_sizes)?;
        let depth = self.layer_sizes.len() - 1;
        if self.weights.len() != depth {
            return Err(EvolutionError::InvalidLayout(format!(
                "expected {} weight matrices, got {}",
                depth,
                self.weights.len()
            )));
        }
        for (i, m) in self.weights.iter().enumerate() {
            let expected = (self.layer_sizes[i + 1], self.layer_sizes[i]);
            if m.shape() != expected || m.data.len() != expected.0 * expected.1 {
                return Err(EvolutionError::InvalidLayout(format!(
                    "layer {} matrix is {:?}, expected {:?}",
                    i,
                    m.shape(),
                    expected
                )));
            }
        }
        if let Some(biases) = &self.biases {
            if biases.len() != depth {
                return Err(EvolutionError::InvalidLayout(format!(
                    "expected {} bias vectors, got {}",
                    depth,
                    biases.len()
                )));
            }
            for (i, b) in biases.iter().enumerate() {
                if b.len() != self.layer_sizes[i + 1] {
                    return Err(EvolutionError::InvalidLayout(format!(
                        "layer {} bias has {} entries, expected {}",
                        i,
                        b.len(),
                        self.layer_sizes[i + 1]
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    /// Number of weight matrices
    pub fn depth(&self) -> usize {
        self.weights.len()
    }

    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut [Matrix] {
        &mut self.weights
    }

    pub fn biases(&self) -> Option<&[Vec<f32>]> {
        self.biases.as_deref()
    }

    pub fn biases_mut(&mut self) -> Option<&mut [Vec<f32>]> {
        self.biases.as_deref_mut()
    }

    pub fn has_bias(&self) -> bool {
        self.biases.is_some()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Weight genes per layer pair
    pub fn layer_weight_counts(&self) -> Vec<usize> {
        self.layer_sizes.windows(2).map(|p| p[0] * p[1]).collect()
    }

    /// Sum over layer pairs of in * out
    pub fn total_weights(&self) -> usize {
        self.layer_weight_counts().iter().sum()
    }

    /// Sum of all non-input layer widths, 0 if biases are disabled
    pub fn total_biases(&self) -> usize {
        if self.has_bias() {
            self.layer_sizes[1..].iter().sum()
        } else {
            0
        }
    }

    /// Same layer list and bias presence
    pub fn same_layout(&self, other: &WeightGenome) -> bool {
        self.layer_sizes == other.layer_sizes && self.has_bias() == other.has_bias()
    }

    /// Evaluates the network on `input`
    ///
    /// # Returns
    /// * Raw output layer values (the activation only applies to hidden
    ///   layers), or `Shape` if `input.len()` differs from the input layer
    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>> {
        if input.len() != self.input_size() {
            return Err(EvolutionError::Shape {
                expected: self.input_size(),
                actual: input.len(),
            });
        }

        let last = self.weights.len() - 1;
        let mut x = input.to_vec();
        for (layer, m) in self.weights.iter().enumerate() {
            let bias = self.biases.as_ref().map(|b| &b[layer]);
            let next: Vec<f32> = (0..m.rows)
                .map(|r| {
                    let dot: f32 = m.row(r).iter().zip(&x).map(|(w, v)| w * v).sum();
                    let z = dot + bias.map_or(0.0, |b| b[r]);
                    if layer == last {
                        z
                    } else {
                        self.activation.apply(z)
                    }
                })
                .collect();
            x = next;
        }
        Ok(x)
    }

    /// Lossless serialization of layer sizes, weights, biases and activation
    pub fn save(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Inverse of [`WeightGenome::save`]; rejects blobs with inconsistent shapes
    pub fn load(blob: &[u8]) -> Result<Self> {
        let genome: WeightGenome = serde_json::from_slice(blob)?;
        genome.validate()?;
        Ok(genome)
    }
}

fn validate_layer_sizes(layer_sizes: &[usize]) -> Result<()> {
    if layer_sizes.len() < 2 {
        return Err(EvolutionError::InvalidLayout(format!(
            "need at least 2 layers, got {}",
            layer_sizes.len()
        )));
    }
    if let Some(pos) = layer_sizes.iter().position(|&n| n == 0) {
        return Err(EvolutionError::InvalidLayout(format!(
            "layer {} has zero width",
            pos
        )));
    }
    Ok(())
}
