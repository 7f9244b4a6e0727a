// Genetic operators over weight genomes
//
// Mutation rewrites genes in place. Every crossover reads two parents and
// returns two freshly allocated offspring; parents are never modified.
// All randomness comes from the caller's generator.

use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EvolutionError, Result};
use crate::genome::WeightGenome;
use crate::index::{to_2d, MajorOrder};

/// Location of one weight gene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightLocus {
    pub layer: usize,
    pub row: usize,
    pub col: usize,
}

/// Resolves a flat index over all weight genes to (layer, row, col).
///
/// Layers are walked in order, subtracting each layer's in * out count until
/// the remainder fits; the remainder is then split row-major with
/// row = rem / in, col = rem % in.
pub fn locate_weight(layer_sizes: &[usize], index: usize) -> Result<WeightLocus> {
    let mut rem = index;
    for (layer, pair) in layer_sizes.windows(2).enumerate() {
        let (inputs, outputs) = (pair[0], pair[1]);
        let count = inputs * outputs;
        if rem < count {
            let (row, col) = to_2d(rem, outputs, inputs, MajorOrder::Row)?;
            return Ok(WeightLocus { layer, row, col });
        }
        rem -= count;
    }
    Err(EvolutionError::IndexOutOfRange {
        index,
        len: layer_sizes.windows(2).map(|p| p[0] * p[1]).sum(),
    })
}

/// Resolves a flat index over all bias genes to (layer, neuron)
pub fn locate_bias(layer_sizes: &[usize], index: usize) -> Result<(usize, usize)> {
    let mut rem = index;
    for (layer, &width) in layer_sizes.iter().skip(1).enumerate() {
        if rem < width {
            return Ok((layer, rem));
        }
        rem -= width;
    }
    Err(EvolutionError::IndexOutOfRange {
        index,
        len: layer_sizes.iter().skip(1).sum(),
    })
}

/// Overwrites randomly drawn genes with fresh U[-1, 1] values.
///
/// `n_weight_genes` indices are drawn with replacement from all weight genes,
/// so a gene may be hit more than once. If the genome carries biases,
/// `n_bias_genes` bias entries are drawn the same way; otherwise the bias
/// count is ignored.
pub fn mutate<R: Rng + ?Sized>(
    genome: &mut WeightGenome,
    n_weight_genes: usize,
    n_bias_genes: usize,
    rng: &mut R,
) -> Result<()> {
    let layer_sizes = genome.layer_sizes().to_vec();

    let total_weights = genome.total_weights();
    if total_weights > 0 {
        for _ in 0..n_weight_genes {
            let gene = rng.random_range(0..total_weights);
            let locus = locate_weight(&layer_sizes, gene)?;
            let value = rng.random_range(-1.0..=1.0);
            genome.weights_mut()[locus.layer].set(locus.row, locus.col, value);
        }
    }

    let total_biases = genome.total_biases();
    if let Some(biases) = genome.biases_mut() {
        if total_biases > 0 {
            for _ in 0..n_bias_genes {
                let gene = rng.random_range(0..total_biases);
                let (layer, neuron) = locate_bias(&layer_sizes, gene)?;
                biases[layer][neuron] = rng.random_range(-1.0..=1.0);
            }
        }
    }

    trace!(
        "Mutated {} weight genes and {} bias genes",
        n_weight_genes,
        if total_biases > 0 { n_bias_genes } else { 0 }
    );
    Ok(())
}

/// Mutates `fraction` of the weight genes (rounded down) plus `n_bias_genes` biases
pub fn mutate_fraction<R: Rng + ?Sized>(
    genome: &mut WeightGenome,
    fraction: f64,
    n_bias_genes: usize,
    rng: &mut R,
) -> Result<()> {
    let n = (genome.total_weights() as f64 * fraction.max(0.0)) as usize;
    mutate(genome, n, n_bias_genes, rng)
}

fn check_layout(a: &WeightGenome, b: &WeightGenome) -> Result<()> {
    if !a.same_layout(b) {
        return Err(EvolutionError::InvalidLayout(format!(
            "parents differ in layout: {:?} (biases: {}) vs {:?} (biases: {})",
            a.layer_sizes(),
            a.has_bias(),
            b.layer_sizes(),
            b.has_bias()
        )));
    }
    Ok(())
}

/// Uniform per-gene crossover.
///
/// Both offspring start as copies of `a`. For every weight (and, with
/// `use_bias`, every bias) a fair coin picks which single offspring receives
/// `b`'s value, so each gene of `a` and of `b` survives in exactly one child.
pub fn recombine_weights<R: Rng + ?Sized>(
    a: &WeightGenome,
    b: &WeightGenome,
    use_bias: bool,
    rng: &mut R,
) -> Result<(WeightGenome, WeightGenome)> {
    check_layout(a, b)?;
    let mut first = a.clone();
    let mut second = a.clone();

    for (layer, m) in b.weights().iter().enumerate() {
        for (i, &value) in m.as_slice().iter().enumerate() {
            let target = if rng.random_bool(0.5) {
                &mut first
            } else {
                &mut second
            };
            target.weights_mut()[layer].as_mut_slice()[i] = value;
        }
    }

    if use_bias && a.has_bias() {
        if let Some(src) = b.biases() {
            for (layer, bias) in src.iter().enumerate() {
                for (i, &value) in bias.iter().enumerate() {
                    let target = if rng.random_bool(0.5) {
                        &mut first
                    } else {
                        &mut second
                    };
                    if let Some(biases) = target.biases_mut() {
                        biases[layer][i] = value;
                    }
                }
            }
        }
    }

    Ok((first, second))
}

/// Random one-point split of a gene run of length `len`, drawn from
/// [1, len - 2]. Runs of two split at 1; a single gene splits at 0.
fn crossover_point<R: Rng + ?Sized>(len: usize, rng: &mut R) -> usize {
    match len {
        0 | 1 => 0,
        2 => 1,
        _ => rng.random_range(1..=len - 2),
    }
}

/// One-point crossover of each output neuron's incoming weights.
///
/// Per layer and per row a fresh point `pt` is drawn: the first child takes
/// `b`'s columns from `pt` on, the second takes `b`'s columns before `pt`.
/// Biases are inherited from `a` unchanged.
pub fn recombine_ingoing<R: Rng + ?Sized>(
    a: &WeightGenome,
    b: &WeightGenome,
    rng: &mut R,
) -> Result<(WeightGenome, WeightGenome)> {
    check_layout(a, b)?;
    let mut first = a.clone();
    let mut second = a.clone();

    for (layer, m) in b.weights().iter().enumerate() {
        for row in 0..m.rows() {
            let pt = crossover_point(m.cols(), rng);
            let src = m.row(row);
            first.weights_mut()[layer].row_mut(row)[pt..].copy_from_slice(&src[pt..]);
            second.weights_mut()[layer].row_mut(row)[..pt].copy_from_slice(&src[..pt]);
        }
    }

    Ok((first, second))
}

/// One-point crossover of each input neuron's outgoing weights.
///
/// Per layer and per column a fresh point `pt` is drawn: the first child takes
/// `b`'s rows from `pt` on, the second takes `b`'s rows before `pt`.
/// Biases are inherited from `a` unchanged.
pub fn recombine_outgoing<R: Rng + ?Sized>(
    a: &WeightGenome,
    b: &WeightGenome,
    rng: &mut R,
) -> Result<(WeightGenome, WeightGenome)> {
    check_layout(a, b)?;
    let mut first = a.clone();
    let mut second = a.clone();

    for (layer, m) in b.weights().iter().enumerate() {
        for col in 0..m.cols() {
            let pt = crossover_point(m.rows(), rng);
            for row in 0..m.rows() {
                let target = if row >= pt { &mut first } else { &mut second };
                target.weights_mut()[layer].set(row, col, m.get(row, col));
            }
        }
    }

    Ok((first, second))
}

/// Which crossover `recombine` dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverStrategy {
    /// Per-gene coin flips, biases included when both parents carry them
    Uniform,
    Ingoing,
    Outgoing,
}

impl Default for CrossoverStrategy {
    fn default() -> Self {
        CrossoverStrategy::Uniform
    }
}

/// Produces two offspring from `a` and `b` with the chosen strategy
pub fn recombine<R: Rng + ?Sized>(
    a: &WeightGenome,
    b: &WeightGenome,
    strategy: CrossoverStrategy,
    rng: &mut R,
) -> Result<(WeightGenome, WeightGenome)> {
    match strategy {
        CrossoverStrategy::Uniform => {
            recombine_weights(a, b, a.has_bias() && b.has_bias(), rng)
        }
        CrossoverStrategy::Ingoing => recombine_ingoing(a, b, rng),
        CrossoverStrategy::Outgoing => recombine_outgoing(a, b, rng),
    }
}
