use ndarray::Array1;

/// Which end of the spectrum an eigen solve should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Which {
    /// Eigenvalues closest to zero.
    SmallestMagnitude,

    /// Eigenvalues farthest from zero.
    LargestMagnitude,
}

/// An eigen-pair reported back to the model by an eigen analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenPair {
    /// Eigenvalue σ of the posed problem `K x = σ M x`.
    pub sigma: f64,

    /// The quantity reported for σ by the analysis that produced the pair.
    ///
    /// For the ill-conditioning detector this is the load multiplier
    /// `1 / (1 - σ)`.
    pub value: f64,

    /// Eigenvector in equation numbering.
    pub vector: Array1<f64>,
}
