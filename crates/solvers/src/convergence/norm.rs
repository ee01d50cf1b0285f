use ndarray::ArrayView1;

/// Vector norm used by the convergence metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Norm {
    /// Largest absolute entry.
    Max,

    /// `(Σ |vᵢ|ᵖ)^(1/p)`.
    P(f64),
}

impl Default for Norm {
    fn default() -> Self {
        Self::P(2.0)
    }
}

impl Norm {
    /// Evaluates the norm of `v`.
    #[must_use]
    pub fn of(self, v: ArrayView1<'_, f64>) -> f64 {
        match self {
            Self::Max => v.iter().fold(0.0, |acc: f64, x| acc.max(x.abs())),
            Self::P(p) if p == 2.0 => v.dot(&v).sqrt(),
            Self::P(p) if p == 1.0 => v.iter().map(|x| x.abs()).sum(),
            Self::P(p) => v.iter().map(|x| x.abs().powf(p)).sum::<f64>().powf(1.0 / p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn common_norms() {
        let v = array![3.0, -4.0];

        assert_relative_eq!(Norm::Max.of(v.view()), 4.0);
        assert_relative_eq!(Norm::P(1.0).of(v.view()), 7.0);
        assert_relative_eq!(Norm::P(2.0).of(v.view()), 5.0);
        assert_relative_eq!(Norm::P(3.0).of(v.view()), 91.0_f64.cbrt(), epsilon = 1e-12);
    }
}
