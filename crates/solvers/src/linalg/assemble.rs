use nalgebra::DMatrix;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Scatters `fact · m` into `target` through the equation map `dofs`.
///
/// Rows and columns whose map entry is `None` are skipped.
pub(super) fn scatter_matrix(
    target: &mut DMatrix<f64>,
    dofs: &[Option<usize>],
    m: ArrayView2<'_, f64>,
    fact: f64,
) {
    for (i, row) in dofs.iter().enumerate() {
        let Some(row) = *row else { continue };
        for (j, col) in dofs.iter().enumerate() {
            let Some(col) = *col else { continue };
            target[(row, col)] += fact * m[[i, j]];
        }
    }
}

/// Scatters `fact · v` into `target` through the equation map `dofs`.
pub(super) fn scatter_vector(
    target: &mut Array1<f64>,
    dofs: &[Option<usize>],
    v: ArrayView1<'_, f64>,
    fact: f64,
) {
    for (i, eq) in dofs.iter().enumerate() {
        if let Some(eq) = *eq {
            target[eq] += fact * v[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn constrained_entries_are_skipped() {
        let mut target = DMatrix::zeros(2, 2);
        let m = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];

        scatter_matrix(&mut target, &[Some(1), None, Some(0)], m.view(), 2.0);

        assert_eq!(target, DMatrix::from_row_slice(2, 2, &[18.0, 14.0, 6.0, 2.0]));
    }

    #[test]
    fn vector_contributions_accumulate() {
        let mut target = Array1::zeros(2);
        let v = array![1.0, 2.0];

        scatter_vector(&mut target, &[Some(0), Some(0)], v.view(), -1.0);
        scatter_vector(&mut target, &[None, Some(1)], v.view(), 1.0);

        assert_eq!(target, array![-3.0, 2.0]);
    }
}
