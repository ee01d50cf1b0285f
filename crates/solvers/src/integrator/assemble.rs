use ndarray::Array1;
use strut_core::{LinearSoe, MatrixSystem, StructuralModel};

use super::Error;

/// Zeroes `A` and adds every element tangent through its equation map.
pub(super) fn form_tangent<M, S>(model: &M, sys: &mut S) -> Result<(), Error>
where
    M: StructuralModel,
    S: MatrixSystem,
{
    sys.zero_a();
    for e in 0..model.num_elements() {
        let k = model.element_tangent(e).map_err(Error::model)?;
        sys.add_a(model.element_dofs(e), k.view(), 1.0);
    }
    Ok(())
}

/// Sets `B` to `λ P - F_int` at the model's trial state.
///
/// `load` is scratch space sized to the number of equations.
pub(super) fn form_unbalance<M, S>(
    model: &M,
    soe: &mut S,
    lambda: f64,
    load: &mut Array1<f64>,
) -> Result<(), Error>
where
    M: StructuralModel,
    S: LinearSoe,
{
    load.assign(&model.reference_load());
    *load *= lambda;
    soe.set_b(load.view());

    for e in 0..model.num_elements() {
        let f = model.element_resisting_force(e).map_err(Error::model)?;
        soe.add_b(model.element_dofs(e), f.view(), -1.0);
    }
    Ok(())
}

/// Solves `K Ûh = P` with the current left-hand side, writing `Ûh` into `out`.
///
/// `B` is left holding `P`.
pub(super) fn solve_reference<M, S>(
    model: &M,
    soe: &mut S,
    out: &mut Array1<f64>,
) -> Result<(), Error>
where
    M: StructuralModel,
    S: LinearSoe,
{
    soe.set_b(model.reference_load());
    soe.solve().map_err(Error::linear_solve)?;
    out.assign(&soe.x());
    Ok(())
}
