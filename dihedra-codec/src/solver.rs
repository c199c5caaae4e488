//! Linear solver backends for the decoder's position system
//!
//! The decoder's normal equations are symmetric positive definite once enough
//! vertices are pinned. Three interchangeable backends solve them:
//!
//! - **Cholesky**: sparse LLᵀ factorization of the CSC matrix
//! - **LU**: dense LU with partial pivoting, tolerant of mild indefiniteness;
//!   meant for small systems
//! - **Conjugate gradient**: Jacobi-preconditioned CG on the CSR matrix, one
//!   right-hand side per rayon task
//!
//! The choice affects speed and robustness, never the problem being solved.

use dihedra_core::{Error, Result};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Selectable solver backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearSolverKind {
    #[default]
    Cholesky,
    Lu,
    ConjugateGradient,
}

impl FromStr for LinearSolverKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cholesky" | "llt" | "cholmod" => Ok(Self::Cholesky),
            "lu" | "umfpack" => Ok(Self::Lu),
            "cg" | "pcg" | "conjugate_gradient" => Ok(Self::ConjugateGradient),
            other => Err(Error::InvalidData(format!("unknown linear solver '{}'", other))),
        }
    }
}

impl fmt::Display for LinearSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cholesky => "cholesky",
            Self::Lu => "lu",
            Self::ConjugateGradient => "cg",
        };
        f.write_str(name)
    }
}

/// Stopping rule for the conjugate gradient backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CgConfig {
    /// Maximum number of CG iterations
    pub max_iterations: usize,
    /// Iteration stops when ||r|| / ||b|| < tolerance
    pub tolerance: f64,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-12,
        }
    }
}

/// Assemble an `n x n` sparse matrix from `(row, column, value)` entries.
///
/// Duplicate entries are summed when the matrix is compressed.
pub fn assemble(n: usize, triplets: &[(usize, usize, f64)]) -> Result<CooMatrix<f64>> {
    let mut coo = CooMatrix::new(n, n);
    for &(row, col, value) in triplets {
        if row >= n || col >= n {
            return Err(Error::Range(format!(
                "entry ({}, {}) outside {}x{} matrix",
                row, col, n, n
            )));
        }
        coo.push(row, col, value);
    }
    Ok(coo)
}

/// Solve `A X = B` for every column of `rhs`
pub fn solve(
    kind: LinearSolverKind,
    matrix: &CooMatrix<f64>,
    rhs: &DMatrix<f64>,
    cg: &CgConfig,
) -> Result<DMatrix<f64>> {
    if matrix.nrows() != matrix.ncols() || rhs.nrows() != matrix.nrows() || rhs.ncols() == 0 {
        return Err(Error::InvalidData(format!(
            "cannot solve a {}x{} system with a right-hand side of {} rows",
            matrix.nrows(),
            matrix.ncols(),
            rhs.nrows()
        )));
    }
    debug!(
        "solving {}x{} system ({} entries, {} right-hand sides) with {}",
        matrix.nrows(),
        matrix.ncols(),
        matrix.nnz(),
        rhs.ncols(),
        kind
    );

    let solution = match kind {
        LinearSolverKind::Cholesky => {
            let csc = CscMatrix::from(matrix);
            let factor = CscCholesky::factor(&csc).map_err(|e| {
                Error::SingularSystem(format!("sparse Cholesky factorization failed: {:?}", e))
            })?;
            factor.solve(rhs)
        }
        LinearSolverKind::Lu => DMatrix::from(matrix)
            .lu()
            .solve(rhs)
            .ok_or_else(|| Error::SingularSystem("LU factorization found a zero pivot".to_string()))?,
        LinearSolverKind::ConjugateGradient => {
            // coordinates are independent systems on the same matrix
            let csr = CsrMatrix::from(matrix);
            let columns = (0..rhs.ncols())
                .into_par_iter()
                .map(|j| conjugate_gradient(&csr, &rhs.column(j).into_owned(), cg))
                .collect::<Result<Vec<_>>>()?;
            DMatrix::from_columns(&columns)
        }
    };

    if solution.iter().any(|v| !v.is_finite()) {
        return Err(Error::SingularSystem(format!("{} solver produced non-finite values", kind)));
    }
    Ok(solution)
}

/// Jacobi-preconditioned conjugate gradient for one right-hand side
pub fn conjugate_gradient(
    matrix: &CsrMatrix<f64>,
    b: &DVector<f64>,
    config: &CgConfig,
) -> Result<DVector<f64>> {
    let n = matrix.nrows();
    let b_norm = b.norm();
    if b_norm == 0.0 {
        return Ok(DVector::zeros(n));
    }

    let mut diagonal = DVector::<f64>::zeros(n);
    for (i, j, &v) in matrix.triplet_iter() {
        if i == j {
            diagonal[i] += v;
        }
    }
    let inv_diag = diagonal
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            if d > 0.0 {
                Ok(1.0 / d)
            } else {
                Err(Error::SingularSystem(format!("non-positive diagonal {} in row {}", d, i)))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    let inv_diag = DVector::from_vec(inv_diag);

    let mut x = DVector::zeros(n);
    let mut r = b.clone();
    let mut z = r.component_mul(&inv_diag);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iteration in 0..config.max_iterations {
        let ap: DVector<f64> = matrix * &p;
        let pap = p.dot(&ap);
        if !(pap > 0.0) {
            return Err(Error::SingularSystem(format!(
                "conjugate gradient broke down at iteration {} (pAp = {})",
                iteration, pap
            )));
        }
        let alpha = rz / pap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        if r.norm() / b_norm < config.tolerance {
            debug!("conjugate gradient converged in {} iterations", iteration + 1);
            return Ok(x);
        }

        z = r.component_mul(&inv_diag);
        let rz_next = r.dot(&z);
        let beta = rz_next / rz;
        rz = rz_next;
        p = &z + beta * &p;
    }

    let residual = r.norm() / b_norm;
    warn!(
        "conjugate gradient stopped after {} iterations (relative residual {:e})",
        config.max_iterations, residual
    );
    Err(Error::SingularSystem(format!(
        "conjugate gradient did not converge: relative residual {:e}",
        residual
    )))
}
