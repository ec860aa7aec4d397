//! Sparse matrix utilities for large-model solves
//!
//! Assembled stiffness matrices are overwhelmingly sparse; the triplet
//! builder accumulates element contributions and converts to CSR for the
//! iterative solve path.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Triplet (COO) accumulator for incremental stiffness assembly.
/// Duplicate (row, col) entries sum, which is exactly the direct stiffness
/// superposition rule.
pub struct TripletMatrix {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl TripletMatrix {
    /// Create a new builder for a `size` x `size` matrix
    pub fn new(size: usize) -> Self {
        // Rough pre-allocation for typical frame connectivity
        Self {
            size,
            entries: Vec::with_capacity(size * 40),
        }
    }

    /// Matrix dimension
    pub fn size(&self) -> usize {
        self.size
    }

    /// Add a value (accumulates with existing entries at the same position)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value != 0.0 {
            self.entries.push((row, col, value));
        }
    }

    /// Add a dense block at arbitrary global DOF positions
    pub fn add_block(&mut self, dofs: &[usize], block: &DMatrix<f64>) {
        debug_assert_eq!(block.nrows(), dofs.len());
        debug_assert_eq!(block.ncols(), dofs.len());
        for (i, &di) in dofs.iter().enumerate() {
            for (j, &dj) in dofs.iter().enumerate() {
                self.add(di, dj, block[(i, j)]);
            }
        }
    }

    /// Convert to CSR format for the iterative solver
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);
        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }
        CsrMatrix::from(&coo)
    }

    /// Convert to a dense matrix
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.size, self.size);
        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }
        mat
    }

    /// Number of raw (pre-summation) entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Raw (row, col, value) entries; duplicates not yet summed
    pub fn entries(&self) -> &[(usize, usize, f64)] {
        &self.entries
    }
}

/// Sparse matrix-vector multiplication
#[inline]
pub fn sparse_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut y = DVector::zeros(n);

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..n {
        let mut sum = 0.0;
        for idx in row_offsets[row]..row_offsets[row + 1] {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }
    y
}

/// Solve a sparse SPD system with Jacobi-preconditioned Conjugate Gradient.
///
/// Returns `None` on breakdown (indefinite or singular system) or when the
/// residual has not met `tol` within `max_iter` iterations.
pub fn solve_pcg(
    csr: &CsrMatrix<f64>,
    b: &DVector<f64>,
    tol: f64,
    max_iter: usize,
) -> Option<DVector<f64>> {
    let n = csr.nrows();

    // Jacobi (diagonal) preconditioner
    let mut diag: DVector<f64> = DVector::zeros(n);
    for (row, col, &val) in csr.triplet_iter() {
        if row == col {
            diag[row] += val;
        }
    }
    for i in 0..n {
        if diag[i].abs() < 1e-300 {
            return None;
        }
    }

    let b_norm = b.norm();
    if b_norm == 0.0 {
        return Some(DVector::zeros(n));
    }
    let target = tol * b_norm;

    let mut x = DVector::zeros(n);
    let mut r = b.clone();
    let mut z = r.component_div(&diag);
    let mut p = z.clone();
    let mut r_dot_z = r.dot(&z);

    for _iter in 0..max_iter {
        let ap = sparse_matvec(csr, &p);
        let p_dot_ap = p.dot(&ap);

        if p_dot_ap <= 0.0 {
            // Not positive definite along this direction
            return None;
        }

        let alpha = r_dot_z / p_dot_ap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        if r.norm() < target {
            return Some(x);
        }

        z = r.component_div(&diag);
        let r_dot_z_new = r.dot(&z);
        let beta = r_dot_z_new / r_dot_z;
        r_dot_z = r_dot_z_new;

        p = &z + beta * p;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplet_accumulation() {
        let mut builder = TripletMatrix::new(3);
        builder.add(0, 0, 2.0);
        builder.add(0, 0, 3.0);
        builder.add(1, 2, 1.5);

        let dense = builder.to_dense();
        assert!((dense[(0, 0)] - 5.0).abs() < 1e-12);
        assert!((dense[(1, 2)] - 1.5).abs() < 1e-12);
        assert!((dense[(2, 2)]).abs() < 1e-12);
    }

    #[test]
    fn test_pcg_solve() {
        // Simple SPD system
        let mut builder = TripletMatrix::new(3);
        builder.add(0, 0, 4.0);
        builder.add(0, 1, -1.0);
        builder.add(1, 0, -1.0);
        builder.add(1, 1, 4.0);
        builder.add(1, 2, -1.0);
        builder.add(2, 1, -1.0);
        builder.add(2, 2, 4.0);

        let csr = builder.to_csr();
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);

        let x = solve_pcg(&csr, &b, 1e-12, 100).unwrap();
        let residual = (&sparse_matvec(&csr, &x) - &b).norm();
        assert!(residual < 1e-8, "residual {residual}");
    }

    #[test]
    fn test_pcg_rejects_indefinite() {
        let mut builder = TripletMatrix::new(2);
        builder.add(0, 0, 1.0);
        builder.add(1, 1, -1.0);

        let csr = builder.to_csr();
        let b = DVector::from_vec(vec![1.0, 1.0]);
        assert!(solve_pcg(&csr, &b, 1e-10, 50).is_none());
    }
}
