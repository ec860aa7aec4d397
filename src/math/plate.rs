//! Rectangular plate element math: Q4 membrane + Kirchhoff (MZC) bending
//!
//! References:
//! - "Finite Element Procedures, 2nd Edition", Klaus-Jurgen Bathe
//! - Melosh/Zienkiewicz/Cheung 12-term rectangular plate bending element
//!
//! The element couples:
//! - membrane (in-plane) stiffness from a 4-node isoparametric quad with
//!   2x2 Gauss integration
//! - thin-plate bending stiffness from the 12-term polynomial displacement
//!   field, k_b = inv(C)^T (integral of Q^T Db Q) inv(C)
//! - a weak drilling spring so the 24x24 matrix has no zero diagonal
//!
//! Node layout in local coordinates: i=(0,0), j=(w,0), m=(w,h), n=(0,h),
//! 6 DOFs per node, 24x24 total.

use nalgebra::{DMatrix, Matrix3};

use super::{Mat24, Mat3, Vec24, Vec3};

/// Compute the membrane constitutive matrix [Dm] for plane stress.
///
/// Stiffness modifiers make the matrix mildly orthotropic; the coupling term
/// uses the geometric mean of the two moduli so the matrix stays symmetric
/// (and reduces to the classical plane-stress matrix when both are 1).
pub(crate) fn membrane_constitutive_matrix(e: f64, nu: f64, kx_mod: f64, ky_mod: f64) -> Mat3 {
    let ex = e * kx_mod;
    let ey = e * ky_mod;
    let exy = (ex * ey).sqrt();
    let g = e / (2.0 * (1.0 + nu));
    let denom = 1.0 - nu * nu;

    Matrix3::new(
        ex / denom,
        nu * exy / denom,
        0.0,
        nu * exy / denom,
        ey / denom,
        0.0,
        0.0,
        0.0,
        g,
    )
}

/// Compute the bending constitutive matrix [Db] for plate bending (orthotropic)
pub(crate) fn bending_constitutive_matrix(
    e: f64,
    nu: f64,
    t: f64,
    kx_mod: f64,
    ky_mod: f64,
) -> Mat3 {
    let t3_12 = t.powi(3) / 12.0;
    membrane_constitutive_matrix(e, nu, kx_mod, ky_mod) * t3_12
}

/// The 12-term plate bending polynomial basis evaluated at (x, y)
fn bending_basis(x: f64, y: f64) -> [f64; 12] {
    [
        1.0,
        x,
        y,
        x * x,
        x * y,
        y * y,
        x * x * x,
        x * x * y,
        x * y * y,
        y * y * y,
        x * x * x * y,
        x * y * y * y,
    ]
}

/// d(basis)/dx
fn bending_basis_dx(x: f64, y: f64) -> [f64; 12] {
    [
        0.0,
        1.0,
        0.0,
        2.0 * x,
        y,
        0.0,
        3.0 * x * x,
        2.0 * x * y,
        y * y,
        0.0,
        3.0 * x * x * y,
        y * y * y,
    ]
}

/// d(basis)/dy
fn bending_basis_dy(x: f64, y: f64) -> [f64; 12] {
    [
        0.0,
        0.0,
        1.0,
        0.0,
        x,
        2.0 * y,
        0.0,
        x * x,
        2.0 * x * y,
        3.0 * y * y,
        x * x * x,
        3.0 * x * y * y,
    ]
}

/// Curvature rows [-d2p/dx2; -d2p/dy2; -2*d2p/dxdy] of the basis at (x, y)
fn curvature_matrix(x: f64, y: f64) -> DMatrix<f64> {
    let dxx = [
        0.0,
        0.0,
        0.0,
        2.0,
        0.0,
        0.0,
        6.0 * x,
        2.0 * y,
        0.0,
        0.0,
        6.0 * x * y,
        0.0,
    ];
    let dyy = [
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        2.0,
        0.0,
        0.0,
        2.0 * x,
        6.0 * y,
        0.0,
        6.0 * x * y,
    ];
    let dxy = [
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
        0.0,
        2.0 * x,
        2.0 * y,
        0.0,
        3.0 * x * x,
        3.0 * y * y,
    ];

    let mut q = DMatrix::zeros(3, 12);
    for k in 0..12 {
        q[(0, k)] = -dxx[k];
        q[(1, k)] = -dyy[k];
        q[(2, k)] = -2.0 * dxy[k];
    }
    q
}

/// Displacement coefficient matrix [C] mapping polynomial coefficients to
/// nodal DOFs (w, theta_x = dw/dy, theta_y = -dw/dx at each corner)
fn coefficient_matrix(width: f64, height: f64) -> DMatrix<f64> {
    let corners = [
        (0.0, 0.0),
        (width, 0.0),
        (width, height),
        (0.0, height),
    ];

    let mut c = DMatrix::zeros(12, 12);
    for (node, &(x, y)) in corners.iter().enumerate() {
        let p = bending_basis(x, y);
        let px = bending_basis_dx(x, y);
        let py = bending_basis_dy(x, y);
        for k in 0..12 {
            c[(3 * node, k)] = p[k];
            c[(3 * node + 1, k)] = py[k];
            c[(3 * node + 2, k)] = -px[k];
        }
    }
    c
}

/// 3-point Gauss-Legendre abscissae/weights on [-1, 1]
const GAUSS_3: [(f64, f64); 3] = [
    (-0.774_596_669_241_483_4, 0.555_555_555_555_555_6),
    (0.0, 0.888_888_888_888_888_9),
    (0.774_596_669_241_483_4, 0.555_555_555_555_555_6),
];

/// Compute the 12x12 Kirchhoff bending stiffness for a rectangular plate
/// (DOFs: w, rx, ry at each corner)
fn bending_stiffness(e: f64, nu: f64, t: f64, width: f64, height: f64, kx: f64, ky: f64) -> DMatrix<f64> {
    let db = bending_constitutive_matrix(e, nu, t, kx, ky);
    let db_dyn = DMatrix::from_fn(3, 3, |r, c| db[(r, c)]);

    // k_a = integral of Q^T Db Q over the plate; the integrand is degree 4,
    // 3-point Gauss per direction integrates it exactly
    let mut k_a = DMatrix::zeros(12, 12);
    for &(xi, wx) in &GAUSS_3 {
        for &(eta, wy) in &GAUSS_3 {
            let x = width * (xi + 1.0) / 2.0;
            let y = height * (eta + 1.0) / 2.0;
            let q = curvature_matrix(x, y);
            let scale = wx * wy * (width / 2.0) * (height / 2.0);
            k_a += q.transpose() * &db_dyn * q * scale;
        }
    }

    let c = coefficient_matrix(width, height);
    let c_inv = c
        .try_inverse()
        .expect("plate coefficient matrix is invertible for positive dimensions");

    c_inv.transpose() * k_a * c_inv
}

/// Shape function derivatives for the 4-node membrane quad at natural (r, s)
fn membrane_shape_derivatives(width: f64, height: f64, r: f64, s: f64) -> ([f64; 4], [f64; 4]) {
    // dN/dr, dN/ds for N_i = (1 +/- r)(1 +/- s)/4, mapped through the
    // (constant) rectangular Jacobian
    let dn_dr = [
        -(1.0 - s) / 4.0,
        (1.0 - s) / 4.0,
        (1.0 + s) / 4.0,
        -(1.0 + s) / 4.0,
    ];
    let dn_ds = [
        -(1.0 - r) / 4.0,
        -(1.0 + r) / 4.0,
        (1.0 + r) / 4.0,
        (1.0 - r) / 4.0,
    ];

    let mut dn_dx = [0.0; 4];
    let mut dn_dy = [0.0; 4];
    for i in 0..4 {
        dn_dx[i] = dn_dr[i] * 2.0 / width;
        dn_dy[i] = dn_ds[i] * 2.0 / height;
    }
    (dn_dx, dn_dy)
}

/// Membrane strain-displacement matrix [B_m] (3x8) at natural (r, s)
fn membrane_b_matrix(width: f64, height: f64, r: f64, s: f64) -> DMatrix<f64> {
    let (dn_dx, dn_dy) = membrane_shape_derivatives(width, height, r, s);

    let mut b = DMatrix::zeros(3, 8);
    for i in 0..4 {
        b[(0, 2 * i)] = dn_dx[i];
        b[(1, 2 * i + 1)] = dn_dy[i];
        b[(2, 2 * i)] = dn_dy[i];
        b[(2, 2 * i + 1)] = dn_dx[i];
    }
    b
}

/// Compute the 8x8 plane-stress membrane stiffness (DOFs: u, v at each corner)
fn membrane_stiffness(e: f64, nu: f64, t: f64, width: f64, height: f64, kx: f64, ky: f64) -> DMatrix<f64> {
    let dm = membrane_constitutive_matrix(e, nu, kx, ky);
    let dm_dyn = DMatrix::from_fn(3, 3, |r, c| dm[(r, c)]);

    let gp = 1.0 / 3.0_f64.sqrt();
    let det_j = width * height / 4.0;

    let mut k = DMatrix::zeros(8, 8);
    for &(r, s) in &[(-gp, -gp), (gp, -gp), (gp, gp), (-gp, gp)] {
        let b = membrane_b_matrix(width, height, r, s);
        k += b.transpose() * &dm_dyn * b * (t * det_j);
    }
    k
}

/// Mapping of membrane DOFs (u, v per node) into the 24-DOF element vector
pub(crate) const MEMBRANE_MAP: [usize; 8] = [0, 1, 6, 7, 12, 13, 18, 19];
/// Mapping of bending DOFs (w, rx, ry per node) into the 24-DOF element vector
pub(crate) const BENDING_MAP: [usize; 12] = [2, 3, 4, 8, 9, 10, 14, 15, 16, 20, 21, 22];
/// Drilling DOFs (rz per node) in the 24-DOF element vector
pub(crate) const DRILLING_DOFS: [usize; 4] = [5, 11, 17, 23];

/// Compute the complete 24x24 local stiffness matrix for a rectangular plate.
///
/// DOF order per node: [DX, DY, DZ, RX, RY, RZ], nodes i, j, m, n counter-
/// clockwise with i-j along local x.
pub fn plate_local_stiffness(
    e: f64,
    nu: f64,
    t: f64,
    width: f64,
    height: f64,
    kx_mod: f64,
    ky_mod: f64,
) -> Mat24 {
    let k_m = membrane_stiffness(e, nu, t, width, height, kx_mod, ky_mod);
    let k_b = bending_stiffness(e, nu, t, width, height, kx_mod, ky_mod);

    let mut k24 = Mat24::zeros();
    for (i, &mi) in MEMBRANE_MAP.iter().enumerate() {
        for (j, &mj) in MEMBRANE_MAP.iter().enumerate() {
            k24[(mi, mj)] = k_m[(i, j)];
        }
    }
    for (i, &bi) in BENDING_MAP.iter().enumerate() {
        for (j, &bj) in BENDING_MAP.iter().enumerate() {
            k24[(bi, bj)] += k_b[(i, j)];
        }
    }

    // Weak spring on the drilling DOF so the element matrix is nonsingular
    // in its own plane
    let mut min_rot = f64::MAX;
    for i in [1usize, 2, 4, 5, 7, 8, 10, 11] {
        let d = k_b[(i, i)].abs();
        if d > 1e-10 && d < min_rot {
            min_rot = d;
        }
    }
    if min_rot == f64::MAX {
        min_rot = k_m[(0, 0)].abs().max(1.0) / 100.0;
    }
    let k_rz = min_rot / 1000.0;
    for &dof in &DRILLING_DOFS {
        k24[(dof, dof)] += k_rz;
    }

    k24
}

/// Compute the transformation matrix for a plate element.
///
/// The local system is: x from the i-node to the j-node, z normal to the
/// plate (x cross the i-n edge), y completing the triad. Eight diagonal 3x3
/// blocks build the 24x24 matrix.
pub fn plate_transformation_matrix(
    i_node: &[f64; 3],
    j_node: &[f64; 3],
    n_node: &[f64; 3],
) -> Mat24 {
    let i = Vec3::from_row_slice(i_node);
    let j = Vec3::from_row_slice(j_node);
    let n = Vec3::from_row_slice(n_node);

    let x = (j - i).normalize();
    let z = x.cross(&(n - i)).normalize();
    let y = z.cross(&x);

    let r = Mat3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);

    let mut t = Mat24::zeros();
    for block in 0..8 {
        let offset = block * 3;
        t.fixed_view_mut::<3, 3>(offset, offset).copy_from(&r);
    }
    t
}

/// Compute fixed-end forces for a uniform pressure acting along local +z.
///
/// Consistent load vector of the 12-term bending field, expanded to the
/// 24-DOF element ordering.
pub fn plate_fer_pressure(pressure: f64, width: f64, height: f64) -> Vec24 {
    let area = width * height;
    let p = pressure;

    // Per-node (w, rx, ry) pattern; signs follow the corner positions
    let fer_bending = [
        -p * area / 4.0,
        -p * area * height / 24.0,
        p * area * width / 24.0,
        -p * area / 4.0,
        -p * area * height / 24.0,
        -p * area * width / 24.0,
        -p * area / 4.0,
        p * area * height / 24.0,
        -p * area * width / 24.0,
        -p * area / 4.0,
        p * area * height / 24.0,
        p * area * width / 24.0,
    ];

    let mut fer = Vec24::zeros();
    for (i, &bi) in BENDING_MAP.iter().enumerate() {
        fer[bi] = fer_bending[i];
    }
    fer
}

/// Calculate internal bending moments [Mx, My, Mxy] per unit width at a point
/// in the plate (local coordinates, 0..width and 0..height).
pub fn plate_moments(
    x: f64,
    y: f64,
    displacements: &Vec24,
    e: f64,
    nu: f64,
    t: f64,
    width: f64,
    height: f64,
    kx_mod: f64,
    ky_mod: f64,
) -> [f64; 3] {
    let db = bending_constitutive_matrix(e, nu, t, kx_mod, ky_mod);

    // Recover the polynomial coefficients from the bending DOFs, then
    // evaluate curvatures at the requested point
    let mut d = DMatrix::zeros(12, 1);
    for (i, &bi) in BENDING_MAP.iter().enumerate() {
        d[(i, 0)] = displacements[bi];
    }

    let c = coefficient_matrix(width, height);
    let a = c
        .lu()
        .solve(&d)
        .expect("plate coefficient matrix is invertible for positive dimensions");

    let q = curvature_matrix(x, y);
    let kappa = q * a;

    let mut m = [0.0; 3];
    for row in 0..3 {
        for col in 0..3 {
            m[row] += db[(row, col)] * kappa[(col, 0)];
        }
    }
    m
}

/// Calculate membrane stresses [sigma_x, sigma_y, tau_xy] at a point in the
/// plate (local coordinates)
pub fn plate_membrane_stress(
    x: f64,
    y: f64,
    displacements: &Vec24,
    e: f64,
    nu: f64,
    width: f64,
    height: f64,
    kx_mod: f64,
    ky_mod: f64,
) -> [f64; 3] {
    let dm = membrane_constitutive_matrix(e, nu, kx_mod, ky_mod);

    let r = -1.0 + 2.0 * x / width;
    let s = -1.0 + 2.0 * y / height;
    let b = membrane_b_matrix(width, height, r, s);

    let mut d = DMatrix::zeros(8, 1);
    for (i, &mi) in MEMBRANE_MAP.iter().enumerate() {
        d[(i, 0)] = displacements[mi];
    }

    let strain = b * d;
    let mut stress = [0.0; 3];
    for row in 0..3 {
        for col in 0..3 {
            stress[row] += dm[(row, col)] * strain[(col, 0)];
        }
    }
    stress
}
