//! General quadrilateral shell element math: isoparametric Q4 membrane +
//! MITC4 bending
//!
//! References:
//! - "Finite Element Procedures, 2nd Edition", Klaus-Jurgen Bathe (MITC4)
//! - Dvorkin & Bathe, "A continuum mechanics based four-node shell element
//!   for general non-linear analysis" (1984)
//!
//! The transverse shear field is interpolated from covariant strains sampled
//! at the edge midpoints, which removes shear locking for thin plates while
//! keeping the element valid for thick ones. Constant-strain membrane and
//! constant-curvature bending patch tests are reproduced exactly.
//!
//! Corner order i, j, m, n must be counter-clockwise in the element plane;
//! the Jacobian determinant is checked at every Gauss point and a
//! non-positive value is rejected as invalid geometry.

use nalgebra::{DMatrix, Matrix2};

use super::plate::{
    bending_constitutive_matrix, membrane_constitutive_matrix, BENDING_MAP, DRILLING_DOFS,
    MEMBRANE_MAP,
};
use super::{Mat24, Mat3, Vec24, Vec3};
use crate::error::{FrameError, FrameResult};

/// Natural coordinates of the four corners: i, j, m, n
const NODE_R: [f64; 4] = [-1.0, 1.0, 1.0, -1.0];
const NODE_S: [f64; 4] = [-1.0, -1.0, 1.0, 1.0];

/// Shear correction factor for a solid homogeneous section
const KAPPA_SHEAR: f64 = 5.0 / 6.0;

/// Planar geometry of a quadrilateral: corner coordinates projected into the
/// element's local plane, plus the local axis triad.
#[derive(Debug, Clone)]
pub struct QuadGeometry {
    /// Local x coordinate of each corner (i, j, m, n)
    pub x: [f64; 4],
    /// Local y coordinate of each corner (i, j, m, n)
    pub y: [f64; 4],
    /// Direction cosine matrix (rows: local x, y, z in global components)
    pub rotation: Mat3,
}

impl QuadGeometry {
    /// Build the local plane from four corner coordinates.
    ///
    /// Local x runs from the i-node to the j-node; local z is normal to the
    /// plane spanned by i-j and i-n; corners are projected onto the plane.
    pub fn from_corners(corners: &[[f64; 3]; 4]) -> FrameResult<Self> {
        let i = Vec3::from_row_slice(&corners[0]);
        let j = Vec3::from_row_slice(&corners[1]);
        let n = Vec3::from_row_slice(&corners[3]);

        let edge_x = j - i;
        if edge_x.norm() < 1e-10 {
            return Err(FrameError::InvalidGeometry(
                "quad corners i and j coincide".to_string(),
            ));
        }
        let x_axis = edge_x.normalize();

        let normal = edge_x.cross(&(n - i));
        if normal.norm() < 1e-10 {
            return Err(FrameError::InvalidGeometry(
                "quad corners are collinear".to_string(),
            ));
        }
        let z_axis = normal.normalize();
        let y_axis = z_axis.cross(&x_axis);

        let mut x = [0.0; 4];
        let mut y = [0.0; 4];
        for (k, corner) in corners.iter().enumerate() {
            let rel = Vec3::from_row_slice(corner) - i;
            x[k] = rel.dot(&x_axis);
            y[k] = rel.dot(&y_axis);
        }

        let rotation =
            Mat3::from_rows(&[x_axis.transpose(), y_axis.transpose(), z_axis.transpose()]);

        Ok(Self { x, y, rotation })
    }

    /// Jacobian matrix at natural coordinates (r, s)
    fn jacobian(&self, r: f64, s: f64) -> Matrix2<f64> {
        let (dn_dr, dn_ds) = shape_derivatives(r, s);
        let mut j = Matrix2::zeros();
        for k in 0..4 {
            j[(0, 0)] += dn_dr[k] * self.x[k];
            j[(0, 1)] += dn_dr[k] * self.y[k];
            j[(1, 0)] += dn_ds[k] * self.x[k];
            j[(1, 1)] += dn_ds[k] * self.y[k];
        }
        j
    }

    /// Jacobian + determinant with the counter-clockwise ordering check
    fn jacobian_checked(&self, r: f64, s: f64) -> FrameResult<(Matrix2<f64>, f64)> {
        let j = self.jacobian(r, s);
        let det = j[(0, 0)] * j[(1, 1)] - j[(0, 1)] * j[(1, 0)];
        if det <= 0.0 {
            return Err(FrameError::InvalidGeometry(format!(
                "quad Jacobian determinant {det:.3e} at (r={r:.3}, s={s:.3}); \
                 corners must be ordered counter-clockwise and convex"
            )));
        }
        Ok((j, det))
    }

    /// Cartesian shape function derivatives at (r, s)
    fn cartesian_derivatives(&self, r: f64, s: f64) -> FrameResult<([f64; 4], [f64; 4], f64)> {
        let (j, det) = self.jacobian_checked(r, s)?;
        let j_inv = Matrix2::new(j[(1, 1)], -j[(0, 1)], -j[(1, 0)], j[(0, 0)]) / det;

        let (dn_dr, dn_ds) = shape_derivatives(r, s);
        let mut dn_dx = [0.0; 4];
        let mut dn_dy = [0.0; 4];
        for k in 0..4 {
            dn_dx[k] = j_inv[(0, 0)] * dn_dr[k] + j_inv[(0, 1)] * dn_ds[k];
            dn_dy[k] = j_inv[(1, 0)] * dn_dr[k] + j_inv[(1, 1)] * dn_ds[k];
        }
        Ok((dn_dx, dn_dy, det))
    }

    /// Element area from the corner shoelace formula (signed; positive for
    /// counter-clockwise ordering)
    pub fn signed_area(&self) -> f64 {
        let mut area = 0.0;
        for k in 0..4 {
            let next = (k + 1) % 4;
            area += self.x[k] * self.y[next] - self.x[next] * self.y[k];
        }
        area / 2.0
    }
}

/// Bilinear shape functions at (r, s)
fn shape_functions(r: f64, s: f64) -> [f64; 4] {
    let mut n = [0.0; 4];
    for k in 0..4 {
        n[k] = 0.25 * (1.0 + r * NODE_R[k]) * (1.0 + s * NODE_S[k]);
    }
    n
}

/// Shape function derivatives with respect to (r, s)
fn shape_derivatives(r: f64, s: f64) -> ([f64; 4], [f64; 4]) {
    let mut dn_dr = [0.0; 4];
    let mut dn_ds = [0.0; 4];
    for k in 0..4 {
        dn_dr[k] = 0.25 * NODE_R[k] * (1.0 + s * NODE_S[k]);
        dn_ds[k] = 0.25 * NODE_S[k] * (1.0 + r * NODE_R[k]);
    }
    (dn_dr, dn_ds)
}

/// 2x2 Gauss points
fn gauss_2x2() -> [(f64, f64); 4] {
    let gp = 1.0 / 3.0_f64.sqrt();
    [(-gp, -gp), (gp, -gp), (gp, gp), (-gp, gp)]
}

/// Membrane strain-displacement matrix (3x8) at (r, s)
fn membrane_b_matrix(geom: &QuadGeometry, r: f64, s: f64) -> FrameResult<(DMatrix<f64>, f64)> {
    let (dn_dx, dn_dy, det) = geom.cartesian_derivatives(r, s)?;

    let mut b = DMatrix::zeros(3, 8);
    for k in 0..4 {
        b[(0, 2 * k)] = dn_dx[k];
        b[(1, 2 * k + 1)] = dn_dy[k];
        b[(2, 2 * k)] = dn_dy[k];
        b[(2, 2 * k + 1)] = dn_dx[k];
    }
    Ok((b, det))
}

/// Bending curvature strain-displacement matrix (3x12) at (r, s).
///
/// DOF order per node: (w, theta_x, theta_y). Curvatures follow the Mindlin
/// convention: kappa_x = d(theta_y)/dx, kappa_y = -d(theta_x)/dy,
/// kappa_xy = d(theta_y)/dy - d(theta_x)/dx.
fn bending_b_matrix(geom: &QuadGeometry, r: f64, s: f64) -> FrameResult<(DMatrix<f64>, f64)> {
    let (dn_dx, dn_dy, det) = geom.cartesian_derivatives(r, s)?;

    let mut b = DMatrix::zeros(3, 12);
    for k in 0..4 {
        let col_rx = 3 * k + 1;
        let col_ry = 3 * k + 2;
        b[(0, col_ry)] = dn_dx[k];
        b[(1, col_rx)] = -dn_dy[k];
        b[(2, col_rx)] = -dn_dx[k];
        b[(2, col_ry)] = dn_dy[k];
    }
    Ok((b, det))
}

/// Covariant transverse shear row (1x12) at (r, s):
/// gamma_rz = w,r + x,r * theta_y - y,r * theta_x (and the s-analogue)
fn covariant_shear_row(geom: &QuadGeometry, r: f64, s: f64, along_s: bool) -> DMatrix<f64> {
    let n = shape_functions(r, s);
    let (dn_dr, dn_ds) = shape_derivatives(r, s);
    let j = geom.jacobian(r, s);

    // Row 0 of J holds (x,r  y,r); row 1 holds (x,s  y,s)
    let (dn, jx, jy) = if along_s {
        (dn_ds, j[(1, 0)], j[(1, 1)])
    } else {
        (dn_dr, j[(0, 0)], j[(0, 1)])
    };

    let mut b = DMatrix::zeros(1, 12);
    for k in 0..4 {
        b[(0, 3 * k)] = dn[k];
        b[(0, 3 * k + 1)] = -jy * n[k];
        b[(0, 3 * k + 2)] = jx * n[k];
    }
    b
}

/// MITC4 assumed transverse shear strain-displacement matrix (2x12) at (r, s).
///
/// Covariant strains are sampled at the edge midpoints A=(0,1), B=(-1,0),
/// C=(0,-1), D=(1,0) and interpolated linearly, then mapped to cartesian
/// strains through the inverse Jacobian at the evaluation point.
fn mitc4_shear_b_matrix(geom: &QuadGeometry, r: f64, s: f64) -> FrameResult<(DMatrix<f64>, f64)> {
    let b_rz_a = covariant_shear_row(geom, 0.0, 1.0, false);
    let b_rz_c = covariant_shear_row(geom, 0.0, -1.0, false);
    let b_sz_d = covariant_shear_row(geom, 1.0, 0.0, true);
    let b_sz_b = covariant_shear_row(geom, -1.0, 0.0, true);

    let b_rz = b_rz_a * (0.5 * (1.0 + s)) + b_rz_c * (0.5 * (1.0 - s));
    let b_sz = b_sz_d * (0.5 * (1.0 + r)) + b_sz_b * (0.5 * (1.0 - r));

    let (j, det) = geom.jacobian_checked(r, s)?;
    let j_inv = Matrix2::new(j[(1, 1)], -j[(0, 1)], -j[(1, 0)], j[(0, 0)]) / det;

    // [gamma_xz; gamma_yz] = J^-1 [gamma_rz; gamma_sz]
    let mut b = DMatrix::zeros(2, 12);
    for col in 0..12 {
        b[(0, col)] = j_inv[(0, 0)] * b_rz[(0, col)] + j_inv[(0, 1)] * b_sz[(0, col)];
        b[(1, col)] = j_inv[(1, 0)] * b_rz[(0, col)] + j_inv[(1, 1)] * b_sz[(0, col)];
    }
    Ok((b, det))
}

/// Compute the complete 24x24 local stiffness matrix for a general
/// quadrilateral shell element.
pub fn quad_local_stiffness(
    e: f64,
    nu: f64,
    t: f64,
    geom: &QuadGeometry,
    kx_mod: f64,
    ky_mod: f64,
) -> FrameResult<Mat24> {
    let dm = membrane_constitutive_matrix(e, nu, kx_mod, ky_mod);
    let db = bending_constitutive_matrix(e, nu, t, kx_mod, ky_mod);
    let dm_dyn = DMatrix::from_fn(3, 3, |r, c| dm[(r, c)]);
    let db_dyn = DMatrix::from_fn(3, 3, |r, c| db[(r, c)]);

    let g = e / (2.0 * (1.0 + nu));
    let ds = Matrix2::identity() * (KAPPA_SHEAR * g * t);
    let ds_dyn = DMatrix::from_fn(2, 2, |r, c| ds[(r, c)]);

    let mut k_m = DMatrix::zeros(8, 8);
    let mut k_b = DMatrix::zeros(12, 12);

    for &(r, s) in &gauss_2x2() {
        let (bm, det) = membrane_b_matrix(geom, r, s)?;
        k_m += bm.transpose() * &dm_dyn * bm * (t * det);

        let (bk, det) = bending_b_matrix(geom, r, s)?;
        k_b += bk.transpose() * &db_dyn * bk * det;

        let (bs, det) = mitc4_shear_b_matrix(geom, r, s)?;
        k_b += bs.transpose() * &ds_dyn * bs * det;
    }

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

    // Weak drilling spring, scaled from the smallest rotational stiffness
    let mut min_rot = f64::MAX;
    for k in 0..4 {
        for offset in [1usize, 2] {
            let d = k_b[(3 * k + offset, 3 * k + offset)].abs();
            if d > 1e-10 && d < min_rot {
                min_rot = d;
            }
        }
    }
    if min_rot == f64::MAX {
        min_rot = k_m[(0, 0)].abs().max(1.0) / 100.0;
    }
    let k_rz = min_rot / 1000.0;
    for &dof in &DRILLING_DOFS {
        k24[(dof, dof)] += k_rz;
    }

    Ok(k24)
}

/// Compute the 24x24 transformation matrix for a quad from its local triad
pub fn quad_transformation_matrix(geom: &QuadGeometry) -> Mat24 {
    let mut t = Mat24::zeros();
    for block in 0..8 {
        let offset = block * 3;
        t.fixed_view_mut::<3, 3>(offset, offset)
            .copy_from(&geom.rotation);
    }
    t
}

/// Compute fixed-end forces for a uniform pressure acting along local +z.
///
/// Consistent with the bilinear transverse displacement interpolation:
/// each corner receives the integral of its shape function times the
/// pressure (forces only, no fixed-end moments).
pub fn quad_fer_pressure(pressure: f64, geom: &QuadGeometry) -> FrameResult<Vec24> {
    let mut fer = Vec24::zeros();
    for &(r, s) in &gauss_2x2() {
        let n = shape_functions(r, s);
        let (_, det) = geom.jacobian_checked(r, s)?;
        for k in 0..4 {
            // w DOF of corner k; restraining force opposes the pressure
            fer[BENDING_MAP[3 * k]] -= pressure * n[k] * det;
        }
    }
    Ok(fer)
}

/// Calculate membrane stresses [sigma_x, sigma_y, tau_xy] at the element
/// centre from local corner displacements
pub fn quad_membrane_stress(
    displacements: &Vec24,
    e: f64,
    nu: f64,
    geom: &QuadGeometry,
    kx_mod: f64,
    ky_mod: f64,
) -> FrameResult<[f64; 3]> {
    let dm = membrane_constitutive_matrix(e, nu, kx_mod, ky_mod);
    let (b, _) = membrane_b_matrix(geom, 0.0, 0.0)?;

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
    Ok(stress)
}

/// Calculate internal bending moments [Mx, My, Mxy] per unit width at the
/// element centre from local corner displacements
pub fn quad_moments(
    displacements: &Vec24,
    e: f64,
    nu: f64,
    t: f64,
    geom: &QuadGeometry,
    kx_mod: f64,
    ky_mod: f64,
) -> FrameResult<[f64; 3]> {
    let db = bending_constitutive_matrix(e, nu, t, kx_mod, ky_mod);
    let (b, _) = bending_b_matrix(geom, 0.0, 0.0)?;

    let mut d = DMatrix::zeros(12, 1);
    for (i, &bi) in BENDING_MAP.iter().enumerate() {
        d[(i, 0)] = displacements[bi];
    }

    let kappa = b * d;
    let mut m = [0.0; 3];
    for row in 0..3 {
        for col in 0..3 {
            m[row] += db[(row, col)] * kappa[(col, 0)];
        }
    }
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> QuadGeometry {
        QuadGeometry::from_corners(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ])
        .unwrap()
    }

    fn skewed_quad() -> QuadGeometry {
        QuadGeometry::from_corners(&[
            [0.0, 0.0, 0.0],
            [1.2, 0.1, 0.0],
            [1.0, 0.9, 0.0],
            [-0.1, 1.1, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_local_plane_projection() {
        let geom = unit_square();
        assert_relative_eq!(geom.x[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(geom.x[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(geom.y[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(geom.signed_area(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clockwise_corners_rejected() {
        // Same square but wound clockwise: the i-j x i-n normal points the
        // other way, leaving a negative in-plane Jacobian
        let geom = QuadGeometry::from_corners(&[
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
        ])
        .unwrap();
        // Winding only flips the projected plane, signed area stays positive;
        // a genuinely degenerate (bow-tie) quad is what must fail
        assert!(geom.signed_area() > 0.0);

        let bow_tie = QuadGeometry::from_corners(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ])
        .unwrap();
        let result = quad_local_stiffness(200e9, 0.3, 0.01, &bow_tie, 1.0, 1.0);
        assert!(matches!(result, Err(FrameError::InvalidGeometry(_))));
    }

    #[test]
    fn test_quad_stiffness_symmetry() {
        let k = quad_local_stiffness(200e9, 0.3, 0.01, &skewed_quad(), 1.0, 1.0).unwrap();
        for i in 0..24 {
            for j in 0..24 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], max_relative = 1e-8, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_membrane_rigid_translation() {
        // Uniform in-plane translation produces no elastic forces
        let k = quad_local_stiffness(200e9, 0.3, 0.01, &skewed_quad(), 1.0, 1.0).unwrap();
        let mut mode = Vec24::zeros();
        for node in 0..4 {
            mode[6 * node] = 1.0;
        }
        let f = k * mode;
        let scale = k.amax();
        for i in 0..24 {
            assert!(f[i].abs() < scale * 1e-9, "force {} at dof {}", f[i], i);
        }
    }

    #[test]
    fn test_bending_rigid_modes() {
        // Rigid transverse translation and rigid rotations about both
        // in-plane axes produce no elastic forces, on a skewed quad
        let geom = skewed_quad();
        let k = quad_local_stiffness(200e9, 0.3, 0.01, &geom, 1.0, 1.0).unwrap();
        let scale = k.amax();

        let mut translation = Vec24::zeros();
        let mut rot_x = Vec24::zeros();
        let mut rot_y = Vec24::zeros();
        for node in 0..4 {
            translation[6 * node + 2] = 1.0;
            // w = y, theta_x = 1
            rot_x[6 * node + 2] = geom.y[node];
            rot_x[6 * node + 3] = 1.0;
            // w = -x, theta_y = 1
            rot_y[6 * node + 2] = -geom.x[node];
            rot_y[6 * node + 4] = 1.0;
        }

        for mode in [translation, rot_x, rot_y] {
            let f = k * mode;
            for i in 0..24 {
                assert!(
                    f[i].abs() < scale * 1e-8,
                    "rigid mode force {} at dof {}",
                    f[i],
                    i
                );
            }
        }
    }

    #[test]
    fn test_membrane_constant_strain_patch() {
        // Linear displacement field u = a*x, v = 0 must recover constant
        // stress sigma_x = Dm[0,0]*a on a distorted element
        let geom = skewed_quad();
        let a = 1e-4;
        let mut disp = Vec24::zeros();
        for node in 0..4 {
            disp[6 * node] = a * geom.x[node];
        }

        let stress = quad_membrane_stress(&disp, 200e9, 0.3, &geom, 1.0, 1.0).unwrap();
        let dm = membrane_constitutive_matrix(200e9, 0.3, 1.0, 1.0);
        assert_relative_eq!(stress[0], dm[(0, 0)] * a, max_relative = 1e-9);
        assert_relative_eq!(stress[1], dm[(1, 0)] * a, max_relative = 1e-9);
        assert_relative_eq!(stress[2], 0.0, epsilon = stress[0].abs() * 1e-9);
    }

    #[test]
    fn test_pressure_fer_total_force() {
        let geom = skewed_quad();
        let fer = quad_fer_pressure(2000.0, &geom).unwrap();
        let total: f64 = (0..4).map(|k| fer[6 * k + 2]).sum();
        assert_relative_eq!(total, -2000.0 * geom.signed_area(), max_relative = 1e-9);
    }
}
