//! Mathematical utilities for the stiffness formulations

pub mod plate;
pub mod quad;
pub mod sparse;

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3};

pub type DVec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// 12x12 matrix for member/spring stiffness
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for member forces/displacements
pub type Vec12 = SVector<f64, 12>;
/// 24x24 matrix for plate stiffness
pub type Mat24 = SMatrix<f64, 24, 24>;
/// 24-element vector for plate forces/displacements
pub type Vec24 = SVector<f64, 24>;

/// 4-point Gauss-Legendre abscissae/weights on [-1, 1]
const GAUSS_4: [(f64, f64); 4] = [
    (-0.861_136_311_594_052_6, 0.347_854_845_137_453_85),
    (-0.339_981_043_584_856_3, 0.652_145_154_862_546_2),
    (0.339_981_043_584_856_3, 0.652_145_154_862_546_2),
    (0.861_136_311_594_052_6, 0.347_854_845_137_453_85),
];

/// Compute the direction cosine matrix for a 3D frame element.
///
/// Axis convention:
/// - local x runs from the i-node to the j-node
/// - vertical members: local y lies in the global XY plane (-X for a member
///   pointing up, +X pointing down), local z is global Z
/// - horizontal members: local y is global Y, local z completes the triad
/// - inclined members: local z is horizontal and perpendicular to the member,
///   local y completes the triad
/// - `rotation` then rolls y and z about the member axis
pub fn member_rotation_matrix(i_node: &[f64; 3], j_node: &[f64; 3], rotation: f64) -> Mat3 {
    let delta = Vec3::new(
        j_node[0] - i_node[0],
        j_node[1] - i_node[1],
        j_node[2] - i_node[2],
    );
    let length = delta.norm();
    debug_assert!(length > 1e-10, "member orientation undefined for coincident nodes");

    let x = delta / length;

    let (y, z) = if x[0].abs() < 1e-10 && x[2].abs() < 1e-10 {
        // Vertical member
        if x[1] > 0.0 {
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0))
        } else {
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0))
        }
    } else if delta[1].abs() < 1e-10 {
        // Horizontal member
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = x.cross(&y).normalize();
        (y, z)
    } else {
        // Inclined member: z horizontal, perpendicular to the member
        let proj = Vec3::new(delta[0], 0.0, delta[2]);
        let z = if x[1] > 0.0 {
            proj.cross(&x).normalize()
        } else {
            x.cross(&proj).normalize()
        };
        let y = z.cross(&x).normalize();
        (y, z)
    };

    // Roll about the member axis
    let (y, z) = if rotation.abs() > 1e-10 {
        let (sin_r, cos_r) = rotation.sin_cos();
        (y * cos_r + z * sin_r, z * cos_r - y * sin_r)
    } else {
        (y, z)
    };

    Mat3::from_rows(&[x.transpose(), y.transpose(), z.transpose()])
}

/// Compute the 12x12 transformation matrix for a 3D frame element
/// (four copies of the direction cosine matrix on the diagonal)
pub fn member_transformation_matrix(
    i_node: &[f64; 3],
    j_node: &[f64; 3],
    rotation: f64,
) -> Mat12 {
    let r = member_rotation_matrix(i_node, j_node, rotation);

    let mut t = Mat12::zeros();
    for block in 0..4 {
        let offset = block * 3;
        t.fixed_view_mut::<3, 3>(offset, offset).copy_from(&r);
    }
    t
}

/// Compute the local elastic stiffness matrix for a 3D frame element.
///
/// `phi_y` and `phi_z` are the Timoshenko shear parameters
/// `12*E*I / (G*As*L^2)` for bending about local z and y respectively;
/// pass 0.0 for shear-rigid (Euler-Bernoulli) behavior.
pub fn member_local_stiffness(
    e: f64,
    g: f64,
    a: f64,
    iy: f64,
    iz: f64,
    j: f64,
    length: f64,
    phi_y: f64,
    phi_z: f64,
) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;

    let ea_l = e * a / l;
    let gj_l = g * j / l;

    // Bending about local z (displacement in local y), shear-corrected
    let cz = e * iz / (1.0 + phi_y);
    let kz_v = 12.0 * cz / l3;
    let kz_vr = 6.0 * cz / l2;
    let kz_r = (4.0 + phi_y) * cz / l;
    let kz_r2 = (2.0 - phi_y) * cz / l;

    // Bending about local y (displacement in local z)
    let cy = e * iy / (1.0 + phi_z);
    let ky_v = 12.0 * cy / l3;
    let ky_vr = 6.0 * cy / l2;
    let ky_r = (4.0 + phi_z) * cy / l;
    let ky_r2 = (2.0 - phi_z) * cy / l;

    #[rustfmt::skip]
    let data = [
        // Row 0: axial at i
        ea_l,   0.0,    0.0,    0.0,   0.0,    0.0,    -ea_l,  0.0,    0.0,    0.0,   0.0,    0.0,
        // Row 1: shear Fy at i
        0.0,    kz_v,   0.0,    0.0,   0.0,    kz_vr,  0.0,    -kz_v,  0.0,    0.0,   0.0,    kz_vr,
        // Row 2: shear Fz at i
        0.0,    0.0,    ky_v,   0.0,   -ky_vr, 0.0,    0.0,    0.0,    -ky_v,  0.0,   -ky_vr, 0.0,
        // Row 3: torsion at i
        0.0,    0.0,    0.0,    gj_l,  0.0,    0.0,    0.0,    0.0,    0.0,    -gj_l, 0.0,    0.0,
        // Row 4: moment My at i
        0.0,    0.0,    -ky_vr, 0.0,   ky_r,   0.0,    0.0,    0.0,    ky_vr,  0.0,   ky_r2,  0.0,
        // Row 5: moment Mz at i
        0.0,    kz_vr,  0.0,    0.0,   0.0,    kz_r,   0.0,    -kz_vr, 0.0,    0.0,   0.0,    kz_r2,
        // Row 6: axial at j
        -ea_l,  0.0,    0.0,    0.0,   0.0,    0.0,    ea_l,   0.0,    0.0,    0.0,   0.0,    0.0,
        // Row 7: shear Fy at j
        0.0,    -kz_v,  0.0,    0.0,   0.0,    -kz_vr, 0.0,    kz_v,   0.0,    0.0,   0.0,    -kz_vr,
        // Row 8: shear Fz at j
        0.0,    0.0,    -ky_v,  0.0,   ky_vr,  0.0,    0.0,    0.0,    ky_v,   0.0,   ky_vr,  0.0,
        // Row 9: torsion at j
        0.0,    0.0,    0.0,    -gj_l, 0.0,    0.0,    0.0,    0.0,    0.0,    gj_l,  0.0,    0.0,
        // Row 10: moment My at j
        0.0,    0.0,    -ky_vr, 0.0,   ky_r2,  0.0,    0.0,    0.0,    ky_vr,  0.0,   ky_r,   0.0,
        // Row 11: moment Mz at j
        0.0,    kz_vr,  0.0,    0.0,   0.0,    kz_r2,  0.0,    -kz_vr, 0.0,    0.0,   0.0,    kz_r,
    ];

    Mat12::from_row_slice(&data)
}

/// Compute the consistent geometric stiffness matrix for P-Delta analysis.
///
/// `p` is the member axial force, positive in tension. Tension stiffens the
/// transverse response, compression softens it.
pub fn member_geometric_stiffness(p: f64, a: f64, iy: f64, iz: f64, length: f64) -> Mat12 {
    if p.abs() < 1e-10 {
        return Mat12::zeros();
    }

    let l = length;
    let l2 = l * l;
    let ip = iy + iz;
    let p_l = p / l;

    #[rustfmt::skip]
    let data = [
        p_l,   0.0,          0.0,          0.0,        0.0,             0.0,             -p_l,  0.0,          0.0,          0.0,        0.0,             0.0,
        0.0,   6.0*p_l/5.0,  0.0,          0.0,        0.0,             p_l*l/10.0,      0.0,   -6.0*p_l/5.0, 0.0,          0.0,        0.0,             p_l*l/10.0,
        0.0,   0.0,          6.0*p_l/5.0,  0.0,        -p_l*l/10.0,     0.0,             0.0,   0.0,          -6.0*p_l/5.0, 0.0,        -p_l*l/10.0,     0.0,
        0.0,   0.0,          0.0,          p_l*ip/a,   0.0,             0.0,             0.0,   0.0,          0.0,          -p_l*ip/a,  0.0,             0.0,
        0.0,   0.0,          -p_l*l/10.0,  0.0,        2.0*p_l*l2/15.0, 0.0,             0.0,   0.0,          p_l*l/10.0,   0.0,        -p_l*l2/30.0,    0.0,
        0.0,   p_l*l/10.0,   0.0,          0.0,        0.0,             2.0*p_l*l2/15.0, 0.0,   -p_l*l/10.0,  0.0,          0.0,        0.0,             -p_l*l2/30.0,
        -p_l,  0.0,          0.0,          0.0,        0.0,             0.0,             p_l,   0.0,          0.0,          0.0,        0.0,             0.0,
        0.0,   -6.0*p_l/5.0, 0.0,          0.0,        0.0,             -p_l*l/10.0,     0.0,   6.0*p_l/5.0,  0.0,          0.0,        0.0,             -p_l*l/10.0,
        0.0,   0.0,          -6.0*p_l/5.0, 0.0,        p_l*l/10.0,      0.0,             0.0,   0.0,          6.0*p_l/5.0,  0.0,        p_l*l/10.0,      0.0,
        0.0,   0.0,          0.0,          -p_l*ip/a,  0.0,             0.0,             0.0,   0.0,          0.0,          p_l*ip/a,   0.0,             0.0,
        0.0,   0.0,          -p_l*l/10.0,  0.0,        -p_l*l2/30.0,    0.0,             0.0,   0.0,          p_l*l/10.0,   0.0,        2.0*p_l*l2/15.0, 0.0,
        0.0,   p_l*l/10.0,   0.0,          0.0,        0.0,             -p_l*l2/30.0,    0.0,   -p_l*l/10.0,  0.0,          0.0,        0.0,             2.0*p_l*l2/15.0,
    ];

    Mat12::from_row_slice(&data)
}

/// Compute the local stiffness matrix for a two-node axial spring
pub fn spring_local_stiffness(k: f64) -> Mat12 {
    let mut ks = Mat12::zeros();
    ks[(0, 0)] = k;
    ks[(0, 6)] = -k;
    ks[(6, 0)] = -k;
    ks[(6, 6)] = k;
    ks
}

fn split_released(releases: &[bool; 12]) -> (Vec<usize>, Vec<usize>) {
    let unreleased = releases
        .iter()
        .enumerate()
        .filter_map(|(i, &r)| (!r).then_some(i))
        .collect();
    let released = releases
        .iter()
        .enumerate()
        .filter_map(|(i, &r)| r.then_some(i))
        .collect();
    (unreleased, released)
}

/// Apply static condensation for released DOFs:
/// `k_cond = k11 - k12 * inv(k22) * k21`, expanded back to 12x12 with zeros
/// on released rows/columns.
pub fn apply_releases(k: &Mat12, releases: &[bool; 12]) -> Mat12 {
    let (unreleased, released) = split_released(releases);
    if released.is_empty() {
        return *k;
    }

    let n1 = unreleased.len();
    let n2 = released.len();

    let mut k11 = DMatrix::zeros(n1, n1);
    let mut k12 = DMatrix::zeros(n1, n2);
    let mut k21 = DMatrix::zeros(n2, n1);
    let mut k22 = DMatrix::zeros(n2, n2);

    for (i, &ui) in unreleased.iter().enumerate() {
        for (j, &uj) in unreleased.iter().enumerate() {
            k11[(i, j)] = k[(ui, uj)];
        }
        for (j, &rj) in released.iter().enumerate() {
            k12[(i, j)] = k[(ui, rj)];
        }
    }
    for (i, &ri) in released.iter().enumerate() {
        for (j, &uj) in unreleased.iter().enumerate() {
            k21[(i, j)] = k[(ri, uj)];
        }
        for (j, &rj) in released.iter().enumerate() {
            k22[(i, j)] = k[(ri, rj)];
        }
    }

    let k22_inv = match k22.try_inverse() {
        Some(inv) => inv,
        None => return *k,
    };

    let k_condensed = &k11 - &k12 * &k22_inv * &k21;

    let mut k_result = Mat12::zeros();
    for (i, &ui) in unreleased.iter().enumerate() {
        for (j, &uj) in unreleased.iter().enumerate() {
            k_result[(ui, uj)] = k_condensed[(i, j)];
        }
    }
    k_result
}

/// Apply static condensation to a fixed-end force vector for released DOFs:
/// `fer_cond = fer1 - k12 * inv(k22) * fer2`
pub fn apply_fer_releases(fer: &Vec12, k: &Mat12, releases: &[bool; 12]) -> Vec12 {
    let (unreleased, released) = split_released(releases);
    if released.is_empty() {
        return *fer;
    }

    let n1 = unreleased.len();
    let n2 = released.len();

    let mut k12 = DMatrix::zeros(n1, n2);
    let mut k22 = DMatrix::zeros(n2, n2);
    for (i, &ui) in unreleased.iter().enumerate() {
        for (j, &rj) in released.iter().enumerate() {
            k12[(i, j)] = k[(ui, rj)];
        }
    }
    for (i, &ri) in released.iter().enumerate() {
        for (j, &rj) in released.iter().enumerate() {
            k22[(i, j)] = k[(ri, rj)];
        }
    }

    let mut fer1 = DVector::zeros(n1);
    let mut fer2 = DVector::zeros(n2);
    for (i, &ui) in unreleased.iter().enumerate() {
        fer1[i] = fer[ui];
    }
    for (i, &ri) in released.iter().enumerate() {
        fer2[i] = fer[ri];
    }

    let k22_inv = match k22.try_inverse() {
        Some(inv) => inv,
        None => return *fer,
    };

    let fer_condensed = &fer1 - &k12 * &k22_inv * &fer2;

    let mut fer_result = Vec12::zeros();
    for (i, &ui) in unreleased.iter().enumerate() {
        fer_result[ui] = fer_condensed[i];
    }
    fer_result
}

/// Compute fixed-end forces for a concentrated force on a member.
///
/// # Arguments
/// * `p` - Load magnitude
/// * `a` - Distance from i-node to load
/// * `length` - Member length
/// * `axis` - Local load axis (0=x, 1=y, 2=z)
pub fn fer_point_load(p: f64, a: f64, length: f64, axis: usize) -> Vec12 {
    let l = length;
    let b = l - a;
    let l2 = l * l;
    let l3 = l2 * l;

    let mut fer = Vec12::zeros();

    match axis {
        0 => {
            fer[0] = -p * b / l;
            fer[6] = -p * a / l;
        }
        1 => {
            fer[1] = -p * b * b * (3.0 * a + b) / l3;
            fer[5] = -p * a * b * b / l2;
            fer[7] = -p * a * a * (a + 3.0 * b) / l3;
            fer[11] = p * a * a * b / l2;
        }
        2 => {
            fer[2] = -p * b * b * (3.0 * a + b) / l3;
            fer[4] = p * a * b * b / l2;
            fer[8] = -p * a * a * (a + 3.0 * b) / l3;
            fer[10] = -p * a * a * b / l2;
        }
        _ => {}
    }

    fer
}

/// Compute fixed-end forces for a concentrated moment on a member.
///
/// # Arguments
/// * `m` - Moment magnitude
/// * `a` - Distance from i-node to the moment
/// * `length` - Member length
/// * `axis` - Local moment axis (0=torsion, 1=My, 2=Mz)
pub fn fer_point_moment(m: f64, a: f64, length: f64, axis: usize) -> Vec12 {
    let l = length;
    let b = l - a;
    let l2 = l * l;
    let l3 = l2 * l;

    let mut fer = Vec12::zeros();

    match axis {
        0 => {
            // Torque splits like an axial point load
            fer[3] = -m * b / l;
            fer[9] = -m * a / l;
        }
        1 => {
            // Moment about local y: bending in the x-z plane
            fer[2] = -6.0 * m * a * b / l3;
            fer[4] = -m * b * (l - 3.0 * a) / l2;
            fer[8] = 6.0 * m * a * b / l3;
            fer[10] = -m * a * (3.0 * a - 2.0 * l) / l2;
        }
        2 => {
            // Moment about local z: bending in the x-y plane
            fer[1] = 6.0 * m * a * b / l3;
            fer[5] = -m * b * (l - 3.0 * a) / l2;
            fer[7] = -6.0 * m * a * b / l3;
            fer[11] = -m * a * (3.0 * a - 2.0 * l) / l2;
        }
        _ => {}
    }

    fer
}

/// Compute fixed-end forces for a linearly varying distributed load over
/// `[x1, x2]` of the member.
///
/// Integrates the point-load kernel with 4-point Gauss-Legendre quadrature.
/// The kernel is the cubic Hermite shape function set and the load is linear,
/// so the quadrature is exact.
pub fn fer_dist_load(w1: f64, w2: f64, x1: f64, x2: f64, length: f64, axis: usize) -> Vec12 {
    let span = x2 - x1;
    if span <= 1e-12 {
        return Vec12::zeros();
    }

    let half = span / 2.0;
    let mid = (x1 + x2) / 2.0;

    let mut fer = Vec12::zeros();
    for &(xi, weight) in &GAUSS_4 {
        let x = mid + half * xi;
        let t = (x - x1) / span;
        let w = w1 + t * (w2 - w1);
        fer += fer_point_load(w, x, length, axis) * (weight * half);
    }
    fer
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transformation_matrix_horizontal() {
        let i = [0.0, 0.0, 0.0];
        let j = [10.0, 0.0, 0.0];
        let t = member_transformation_matrix(&i, &j, 0.0);

        // Member along +X: local axes coincide with global
        assert_relative_eq!(t[(0, 0)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(1, 1)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(2, 2)], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_transformation_matrix_vertical() {
        let i = [0.0, 0.0, 0.0];
        let j = [0.0, 10.0, 0.0];
        let t = member_transformation_matrix(&i, &j, 0.0);

        // Member pointing up: x = +Y, y = -X, z = +Z
        assert_relative_eq!(t[(0, 1)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(1, 0)], -1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(2, 2)], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_transformation_is_orthogonal() {
        let i = [1.0, 2.0, 3.0];
        let j = [4.0, 7.0, -2.0];
        let r = member_rotation_matrix(&i, &j, 0.35);
        let identity = r * r.transpose();
        for a in 0..3 {
            for b in 0..3 {
                let expected = if a == b { 1.0 } else { 0.0 };
                assert_relative_eq!(identity[(a, b)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_local_stiffness_symmetry() {
        let k = member_local_stiffness(200e9, 77e9, 0.01, 1e-4, 2e-4, 1e-5, 10.0, 0.0, 0.0);
        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_shear_deformation_softens_bending() {
        let rigid = member_local_stiffness(200e9, 77e9, 0.01, 1e-4, 2e-4, 1e-5, 3.0, 0.0, 0.0);
        let flexible =
            member_local_stiffness(200e9, 77e9, 0.01, 1e-4, 2e-4, 1e-5, 3.0, 0.5, 0.5);
        assert!(flexible[(1, 1)] < rigid[(1, 1)]);
        assert!(flexible[(2, 2)] < rigid[(2, 2)]);
        // Axial and torsion are untouched
        assert_relative_eq!(flexible[(0, 0)], rigid[(0, 0)], epsilon = 1e-6);
        assert_relative_eq!(flexible[(3, 3)], rigid[(3, 3)], epsilon = 1e-6);
    }

    #[test]
    fn test_geometric_stiffness_sign() {
        let kg_tension = member_geometric_stiffness(1000.0, 0.01, 1e-4, 2e-4, 5.0);
        let kg_compression = member_geometric_stiffness(-1000.0, 0.01, 1e-4, 2e-4, 5.0);
        // Tension stiffens the transverse terms, compression softens them
        assert!(kg_tension[(1, 1)] > 0.0);
        assert!(kg_compression[(1, 1)] < 0.0);
        assert_relative_eq!(
            kg_tension[(1, 1)],
            -kg_compression[(1, 1)],
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_fer_uniform_matches_closed_form() {
        // Full-span uniform load: end shears wL/2, end moments wL^2/12
        let w = -5000.0;
        let l = 8.0;
        let fer = fer_dist_load(w, w, 0.0, l, l, 1);
        assert_relative_eq!(fer[1], -w * l / 2.0, epsilon = 1e-6);
        assert_relative_eq!(fer[5], -w * l * l / 12.0, epsilon = 1e-6);
        assert_relative_eq!(fer[7], -w * l / 2.0, epsilon = 1e-6);
        assert_relative_eq!(fer[11], w * l * l / 12.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fer_point_load_midspan() {
        // Midspan point load: end shears P/2, end moments PL/8
        let p = -10000.0;
        let l = 6.0;
        let fer = fer_point_load(p, l / 2.0, l, 1);
        assert_relative_eq!(fer[1], -p / 2.0, epsilon = 1e-9);
        assert_relative_eq!(fer[5], -p * l / 8.0, epsilon = 1e-9);
        assert_relative_eq!(fer[7], -p / 2.0, epsilon = 1e-9);
        assert_relative_eq!(fer[11], p * l / 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fer_point_moment_midspan() {
        // Concentrated moment at midspan: end moments M/4, shears 3M/2L
        let m = 4000.0;
        let l = 4.0;
        let fer = fer_point_moment(m, l / 2.0, l, 2);
        assert_relative_eq!(fer[5], m / 4.0, epsilon = 1e-9);
        assert_relative_eq!(fer[11], m / 4.0, epsilon = 1e-9);
        assert_relative_eq!(fer[1], 1.5 * m / l, epsilon = 1e-9);
        assert_relative_eq!(fer[7], -1.5 * m / l, epsilon = 1e-9);
    }

    #[test]
    fn test_spring_stiffness_layout() {
        let k = spring_local_stiffness(2.5e6);
        assert_relative_eq!(k[(0, 0)], 2.5e6);
        assert_relative_eq!(k[(0, 6)], -2.5e6);
        assert_relative_eq!(k[(6, 6)], 2.5e6);
        assert_relative_eq!(k[(1, 1)], 0.0);
    }

    #[test]
    fn test_release_condensation_pin_both() {
        let k = member_local_stiffness(200e9, 77e9, 0.01, 1e-4, 2e-4, 1e-5, 4.0, 0.0, 0.0);
        let mut releases = [false; 12];
        releases[4] = true;
        releases[5] = true;
        releases[10] = true;
        releases[11] = true;

        let kc = apply_releases(&k, &releases);
        // Released rows/columns are zeroed
        for idx in [4usize, 5, 10, 11] {
            for j in 0..12 {
                assert_relative_eq!(kc[(idx, j)], 0.0, epsilon = 1e-9);
                assert_relative_eq!(kc[(j, idx)], 0.0, epsilon = 1e-9);
            }
        }
        // A member pinned at both ends carries no shear through bending
        assert_relative_eq!(kc[(1, 1)], 0.0, epsilon = 1e-3);
        // Axial path intact
        assert_relative_eq!(kc[(0, 0)], k[(0, 0)], epsilon = 1e-6);
    }
}
