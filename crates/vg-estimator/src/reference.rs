#![forbid(unsafe_code)]

//! Authoritative matrix-form implementation of the predict/update step.
//!
//! Constant-velocity model with unit timestep: transition
//! `F = [[1, 1], [0, 1]]`, position-only measurement `H = [1, 0]`,
//! isotropic process noise `Q = q·I`. The covariance update uses the
//! Joseph form `(I − KH) P (I − KH)' + K R K'`, which stays symmetric
//! and positive semi-definite under roundoff.

use crate::{EstimatorInput, EstimatorOutput};

type Mat2 = [[f64; 2]; 2];

const F: Mat2 = [[1.0, 1.0], [0.0, 1.0]];
const H: [f64; 2] = [1.0, 0.0];

fn mat_mul(a: &Mat2, b: &Mat2) -> Mat2 {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[1][0],
            a[0][0] * b[0][1] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[1][0],
            a[1][0] * b[0][1] + a[1][1] * b[1][1],
        ],
    ]
}

fn mat_mul_transpose(a: &Mat2, b: &Mat2) -> Mat2 {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[0][1],
            a[0][0] * b[1][0] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[0][1],
            a[1][0] * b[1][0] + a[1][1] * b[1][1],
        ],
    ]
}

/// One predict/update step.
#[must_use]
pub fn step(input: &EstimatorInput) -> EstimatorOutput {
    let p = [
        [input.state_covariance[0], input.state_covariance[1]],
        [input.state_covariance[2], input.state_covariance[3]],
    ];
    let q = [
        [input.process_noise, 0.0],
        [0.0, input.process_noise],
    ];
    let r = input.measurement_noise;

    // ── Predict ─────────────────────────────────────────────────────
    let x_pred = [
        F[0][0] * input.state[0] + F[0][1] * input.state[1],
        F[1][0] * input.state[0] + F[1][1] * input.state[1],
    ];

    let fp = mat_mul(&F, &p);
    let fpf = mat_mul_transpose(&fp, &F);
    let p_pred = [
        [fpf[0][0] + q[0][0], fpf[0][1] + q[0][1]],
        [fpf[1][0] + q[1][0], fpf[1][1] + q[1][1]],
    ];

    // ── Update ──────────────────────────────────────────────────────
    let innovation = input.measurement - (H[0] * x_pred[0] + H[1] * x_pred[1]);
    let s = H[0] * p_pred[0][0] * H[0]
        + H[0] * p_pred[0][1] * H[1]
        + H[1] * p_pred[1][0] * H[0]
        + H[1] * p_pred[1][1] * H[1]
        + r;
    let gain = [
        (p_pred[0][0] * H[0] + p_pred[0][1] * H[1]) / s,
        (p_pred[1][0] * H[0] + p_pred[1][1] * H[1]) / s,
    ];

    let updated_state = [
        x_pred[0] + gain[0] * innovation,
        x_pred[1] + gain[1] * innovation,
    ];

    // Joseph form: (I − KH) P_pred (I − KH)' + K R K'
    let ikh = [
        [1.0 - gain[0] * H[0], -gain[0] * H[1]],
        [-gain[1] * H[0], 1.0 - gain[1] * H[1]],
    ];
    let ikh_p = mat_mul(&ikh, &p_pred);
    let mut p_up = mat_mul_transpose(&ikh_p, &ikh);
    p_up[0][0] += gain[0] * r * gain[0];
    p_up[0][1] += gain[0] * r * gain[1];
    p_up[1][0] += gain[1] * r * gain[0];
    p_up[1][1] += gain[1] * r * gain[1];

    EstimatorOutput {
        updated_state,
        updated_covariance: [p_up[0][0], p_up[0][1], p_up[1][0], p_up[1][1]],
    }
}
