#![forbid(unsafe_code)]

//! Flattened implementation of the predict/update step, in the shape a
//! code generator emits for this model: the fixed structure of
//! `F = [[1, 1], [0, 1]]` and `H = [1, 0]` is folded into scalar
//! arithmetic, no matrix temporaries.
//!
//! Mathematically identical to [`crate::reference`]; the point of the
//! pipeline is to demonstrate that within tolerance, not to assume it.

use crate::{EstimatorInput, EstimatorOutput};

/// One predict/update step, structure-exploiting form.
#[must_use]
pub fn step(input: &EstimatorInput) -> EstimatorOutput {
    let [p00, p01, p10, p11] = input.state_covariance;
    let q = input.process_noise;
    let r = input.measurement_noise;

    // Predict: x_pred = F x
    let x_pred_0 = input.state[0] + input.state[1];
    let x_pred_1 = input.state[1];

    // P_pred = F P F' + Q, expanded for the constant-velocity F
    let pp00 = p00 + p01 + p10 + p11 + q;
    let pp01 = p01 + p11;
    let pp10 = p10 + p11;
    let pp11 = p11 + q;

    // Update: H observes position only, so S and K collapse to the
    // first column of P_pred
    let s = pp00 + r;
    let k0 = pp00 / s;
    let k1 = pp10 / s;
    let innovation = input.measurement - x_pred_0;

    let updated_state = [x_pred_0 + k0 * innovation, x_pred_1 + k1 * innovation];

    // Joseph form, expanded: A = (I − KH) P_pred, then A (I − KH)' + K R K'
    let one_minus_k0 = 1.0 - k0;
    let a00 = one_minus_k0 * pp00;
    let a01 = one_minus_k0 * pp01;
    let a10 = -k1 * pp00 + pp10;
    let a11 = -k1 * pp01 + pp11;

    let updated_covariance = [
        a00 * one_minus_k0 + k0 * r * k0,
        a00 * (-k1) + a01 + k0 * r * k1,
        a10 * one_minus_k0 + k1 * r * k0,
        a10 * (-k1) + a11 + k1 * r * k1,
    ];

    EstimatorOutput {
        updated_state,
        updated_covariance,
    }
}
