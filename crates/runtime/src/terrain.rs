// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The terrain classifier deployment.
//!
//! A 48-feature gait window goes in, four class probabilities come out.
//! This module holds the deployment constants, a reference feature vector
//! with its expected output, a built-in demo model, and the helpers that
//! run one classification end to end.
//!
//! The demo model is `Dense(48→16, relu) → Dense(16→4) → Softmax`. Its
//! weights are synthetic: hidden unit 0 tracks feature 23 and drives class 3,
//! every other weight is a small deterministic pattern.

use crate::{Interpreter, Ready, RuntimeError, TERRAIN_INPUT, TERRAIN_OUTPUT};
use model_ir::{ModelBuilder, OpCode, OperatorParams};
use tensor_core::{DType, FusedActivation, Shape};

/// Features per classification window.
pub const NUM_FEATURES: usize = 48;

/// Output classes.
pub const NUM_CLASSES: usize = 4;

/// Arena size the terrain deployment is built with.
pub const DEFAULT_ARENA_SIZE: usize = 8 * 1024;

/// Maximum per-class deviation accepted against [`EXPECTED_TERRAIN_OUTPUT`].
pub const OUTPUT_TOLERANCE: f32 = 0.05;

/// Minimum probability for [`classify`] to report a class.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

const HIDDEN_UNITS: usize = 16;

/// Reference feature vector for one gait window.
pub static TERRAIN_FEATURES: [f32; NUM_FEATURES] = [
    -2.31439495e+00, 5.97616716e-02, -2.47774845e+00, -2.14046450e+00,
    -2.30420794e+00, -2.33426924e+00, -2.28394371e+00, -1.30186937e+00,
    2.72320737e-01, -2.31265589e+00, -7.39296468e-01, -1.28263204e+00,
    -1.47990409e+00, -1.11049571e+00, 2.08532245e+00, 8.73432105e-02,
    1.82784239e+00, 2.32967389e+00, 2.08847336e+00, 2.03926225e+00,
    2.12828761e+00, 2.83834014e+00, 2.29770183e+01, 4.60000000e+01,
    2.13393521e-04, 5.35964767e-05, 4.76778233e-05, 4.92456723e-07,
    2.13393521e-04, 4.12774497e-05, 3.65835590e+00, 1.27874422e+01,
    1.00000000e+00, 5.44404498e-03, 1.13616446e-03, 1.16661724e-03,
    5.82489601e-05, 5.44404498e-03, 6.26408306e-04, 2.84357040e+00,
    2.06768944e+01, 3.20000000e+01, 5.97301188e-04, 1.67362571e-04,
    1.50204272e-04, 8.01359716e-08, 5.97301188e-04, 1.27957316e-04,
];

/// Expected class probabilities for [`TERRAIN_FEATURES`].
pub const EXPECTED_TERRAIN_OUTPUT: [f32; NUM_CLASSES] = [0.0, 0.0, 0.0, 1.0];

/// A class decision.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Classification {
    pub class: usize,
    pub confidence: f32,
}

/// Picks the most probable class, or `None` if it is below `threshold`.
///
/// Ties resolve to the lowest class index. NaN probabilities never win.
pub fn classify(probabilities: &[f32], threshold: f32) -> Option<Classification> {
    let (class, &confidence) = probabilities
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_nan())
        .fold(None::<(usize, &f32)>, |best, (i, p)| match best {
            Some((_, b)) if b >= p => best,
            _ => Some((i, p)),
        })?;
    (confidence >= threshold).then_some(Classification { class, confidence })
}

/// Returns `true` if every probability is within `tolerance` of `expected`.
pub fn within_tolerance(actual: &[f32], expected: &[f32], tolerance: f32) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, e)| (a - e).abs() <= tolerance)
}

/// Runs one classification on a ready interpreter.
///
/// Checks both tensor contracts, writes `features` into input 0, invokes,
/// and copies output 0 out.
///
/// # Errors
/// [`RuntimeError::ContractViolation`] if the model's input or output does
/// not have the terrain layout, [`RuntimeError::TensorError`] if `features`
/// is the wrong length, or any error from [`Interpreter::invoke`].
pub fn run_classifier(
    interpreter: &mut Interpreter<'_, '_, Ready>,
    features: &[f32],
) -> Result<[f32; NUM_CLASSES], RuntimeError> {
    TERRAIN_INPUT.check(&interpreter.input(0)?)?;
    TERRAIN_OUTPUT.check(&interpreter.output(0)?)?;

    interpreter.input_mut(0)?.copy_from_f32(features)?;
    interpreter.invoke()?;

    let mut probabilities = [0f32; NUM_CLASSES];
    probabilities.copy_from_slice(interpreter.output(0)?.as_f32()?);
    Ok(probabilities)
}

/// Serializes the built-in demo terrain model.
pub fn terrain_model_blob() -> Result<Vec<u8>, RuntimeError> {
    let mut b = ModelBuilder::new();

    let input = b.add_tensor(Shape::matrix(1, NUM_FEATURES), DType::F32);
    let w1 = b.add_constant_f32(Shape::matrix(HIDDEN_UNITS, NUM_FEATURES), &hidden_weights())?;
    let b1 = b.add_constant_f32(Shape::vector(HIDDEN_UNITS), &[0.0; HIDDEN_UNITS])?;
    let hidden = b.add_tensor(Shape::matrix(1, HIDDEN_UNITS), DType::F32);
    let w2 = b.add_constant_f32(Shape::matrix(NUM_CLASSES, HIDDEN_UNITS), &output_weights())?;
    let b2 = b.add_constant_f32(Shape::vector(NUM_CLASSES), &[0.0; NUM_CLASSES])?;
    let logits = b.add_tensor(Shape::matrix(1, NUM_CLASSES), DType::F32);
    let probs = b.add_tensor(Shape::matrix(1, NUM_CLASSES), DType::F32);

    b.add_operator(
        OpCode::FullyConnected,
        &[input, w1, b1],
        &[hidden],
        OperatorParams::with_activation(FusedActivation::Relu),
    )?;
    b.add_operator(
        OpCode::FullyConnected,
        &[hidden, w2, b2],
        &[logits],
        OperatorParams::default(),
    )?;
    b.add_operator(OpCode::Softmax, &[logits], &[probs], OperatorParams::softmax(1.0))?;

    b.set_inputs(&[input]).set_outputs(&[probs]);
    Ok(b.build())
}

/// `[16, 48]`, row-major by hidden unit.
fn hidden_weights() -> Vec<f32> {
    let mut w: Vec<f32> = (0..HIDDEN_UNITS)
        .flat_map(|j| (0..NUM_FEATURES).map(move |i| pattern(i * 7 + j * 13) * 0.005))
        .collect();
    w[23] += 1.0;
    w
}

/// `[4, 16]`, row-major by class.
fn output_weights() -> Vec<f32> {
    let mut w: Vec<f32> = (0..NUM_CLASSES)
        .flat_map(|c| (0..HIDDEN_UNITS).map(move |j| pattern(c * 3 + j * 7) * 0.025))
        .collect();
    for c in 0..NUM_CLASSES {
        w[c * HIDDEN_UNITS] = if c == NUM_CLASSES - 1 { 0.5 } else { -0.1 };
    }
    w
}

/// Maps `n` onto `{-2, -1, 0, 1, 2}`.
fn pattern(n: usize) -> f32 {
    (n % 5) as f32 - 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::{Model, SchemaPolicy};

    #[test]
    fn test_classify_argmax() {
        let c = classify(&[0.1, 0.2, 0.6, 0.1], DEFAULT_CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(c.class, 2);
        assert_eq!(c.confidence, 0.6);
    }

    #[test]
    fn test_classify_below_threshold() {
        assert_eq!(classify(&[0.3, 0.3, 0.2, 0.2], 0.5), None);
        assert_eq!(classify(&[], 0.0), None);
    }

    #[test]
    fn test_classify_tie_and_nan() {
        assert_eq!(classify(&[0.5, 0.5], 0.0).map(|c| c.class), Some(0));
        assert_eq!(classify(&[f32::NAN, 0.4], 0.0).map(|c| c.class), Some(1));
    }

    #[test]
    fn test_within_tolerance() {
        assert!(within_tolerance(&[0.01, 0.0, 0.0, 0.99], &EXPECTED_TERRAIN_OUTPUT, OUTPUT_TOLERANCE));
        assert!(!within_tolerance(&[0.1, 0.0, 0.0, 0.9], &EXPECTED_TERRAIN_OUTPUT, OUTPUT_TOLERANCE));
        assert!(!within_tolerance(&[1.0], &EXPECTED_TERRAIN_OUTPUT, OUTPUT_TOLERANCE));
    }

    #[test]
    fn test_demo_model_shape() {
        let blob = terrain_model_blob().unwrap();
        let model = Model::from_bytes(&blob)
            .unwrap()
            .validate(SchemaPolicy::Strict)
            .unwrap();
        assert_eq!(model.num_tensors(), 8);
        assert_eq!(model.num_operators(), 3);
        assert_eq!(model.required_arena_bytes(crate::TENSOR_ALIGNMENT), 3696);
        assert!(model.required_arena_bytes(crate::TENSOR_ALIGNMENT) <= DEFAULT_ARENA_SIZE);

        let input = model.tensor(model.input_index(0).unwrap()).unwrap();
        let output = model.tensor(model.output_index(0).unwrap()).unwrap();
        assert_eq!(TERRAIN_INPUT.check_meta(&input), Ok(()));
        assert_eq!(TERRAIN_OUTPUT.check_meta(&output), Ok(()));
    }

    #[test]
    fn test_hidden_unit_zero_tracks_feature_23() {
        let w = hidden_weights();
        assert_eq!(w.len(), HIDDEN_UNITS * NUM_FEATURES);
        assert!((w[23] - 1.0).abs() < 0.011);
        assert!(w[NUM_FEATURES..].iter().all(|x| x.abs() <= 0.010_001));
    }
}
