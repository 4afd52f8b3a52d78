//! Assertion helpers with diagnostic output.
//!
//! Each helper returns `Err(HarnessError::AssertionFailed)` naming the caller's
//! context, expected value and actual value instead of panicking, so a test can
//! propagate with `?` or collect several failures.

use detector_model::{Detector, Panel};
use nalgebra::{Matrix3, Vector2, Vector3};

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("model error: {0}")]
    Model(#[from] detector_model::ModelError),
}

fn fail(detail: String) -> Result<(), HarnessError> {
    Err(HarnessError::AssertionFailed { detail })
}

pub fn assert_vec_near(
    actual: &Vector3<f64>,
    expected: &Vector3<f64>,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let err = (actual - expected).norm();
    if err <= tol {
        Ok(())
    } else {
        fail(format!(
            "[{ctx}] expected ({:.6}, {:.6}, {:.6}), got ({:.6}, {:.6}, {:.6}), |Δ|={err:.3e} (tol={tol})",
            expected.x, expected.y, expected.z, actual.x, actual.y, actual.z,
        ))
    }
}

pub fn assert_vec2_near(
    actual: &Vector2<f64>,
    expected: &Vector2<f64>,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let err = (actual - expected).norm();
    if err <= tol {
        Ok(())
    } else {
        fail(format!(
            "[{ctx}] expected ({:.6}, {:.6}), got ({:.6}, {:.6}), |Δ|={err:.3e} (tol={tol})",
            expected.x, expected.y, actual.x, actual.y,
        ))
    }
}

/// Assert `m` is a proper rotation: `m·mᵀ = I` and `det m = 1`.
pub fn assert_rotation(m: &Matrix3<f64>, tol: f64, ctx: &str) -> Result<(), HarnessError> {
    let drift = (m * m.transpose() - Matrix3::identity()).amax();
    if drift > tol {
        return fail(format!("[{ctx}] m·mᵀ deviates from I by {drift:.3e} (tol={tol})"));
    }
    let det = m.determinant();
    if (det - 1.0).abs() > tol {
        return fail(format!("[{ctx}] determinant {det:.9} (tol={tol})"));
    }
    Ok(())
}

/// Assert a panel's fast and slow axes are unit length and perpendicular.
pub fn assert_orthonormal(panel: &Panel, tol: f64, ctx: &str) -> Result<(), HarnessError> {
    let fast = panel.fast_axis().norm();
    let slow = panel.slow_axis().norm();
    let dot = panel.fast_axis().dot(&panel.slow_axis());
    if (fast - 1.0).abs() > tol || (slow - 1.0).abs() > tol || dot.abs() > tol {
        return fail(format!(
            "[{ctx}] panel {}: |fast|={fast:.9} |slow|={slow:.9} fast·slow={dot:.3e}",
            panel.name(),
        ));
    }
    Ok(())
}

/// Assert the beam along `direction` meets `panel_id` at `expected` (fast, slow) mm.
pub fn assert_beam_centre(
    detector: &Detector,
    panel_id: usize,
    direction: &Vector3<f64>,
    expected: &Vector2<f64>,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let actual = detector
        .panel(panel_id)?
        .bidirectional_ray_intersection(direction)?;
    assert_vec2_near(&actual, expected, tol, ctx)
}
