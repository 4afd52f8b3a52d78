//! Verification oracles: pure functions comparing a detector before and after
//! an operation.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.

use detector_model::Detector;

/// The result of a single oracle check.
#[derive(Debug, Clone)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }

    pub fn into_result(self) -> Result<(), crate::HarnessError> {
        if self.passed {
            Ok(())
        } else {
            Err(crate::HarnessError::OracleFailure {
                oracle: self.oracle_name,
                detail: self.detail,
            })
        }
    }
}

/// Panel-to-panel geometry is unchanged: pairwise origin separations and
/// pairwise axis dot products agree within `tol`.
pub fn check_rigid_assembly(before: &Detector, after: &Detector, tol: f64) -> OracleVerdict {
    const NAME: &str = "rigid_assembly";
    if before.len() != after.len() {
        return OracleVerdict::fail(
            NAME,
            format!("panel count changed: {} → {}", before.len(), after.len()),
        );
    }

    let mut worst = 0.0f64;
    let mut worst_at = (0, 0);
    for i in 0..before.len() {
        for j in i..before.len() {
            let (a0, a1) = (&before.panels()[i], &before.panels()[j]);
            let (b0, b1) = (&after.panels()[i], &after.panels()[j]);
            let deltas = [
                (a0.origin() - a1.origin()).norm() - (b0.origin() - b1.origin()).norm(),
                a0.fast_axis().dot(&a1.fast_axis()) - b0.fast_axis().dot(&b1.fast_axis()),
                a0.slow_axis().dot(&a1.slow_axis()) - b0.slow_axis().dot(&b1.slow_axis()),
                a0.fast_axis().dot(&a1.slow_axis()) - b0.fast_axis().dot(&b1.slow_axis()),
            ];
            for d in deltas {
                if d.abs() > worst {
                    worst = d.abs();
                    worst_at = (i, j);
                }
            }
        }
    }

    if worst <= tol {
        OracleVerdict::pass_val(NAME, format!("max drift {worst:.3e}"), worst)
    } else {
        OracleVerdict::fail_val(
            NAME,
            format!("panels {:?} drift {worst:.3e} (tol={tol})", worst_at),
            worst,
        )
    }
}

/// Every panel axis is unchanged.
pub fn check_axes_unchanged(before: &Detector, after: &Detector, tol: f64) -> OracleVerdict {
    const NAME: &str = "axes_unchanged";
    if before.len() != after.len() {
        return OracleVerdict::fail(NAME, "panel count changed".into());
    }
    let worst = before
        .iter()
        .zip(after)
        .map(|(a, b)| {
            (a.fast_axis() - b.fast_axis())
                .amax()
                .max((a.slow_axis() - b.slow_axis()).amax())
        })
        .fold(0.0, f64::max);
    if worst <= tol {
        OracleVerdict::pass_val(NAME, format!("max axis drift {worst:.3e}"), worst)
    } else {
        OracleVerdict::fail_val(NAME, format!("axis drift {worst:.3e} (tol={tol})"), worst)
    }
}
