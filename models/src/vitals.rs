// models/src/vitals.rs

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

/// Standardized vital signs with clinical ranges. Immutable once created.
/// Every field is optional; validation only checks the fields that are
/// present.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct VitalSigns {
    /// Beats per minute, [0, 300].
    #[serde(default)]
    pub heart_rate: Option<u16>,
    /// mmHg, [50, 300].
    #[serde(default)]
    pub systolic_bp: Option<u16>,
    /// mmHg, [30, 200]. Must be strictly lower than systolic when both are present.
    #[serde(default)]
    pub diastolic_bp: Option<u16>,
    /// Celsius, [35.0, 42.0].
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Percent, [70, 100].
    #[serde(default)]
    pub oxygen_saturation: Option<u8>,
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::VitalOutOfRange { field, value, min, max });
    }
    Ok(())
}

impl VitalSigns {
    /// Validates all present fields against their clinical ranges and checks
    /// blood-pressure consistency.
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(hr) = self.heart_rate {
            check_range("heart_rate", hr as f64, 0.0, 300.0)?;
        }
        if let Some(sys) = self.systolic_bp {
            check_range("systolic_bp", sys as f64, 50.0, 300.0)?;
        }
        if let Some(dia) = self.diastolic_bp {
            check_range("diastolic_bp", dia as f64, 30.0, 200.0)?;
        }
        if let Some(temp) = self.temperature {
            check_range("temperature", temp, 35.0, 42.0)?;
        }
        if let Some(spo2) = self.oxygen_saturation {
            check_range("oxygen_saturation", spo2 as f64, 70.0, 100.0)?;
        }
        if let (Some(sys), Some(dia)) = (self.systolic_bp, self.diastolic_bp) {
            if dia >= sys {
                return Err(ValidationError::BloodPressureInconsistent);
            }
        }
        Ok(())
    }
}
