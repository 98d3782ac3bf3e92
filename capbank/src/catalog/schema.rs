//! Catalog Part Schema
//!
//! Data structures describing a single purchasable capacitor. Parts are
//! deserialized from catalog JSON files and never mutated afterwards.

use serde::{Deserialize, Serialize};

use super::package::normalize_package;

/// A concrete catalog capacitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitorPart {
    /// Manufacturer part number, unique within a catalog
    pub id: String,

    /// Manufacturer name
    #[serde(default)]
    pub manufacturer: Option<String>,

    /// Nominal capacitance in farads
    pub capacitance: f64,

    /// Capacitance tolerance in percent
    #[serde(default)]
    pub tolerance_pct: f64,

    /// Rated DC voltage in volts
    pub rated_voltage: f64,

    /// Maximum operating temperature in °C
    pub rated_temp: f64,

    /// Package code (EIA inch size, e.g. "0805")
    pub package: String,

    /// Body volume in mm³
    pub volume_mm3: f64,

    /// Equivalent series resistance in ohms, when the datasheet gives one
    #[serde(default)]
    pub esr_ohm: Option<f64>,

    #[serde(default)]
    pub length_mm: Option<f64>,

    #[serde(default)]
    pub width_mm: Option<f64>,

    #[serde(default)]
    pub thickness_mm: Option<f64>,
}

impl CapacitorPart {
    /// Capacitance after applying a DC-bias derating fraction.
    pub fn derated_capacitance(&self, dc_bias: f64) -> f64 {
        self.capacitance * (1.0 - dc_bias)
    }

    /// Board footprint in mm², zero when dimensions are unknown.
    pub fn footprint_mm2(&self) -> f64 {
        match (self.length_mm, self.width_mm) {
            (Some(l), Some(w)) => l * w,
            _ => 0.0,
        }
    }

    pub fn height_mm(&self) -> f64 {
        self.thickness_mm.unwrap_or(0.0)
    }

    /// Derated capacitance per unit volume; parts without a volume rank last.
    pub fn density(&self, dc_bias: f64) -> f64 {
        if self.volume_mm3 > 0.0 {
            self.derated_capacitance(dc_bias) / self.volume_mm3
        } else {
            0.0
        }
    }

    /// Check the physical sanity of a part as loaded from a catalog file.
    pub fn check(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("part has an empty identifier".to_string());
        }
        if !self.capacitance.is_finite() || self.capacitance <= 0.0 {
            return Err(format!(
                "{}: capacitance must be positive, got {}",
                self.id, self.capacitance
            ));
        }
        if !self.rated_voltage.is_finite() || self.rated_voltage <= 0.0 {
            return Err(format!(
                "{}: rated voltage must be positive, got {}",
                self.id, self.rated_voltage
            ));
        }
        if !self.rated_temp.is_finite() {
            return Err(format!("{}: rated temperature is not a number", self.id));
        }
        if !self.volume_mm3.is_finite() || self.volume_mm3 < 0.0 {
            return Err(format!(
                "{}: volume must be non-negative, got {}",
                self.id, self.volume_mm3
            ));
        }
        if let Some(esr) = self.esr_ohm {
            if !esr.is_finite() || esr <= 0.0 {
                return Err(format!("{}: ESR must be positive, got {}", self.id, esr));
            }
        }
        if self.package.trim().is_empty() {
            return Err(format!("{}: missing package", self.id));
        }
        Ok(())
    }

    /// Copy of the part with its identifier trimmed and package normalized.
    pub(crate) fn normalized(mut self) -> Self {
        self.id = self.id.trim().to_string();
        self.package = normalize_package(&self.package);
        self
    }
}
