use serde::Serialize;

use super::topology::{Shape, StructureKey};

/// Quantity of one catalog part used by a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartUsage {
    pub part: String,
    pub package: String,
    pub count: u32,
}

/// An evaluated network. Serializes to the `/optimize` response object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Shape tag, `"{p}p"`
    #[serde(rename = "Type")]
    pub shape_tag: String,

    /// Total part volume in mm³
    #[serde(rename = "Vol")]
    pub volume_mm3: f64,

    /// Effective capacitance after DC-bias derating, in farads
    #[serde(rename = "Cap")]
    pub capacitance: f64,

    #[serde(rename = "Cfg")]
    pub label: String,

    #[serde(rename = "BOM")]
    pub bom: String,

    #[serde(rename = "Count")]
    pub part_count: u32,

    #[serde(rename = "Volt")]
    pub voltage_rating: f64,

    #[serde(rename = "Temp")]
    pub temp_rating: f64,

    #[serde(rename = "ESR", skip_serializing_if = "Option::is_none")]
    pub esr_ohm: Option<f64>,

    #[serde(rename = "Area")]
    pub footprint_mm2: f64,

    #[serde(rename = "Height")]
    pub height_mm: f64,

    #[serde(rename = "Parts")]
    pub parts: Vec<PartUsage>,

    #[serde(skip)]
    pub shape: Shape,

    #[serde(skip)]
    pub key: StructureKey,
}
