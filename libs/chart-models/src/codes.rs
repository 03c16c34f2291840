//! Coded clinical concepts and homogeneous code groups
//!
//! Raw code strings are classified once, at group construction, into one of
//! three closed variants (lab, medication, microbiology). A constructed
//! `CodeGroup` is statically homogeneous; the mixed case is rejected before
//! anything downstream runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// LOINC, the lab-result coding system.
pub const LAB_SYSTEM: &str = "http://loinc.org";

/// RxNorm, the medication coding system.
pub const MEDICATION_SYSTEM: &str = "http://www.nlm.nih.gov/research/umls/rxnorm";

/// SNOMED CT, used here for microbiology findings.
pub const MICROBIO_SYSTEM: &str = "http://snomed.info/sct";

/// The v3 ObservationInterpretation value set.
pub const INTERPRETATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/v3-ObservationInterpretation";

/// Recognized lab codes, mapped to (canonical label, canonical unit).
static LAB_CODES: phf::Map<&'static str, (&'static str, &'static str)> = phf::phf_map! {
    "718-7" => ("Hemoglobin", "g/dL"),
    "6690-2" => ("Leukocytes", "10*3/uL"),
    "777-3" => ("Platelets", "10*3/uL"),
    "2345-7" => ("Glucose", "mg/dL"),
    "2160-0" => ("Creatinine", "mg/dL"),
    "2951-2" => ("Sodium", "mmol/L"),
    "2823-3" => ("Potassium", "mmol/L"),
    "1975-2" => ("Bilirubin total", "mg/dL"),
    "8310-5" => ("Body temperature", "Cel"),
    "5778-6" => ("Urine color", ""),
    "5767-9" => ("Urine appearance", ""),
};

/// Recognized medication codes, mapped to (canonical label, canonical dose unit).
static MEDICATION_CODES: phf::Map<&'static str, (&'static str, &'static str)> = phf::phf_map! {
    "11124" => ("Vancomycin", "mg"),
    "1596450" => ("Insulin glargine", "U"),
    "723" => ("Amoxicillin", "mg"),
    "5640" => ("Ibuprofen", "mg"),
    "8591" => ("Piperacillin", "g"),
    "10154" => ("Ceftriaxone", "g"),
    "4337" => ("Furosemide", "mg"),
};

/// A recognized lab-result code, with its canonical label and unit
/// resolved once from the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabCode {
    code: String,
    label: &'static str,
    unit: &'static str,
}

impl LabCode {
    /// Resolve a raw code string against the recognized lab table.
    pub fn resolve(code: &str) -> Option<Self> {
        LAB_CODES.get(code).map(|&(label, unit)| Self {
            code: code.to_string(),
            label,
            unit,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Canonical display label for this code.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Canonical unit for this code; `None` for qualitative concepts.
    pub fn unit(&self) -> Option<&'static str> {
        (!self.unit.is_empty()).then_some(self.unit)
    }
}

/// A recognized medication code, with its canonical label and dose unit
/// resolved once from the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MedicationCode {
    code: String,
    label: &'static str,
    unit: &'static str,
}

impl MedicationCode {
    /// Resolve a raw code string against the recognized medication table.
    pub fn resolve(code: &str) -> Option<Self> {
        MEDICATION_CODES.get(code).map(|&(label, unit)| Self {
            code: code.to_string(),
            label,
            unit,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Canonical display label for this medication.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Canonical dose unit for this medication.
    pub fn unit(&self) -> &'static str {
        self.unit
    }
}

/// A microbiology code, carried verbatim with the coding's own display text.
///
/// Unlike lab and medication codes there is no canonical table: the feed's
/// display text is trusted as the label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MicrobioCode {
    pub code: String,
    pub display: String,
}

impl MicrobioCode {
    pub fn new(code: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display: display.into(),
        }
    }
}

/// Which coding system a concept belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeKind {
    Lab,
    Medication,
    Microbio,
}

/// One coded clinical concept: a code string, display label, and system URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodedConcept {
    pub code: String,
    pub label: String,
    pub system: String,
}

impl CodedConcept {
    pub fn new(
        code: impl Into<String>,
        label: impl Into<String>,
        system: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            system: system.into(),
        }
    }

    /// Classify by system URI. Unknown systems yield `None`.
    pub fn kind(&self) -> Option<CodeKind> {
        match self.system.as_str() {
            LAB_SYSTEM => Some(CodeKind::Lab),
            MEDICATION_SYSTEM => Some(CodeKind::Medication),
            MICROBIO_SYSTEM => Some(CodeKind::Microbio),
            _ => None,
        }
    }
}

/// Requested chart rendering style for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartStyle {
    Line,
    Step,
}

/// Error constructing a code group.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("code group mixes more than one coding system")]
    Mixed,

    #[error("code group must contain at least one recognized code")]
    Empty,

    #[error("unrecognized code '{0}' for system '{1}'")]
    Unrecognized(String, String),
}

/// The homogeneous code list of a group, tagged by coding system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeGroupCodes {
    Lab(Vec<LabCode>),
    Medication(Vec<MedicationCode>),
    Microbio(Vec<MicrobioCode>),
}

/// A non-empty, homogeneous group of coded concepts plus display metadata.
///
/// The variant is resolved once, at construction; a mixed group cannot be
/// constructed, so downstream dispatch never re-checks homogeneity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGroup {
    codes: CodeGroupCodes,
    label: String,
    style: ChartStyle,
}

impl CodeGroup {
    /// Build a group from raw concepts, resolving the variant once.
    ///
    /// Fails with [`GroupError::Mixed`] when concepts span more than one
    /// coding system, [`GroupError::Empty`] when no concept carries a
    /// known system, and [`GroupError::Unrecognized`] when a lab or
    /// medication code is not in the recognized table.
    pub fn try_new(
        concepts: &[CodedConcept],
        label: impl Into<String>,
        style: ChartStyle,
    ) -> Result<Self, GroupError> {
        let mut kind: Option<CodeKind> = None;
        for concept in concepts {
            let Some(k) = concept.kind() else { continue };
            match kind {
                None => kind = Some(k),
                Some(existing) if existing != k => return Err(GroupError::Mixed),
                Some(_) => {}
            }
        }

        let codes = match kind.ok_or(GroupError::Empty)? {
            CodeKind::Lab => CodeGroupCodes::Lab(
                concepts
                    .iter()
                    .filter(|c| c.kind() == Some(CodeKind::Lab))
                    .map(|c| {
                        LabCode::resolve(&c.code).ok_or_else(|| {
                            GroupError::Unrecognized(c.code.clone(), c.system.clone())
                        })
                    })
                    .collect::<Result<_, _>>()?,
            ),
            CodeKind::Medication => CodeGroupCodes::Medication(
                concepts
                    .iter()
                    .filter(|c| c.kind() == Some(CodeKind::Medication))
                    .map(|c| {
                        MedicationCode::resolve(&c.code).ok_or_else(|| {
                            GroupError::Unrecognized(c.code.clone(), c.system.clone())
                        })
                    })
                    .collect::<Result<_, _>>()?,
            ),
            CodeKind::Microbio => CodeGroupCodes::Microbio(
                concepts
                    .iter()
                    .filter(|c| c.kind() == Some(CodeKind::Microbio))
                    .map(|c| MicrobioCode::new(&c.code, &c.label))
                    .collect(),
            ),
        };

        Ok(Self {
            codes,
            label: label.into(),
            style,
        })
    }

    pub fn codes(&self) -> &CodeGroupCodes {
        &self.codes
    }

    pub fn kind(&self) -> CodeKind {
        match self.codes {
            CodeGroupCodes::Lab(_) => CodeKind::Lab,
            CodeGroupCodes::Medication(_) => CodeKind::Medication,
            CodeGroupCodes::Microbio(_) => CodeKind::Microbio,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn style(&self) -> ChartStyle {
        self.style
    }

    /// Raw code strings of every member, in input order.
    pub fn code_strings(&self) -> Vec<&str> {
        match &self.codes {
            CodeGroupCodes::Lab(codes) => codes.iter().map(LabCode::as_str).collect(),
            CodeGroupCodes::Medication(codes) => codes.iter().map(MedicationCode::as_str).collect(),
            CodeGroupCodes::Microbio(codes) => codes.iter().map(|c| c.code.as_str()).collect(),
        }
    }
}
