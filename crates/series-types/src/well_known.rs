//! Well-known labels and metadata field names.
//!
//! Label constants are shared by every ontology version; field names are the
//! normalized keys produced by the DICOM metadata extraction step.
//!
//! # Examples
//!
//! ```
//! use series_types::well_known::{self, fields};
//!
//! assert_eq!(well_known::PLANE_TYPE_AXIAL, "axial");
//! assert_eq!(fields::SERIES_DESCRIPTION, "Series-Description");
//! ```

// =============================================================================
// Plane
// =============================================================================

/// Axial (transverse) plane.
pub const PLANE_TYPE_AXIAL: &str = "axial";
/// Coronal plane.
pub const PLANE_TYPE_CORONAL: &str = "coronal";
/// Sagittal plane.
pub const PLANE_TYPE_SAGITTAL: &str = "sagittal";

// =============================================================================
// Weighting
// =============================================================================

/// T1-weighted.
pub const WEIGHTING_T1: &str = "t1";
/// T2-weighted.
pub const WEIGHTING_T2: &str = "t2";
/// Diffusion weighted imaging, as a weighting label (ontology v21).
pub const WEIGHTING_DWI: &str = "DWI";
/// Apparent diffusion coefficient map, as a weighting label (ontology v21).
pub const WEIGHTING_ADC: &str = "ADC";

// =============================================================================
// Phase
// =============================================================================

/// In-phase image.
pub const PHASE_IN: &str = "in";
/// Out-of-phase image.
pub const PHASE_OUT: &str = "out";
/// Series holding both in- and out-of-phase images.
pub const PHASE_IN_OUT: &str = "in-out";

// =============================================================================
// Acquisition echo
// =============================================================================

/// Spin echo acquisition.
pub const ECHO_SPIN: &str = "spin";
/// Gradient echo acquisition.
pub const ECHO_GRADIENT: &str = "gradient";

// =============================================================================
// Contrast timing
// =============================================================================
// https://radiopaedia.org/articles/contrast-phases

/// Before contrast injection.
pub const CONTRAST_TIMING_PRE: &str = "pre";
/// Initial (arterial) stage.
pub const CONTRAST_TIMING_ARTERIAL: &str = "arterial";
/// Intermediate (portal venous) stage, usually 60-120 sec.
pub const CONTRAST_TIMING_PORTAL: &str = "portal";
/// Delayed stage, usually 3-5 minutes after administration or later.
pub const CONTRAST_TIMING_DELAYED: &str = "delayed";

// =============================================================================
// Binary concepts
// =============================================================================

/// Contrast agent present.
pub const CONTRAST_YES: &str = "+";
/// Contrast agent absent.
pub const CONTRAST_NO: &str = ".";
/// Fat suppressed.
pub const FS_YES: &str = "+";
/// Diffusion weighted.
pub const DWI_YES: &str = "+";
/// Not diffusion weighted.
pub const DWI_NO: &str = ".";
/// ADC map.
pub const ADC_YES: &str = "+";
/// Not an ADC map.
pub const ADC_NO: &str = ".";

/// Normalized metadata field names.
pub mod fields {
    /// Imaging modality (`MR`, `CT`, ...).
    pub const MODALITY: &str = "Modality";
    /// Patient identifier, the patient-level join key.
    pub const PATIENT_ID: &str = "Patient_ID";
    /// Series instance UID.
    pub const SERIES_ID: &str = "ID-Series";
    /// Patient age.
    pub const PATIENT_AGE: &str = "Patient_Age";
    /// Patient weight.
    pub const PATIENT_WEIGHT: &str = "Patient_Weight";
    /// Patient sex.
    pub const PATIENT_SEX: &str = "Patient_Sex";
    /// Free-text series description.
    pub const SERIES_DESCRIPTION: &str = "Series-Description";
    /// Contrast/Bolus agent tag.
    pub const CONTRAST_AGENT: &str = "Contrast-Agent";
    /// Repetition time.
    pub const REPETITION_TIME: &str = "Image-param_Repetition-Time";
    /// Echo time.
    pub const ECHO_TIME: &str = "Image-param_Echo-Time";
    /// Flip angle.
    pub const FLIP_ANGLE: &str = "Image-param_FlipAngle";
    /// Sequence name.
    pub const SEQUENCE_NAME: &str = "Sequence-Name";
    /// Sequence variant.
    pub const SEQUENCE_VARIANT: &str = "Sequence-Variant";
    /// Protocol name.
    pub const PROTOCOL_NAME: &str = "Protocol-Name";
    /// Photometric interpretation.
    pub const PHOTOMETRIC_INTERPRETATION: &str = "Photometric-Interpretation";
    /// Echo number(s).
    pub const ECHO_NUMBERS: &str = "Echo-Numbers";

    /// Source collection column of the input table.
    pub const COLLECTION: &str = "Collection";
    /// Series location column of the input table.
    pub const FILE_LOCATION: &str = "File Location";

    /// Metadata fields copied into every output row.
    pub const DEFAULT_PARAMS: &[&str] = &[
        MODALITY,
        PATIENT_ID,
        SERIES_ID,
        PATIENT_AGE,
        PATIENT_WEIGHT,
        PATIENT_SEX,
    ];

    /// Metadata fields that carry most of the information needed to classify
    /// weighting, plane, acquisition and contrast presence.
    pub const RELEVANT_PARAMS: &[&str] = &[
        REPETITION_TIME,
        ECHO_TIME,
        CONTRAST_AGENT,
        FLIP_ANGLE,
        SEQUENCE_NAME,
        SEQUENCE_VARIANT,
        PROTOCOL_NAME,
        SERIES_DESCRIPTION,
        PHOTOMETRIC_INTERPRETATION,
        ECHO_NUMBERS,
        MODALITY,
    ];
}
