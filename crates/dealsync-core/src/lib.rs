pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "ma")]
pub mod ma;

#[cfg(feature = "deal")]
pub mod deal;

pub use error::DealSyncError;
pub use types::*;

#[cfg(feature = "valuation")]
pub use valuation::{
    comps::{implied_band, PeerSet},
    dcf::{calculate_dcf, compute_dcf, DcfInput, DcfResult},
    football_field::{
        build_football_field, calculate_football_field, dcf_band, FootballFieldInput,
        FootballFieldResult, SensitivityPolicy, ValuationBand, ValuationMethod,
    },
    sensitivity::{
        calculate_dcf_sensitivity, dcf_sensitivity, DcfSensitivityInput, SensitivityOutput,
    },
};

#[cfg(feature = "ma")]
pub use ma::{
    accretion::{
        analyze_accretion_dilution, calculate_accretion, AccretionDilutionResult, AccretionInput,
    },
    synergy::{
        calculate_synergies, compute_synergy_npv, compute_synergy_npv_with_model, SynergyInput,
        SynergyItems, SynergyModel, SynergyResult,
    },
};

#[cfg(feature = "deal")]
pub use deal::{analyze_deal, DealAnalysis, DealInputs, DealModel};

/// Standard result type for all dealsync operations
pub type DealSyncResult<T> = Result<T, DealSyncError>;
