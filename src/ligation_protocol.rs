//! Reaction setup for a vector:insert ligation.

use crate::error::CloningError;
use serde::{Deserialize, Serialize};

/// Average mass of one base pair of double-stranded DNA, in Da.
pub const AVERAGE_BP_MASS: f64 = 650.0;
pub const LIGASE_VOLUME_UL: f64 = 1.0;
/// 10x buffer, so one tenth of the reaction.
pub const BUFFER_FRACTION: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LigationParams {
    pub vector_amount_ng: f64,
    pub vector_length_bp: f64,
    pub insert_length_bp: f64,
    pub molar_ratio: f64,
    pub vector_concentration_ng_per_ul: f64,
    pub insert_concentration_ng_per_ul: f64,
    pub reaction_volume_ul: f64,
}

impl Default for LigationParams {
    fn default() -> Self {
        Self {
            vector_amount_ng: 50.0,
            vector_length_bp: 3000.0,
            insert_length_bp: 1000.0,
            molar_ratio: 3.0,
            vector_concentration_ng_per_ul: 50.0,
            insert_concentration_ng_per_ul: 50.0,
            reaction_volume_ul: 20.0,
        }
    }
}

impl LigationParams {
    fn validate(&self) -> Result<(), CloningError> {
        let fields = [
            ("vector_amount_ng", self.vector_amount_ng),
            ("vector_length_bp", self.vector_length_bp),
            ("insert_length_bp", self.insert_length_bp),
            ("molar_ratio", self.molar_ratio),
            ("vector_concentration_ng_per_ul", self.vector_concentration_ng_per_ul),
            ("insert_concentration_ng_per_ul", self.insert_concentration_ng_per_ul),
            ("reaction_volume_ul", self.reaction_volume_ul),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite() || *v <= 0.0) {
            Some((name, v)) => Err(CloningError::InvalidParameter(format!(
                "{name} must be a positive number, got {v}"
            ))),
            None => Ok(()),
        }
    }
}

/// Amounts and pipetting volumes; volumes in µL, amounts in pmol or ng.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LigationProtocol {
    pub vector_pmol: f64,
    pub insert_pmol: f64,
    pub vector_amount_ng: f64,
    pub insert_amount_ng: f64,
    pub vector_volume_ul: f64,
    pub insert_volume_ul: f64,
    pub ligase_volume_ul: f64,
    pub buffer_volume_ul: f64,
    pub water_volume_ul: f64,
    pub reaction_volume_ul: f64,
}

impl LigationProtocol {
    pub fn compute(params: &LigationParams) -> Result<Self, CloningError> {
        params.validate()?;
        let vector_pmol =
            params.vector_amount_ng / (params.vector_length_bp * AVERAGE_BP_MASS) * 1000.0;
        let insert_pmol = vector_pmol * params.molar_ratio;
        let insert_amount_ng = insert_pmol * params.insert_length_bp * AVERAGE_BP_MASS / 1000.0;
        let vector_volume_ul = params.vector_amount_ng / params.vector_concentration_ng_per_ul;
        let insert_volume_ul = insert_amount_ng / params.insert_concentration_ng_per_ul;
        let buffer_volume_ul = params.reaction_volume_ul * BUFFER_FRACTION;
        let water_volume_ul = params.reaction_volume_ul
            - vector_volume_ul
            - insert_volume_ul
            - LIGASE_VOLUME_UL
            - buffer_volume_ul;
        if water_volume_ul < 0.0 {
            return Err(CloningError::Arithmetic(format!(
                "DNA, ligase and buffer need {:.2} µL, more than the {} µL reaction",
                params.reaction_volume_ul - water_volume_ul,
                params.reaction_volume_ul
            )));
        }
        log::debug!(
            "Ligation: {vector_pmol:.4} pmol vector, {insert_pmol:.4} pmol insert, \
             {water_volume_ul:.2} µL water"
        );
        Ok(Self {
            vector_pmol,
            insert_pmol,
            vector_amount_ng: params.vector_amount_ng,
            insert_amount_ng,
            vector_volume_ul,
            insert_volume_ul,
            ligase_volume_ul: LIGASE_VOLUME_UL,
            buffer_volume_ul,
            water_volume_ul,
            reaction_volume_ul: params.reaction_volume_ul,
        })
    }

    pub fn total_volume_ul(&self) -> f64 {
        self.vector_volume_ul
            + self.insert_volume_ul
            + self.ligase_volume_ul
            + self.buffer_volume_ul
            + self.water_volume_ul
    }
}
