//! End compatibility and ligation product prediction.
//!
//! Product probabilities are fixed per-type weights. Each product type is
//! tested on its own, so the weights of the products returned for one pair of
//! fragments need not add up to 1.

use crate::{
    digest::{DigestFragment, FragmentEnd},
    dna_sequence::Feature,
    error::CloningError,
    ids::{IdGenerator, UuidIds},
    iupac_code::reverse_complement,
};
use serde::{Deserialize, Serialize};

pub const CORRECT_WEIGHT: f64 = 0.6;
pub const REVERSE_WEIGHT: f64 = 0.3;
pub const SELF_LIGATION_WEIGHT: f64 = 0.1;
pub const CONCATEMER_WEIGHT: f64 = 0.05;
/// Insert:vector molar ratio above which a second insert copy is predicted.
pub const CONCATEMER_MIN_RATIO: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductType {
    Correct,
    Reverse,
    SelfLigation,
    Concatemer,
    Other,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LigationProduct {
    pub id: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub sequence: String,
    pub length: usize,
    pub probability: f64,
    pub fragment_ids: Vec<String>,
    pub description: String,
    pub is_desired: bool,
    pub features: Vec<Feature>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LigationEfficiency {
    High,
    Low,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub compatible: bool,
    pub warnings: Vec<String>,
    pub efficiency: LigationEfficiency,
}

/// Whether two fragment ends can be joined. Blunt joins blunt; a sticky end
/// needs an end of the opposite overhang type whose overhang is its reverse
/// complement.
pub fn compatible(a: &FragmentEnd, b: &FragmentEnd) -> bool {
    match (a.is_blunt(), b.is_blunt()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => {
            a.end_type != b.end_type
                && match (&a.overhang_seq, &b.overhang_seq) {
                    (Some(x), Some(y)) => *x == reverse_complement(y),
                    _ => false,
                }
        }
    }
}

/// Whether `left`'s 3' end can be joined to `right`'s 5' end.
pub fn check_compatibility(left: &DigestFragment, right: &DigestFragment) -> CompatibilityReport {
    let (a, b) = (&left.three_prime_end, &right.five_prime_end);
    let compatible = compatible(a, b);
    let mut warnings = vec![];
    match (a.is_blunt(), b.is_blunt()) {
        (true, true) => warnings.push("Blunt-end ligation has lower efficiency".to_string()),
        (true, false) | (false, true) => {
            warnings.push("Incompatible end types: blunt and sticky".to_string())
        }
        (false, false) if !compatible => warnings.push(format!(
            "Overhangs {} and {} are not complementary",
            a.overhang_seq.as_deref().unwrap_or("-"),
            b.overhang_seq.as_deref().unwrap_or("-")
        )),
        (false, false) => {}
    }
    let efficiency = if compatible && warnings.is_empty() {
        LigationEfficiency::High
    } else {
        LigationEfficiency::Low
    };
    CompatibilityReport {
        compatible,
        warnings,
        efficiency,
    }
}

pub fn predict_products(
    vector: &DigestFragment,
    insert: &DigestFragment,
) -> Vec<LigationProduct> {
    predict_products_with_ids(vector, insert, None, &UuidIds)
}

pub fn predict_products_with_ratio(
    vector: &DigestFragment,
    insert: &DigestFragment,
    molar_ratio: f64,
) -> Vec<LigationProduct> {
    predict_products_with_ids(vector, insert, Some(molar_ratio), &UuidIds)
}

/// Candidate products of joining `insert` into `vector`, in the order correct,
/// reverse, self-ligation, concatemer. Concatemers are only considered when a
/// molar ratio is given.
pub fn predict_products_with_ids(
    vector: &DigestFragment,
    insert: &DigestFragment,
    molar_ratio: Option<f64>,
    ids: &dyn IdGenerator,
) -> Vec<LigationProduct> {
    let (v5, v3) = (&vector.five_prime_end, &vector.three_prime_end);
    let (i5, i3) = (&insert.five_prime_end, &insert.three_prime_end);
    let both_ids = vec![vector.id.to_owned(), insert.id.to_owned()];
    let mut ret = vec![];

    let correct = compatible(v5, i3) && compatible(v3, i5);
    if correct {
        let sequence = format!("{}{}", vector.sequence, insert.sequence);
        let mut features = vector.features.clone();
        features.extend(shifted_features(insert, vector.length, false));
        ret.push(LigationProduct {
            id: ids.next_id("product"),
            product_type: ProductType::Correct,
            length: sequence.len(),
            sequence,
            probability: CORRECT_WEIGHT,
            fragment_ids: both_ids.clone(),
            description: "Vector backbone with insert in correct orientation".to_string(),
            is_desired: true,
            features,
        });
    }

    if compatible(v5, i5) && compatible(v3, i3) {
        let sequence = format!("{}{}", vector.sequence, reverse_complement(&insert.sequence));
        let mut features = vector.features.clone();
        features.extend(shifted_features(insert, vector.length, true));
        ret.push(LigationProduct {
            id: ids.next_id("product"),
            product_type: ProductType::Reverse,
            length: sequence.len(),
            sequence,
            probability: REVERSE_WEIGHT,
            fragment_ids: both_ids.clone(),
            description: "Vector backbone with insert in reverse orientation".to_string(),
            is_desired: false,
            features,
        });
    }

    if compatible(v5, v3) {
        ret.push(LigationProduct {
            id: ids.next_id("product"),
            product_type: ProductType::SelfLigation,
            sequence: vector.sequence.to_owned(),
            length: vector.length,
            probability: SELF_LIGATION_WEIGHT,
            fragment_ids: vec![vector.id.to_owned()],
            description: "Vector self-ligation (no insert)".to_string(),
            is_desired: false,
            features: vector.features.clone(),
        });
    }

    let many_inserts = molar_ratio.is_some_and(|r| r > CONCATEMER_MIN_RATIO);
    if correct && many_inserts && compatible(i3, i5) {
        let sequence = format!("{}{}{}", vector.sequence, insert.sequence, insert.sequence);
        let mut features = vector.features.clone();
        features.extend(shifted_features(insert, vector.length, false));
        features.extend(shifted_features(insert, vector.length + insert.length, false));
        ret.push(LigationProduct {
            id: ids.next_id("product"),
            product_type: ProductType::Concatemer,
            length: sequence.len(),
            sequence,
            probability: CONCATEMER_WEIGHT,
            fragment_ids: both_ids,
            description: "Vector with two insert copies".to_string(),
            is_desired: false,
            features,
        });
    }

    log::debug!(
        "Ligation of {} into {}: {} product(s)",
        insert.id,
        vector.id,
        ret.len()
    );
    ret
}

/// Products for a caller-selected pair; the first fragment is the vector.
pub fn ligate(
    fragments: &[DigestFragment],
    molar_ratio: Option<f64>,
    ids: &dyn IdGenerator,
) -> Result<Vec<LigationProduct>, CloningError> {
    match fragments {
        [vector, insert] => Ok(predict_products_with_ids(vector, insert, molar_ratio, ids)),
        _ => Err(CloningError::InvalidSelection(format!(
            "ligation needs exactly two fragments, got {}",
            fragments.len()
        ))),
    }
}

pub fn desired_product(products: &[LigationProduct]) -> Option<&LigationProduct> {
    products.iter().find(|p| p.is_desired)
}

fn shifted_features(fragment: &DigestFragment, offset: usize, reversed: bool) -> Vec<Feature> {
    fragment
        .features
        .iter()
        .map(|f| {
            let f = if reversed {
                f.mirrored(fragment.length)
            } else {
                f.clone()
            };
            f.moved_to(f.start() + offset)
        })
        .collect()
}
