//! Ranks pairs of single-cutting enzymes for directional cloning.

use crate::{
    enzymes::EnzymeCatalog,
    restriction_enzyme::{OverhangType, RestrictionEnzyme},
    site_finder::{SiteMap, single_cutters},
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const BASE_SCORE: f64 = 0.5;
const DISTINCT_OVERHANG_BONUS: f64 = 0.2;
const SHARED_BUFFER_BONUS: f64 = 0.15;
const STAR_ACTIVITY_PENALTY: f64 = 0.1;
const HEAT_INACTIVATION_BONUS: f64 = 0.1;
const FIVE_PRIME_BONUS: f64 = 0.05;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnzymePair {
    pub enzyme1: String,
    pub enzyme2: String,
    pub score: f64,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub buffer_compatible: bool,
    #[serde(default)]
    pub shared_buffers: Vec<String>,
}

impl EnzymePair {
    fn score(re1: &RestrictionEnzyme, re2: &RestrictionEnzyme) -> Self {
        let mut score = BASE_SCORE;
        let mut reasons = vec![];
        let mut warnings = vec![];

        if re1.overhang_seq != re2.overhang_seq {
            score += DISTINCT_OVERHANG_BONUS;
            reasons.push(format!(
                "Different overhangs ({} / {}) allow directional cloning",
                display_overhang(re1),
                display_overhang(re2)
            ));
        } else {
            warnings.push(format!(
                "Same overhang ({}), the insert can ligate in either orientation",
                display_overhang(re1)
            ));
        }

        let shared_buffers = shared_buffers(re1, re2);
        let buffer_compatible = !shared_buffers.is_empty();
        if buffer_compatible {
            score += SHARED_BUFFER_BONUS;
            reasons.push(format!("Compatible buffer: {}", shared_buffers.join(", ")));
        } else {
            warnings.push("No common buffer, digest sequentially".to_string());
        }

        for re in [re1, re2] {
            if re.star_activity {
                score -= STAR_ACTIVITY_PENALTY;
                warnings.push(format!("{} has star activity", re.name));
            }
        }

        if re1.heat_inactivation.is_some() && re2.heat_inactivation.is_some() {
            score += HEAT_INACTIVATION_BONUS;
            reasons.push("Both enzymes can be heat-inactivated".to_string());
        }

        if re1.overhang_type == OverhangType::FivePrime
            && re2.overhang_type == OverhangType::FivePrime
        {
            score += FIVE_PRIME_BONUS;
            reasons.push("Both leave 5' overhangs".to_string());
        }

        for re in [re1, re2] {
            if re.methylation_sensitive {
                warnings.push(format!("{} is methylation sensitive", re.name));
            }
        }

        Self {
            enzyme1: re1.name.to_owned(),
            enzyme2: re2.name.to_owned(),
            score: score.clamp(0.0, 1.0),
            reasons,
            warnings,
            buffer_compatible,
            shared_buffers,
        }
    }
}

fn display_overhang(re: &RestrictionEnzyme) -> &str {
    match re.overhang_type {
        OverhangType::Blunt => "blunt",
        _ => &re.overhang_seq,
    }
}

/// Buffers of `re1` that `re2` also lists, compared ignoring case.
fn shared_buffers(re1: &RestrictionEnzyme, re2: &RestrictionEnzyme) -> Vec<String> {
    let other: BTreeSet<String> = re2.buffers.iter().map(|b| b.to_lowercase()).collect();
    re1.buffers
        .iter()
        .filter(|b| other.contains(&b.to_lowercase()))
        .cloned()
        .collect()
}

/// Enzymes cutting exactly once in both the vector and the insert, paired up
/// and scored, best first.
pub fn suggest_pairs(
    vector_sites: &SiteMap,
    insert_sites: &SiteMap,
    catalog: &EnzymeCatalog,
) -> Vec<EnzymePair> {
    let in_insert: BTreeSet<String> = single_cutters(insert_sites).into_iter().collect();
    let candidates: Vec<&RestrictionEnzyme> = single_cutters(vector_sites)
        .into_iter()
        .filter(|name| in_insert.contains(name))
        .filter_map(|name| {
            let re = catalog.get(&name);
            if re.is_none() {
                log::warn!("Single cutter '{name}' is not in the catalog, not paired");
            }
            re
        })
        .collect();
    if candidates.len() < 2 {
        log::debug!("{} shared single cutter(s), no pairs", candidates.len());
        return vec![];
    }

    let mut ret: Vec<EnzymePair> = candidates
        .iter()
        .array_combinations::<2>()
        .map(|[re1, re2]| EnzymePair::score(re1, re2))
        .collect();
    ret.sort_by(|a, b| b.score.total_cmp(&a.score));
    ret
}
