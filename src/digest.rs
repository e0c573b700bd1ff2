//! Turns a set of cut sites into the fragments of a restriction digest.

use crate::{
    dna_sequence::{Feature, SequenceRecord, Strand},
    enzymes::EnzymeCatalog,
    ids::{IdGenerator, UuidIds},
    iupac_code::reverse_complement,
    restriction_enzyme::{OverhangType, RestrictionEnzyme, RestrictionSite},
    site_finder::sort_sites,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndType {
    #[serde(rename = "blunt")]
    Blunt,
    #[serde(rename = "5'-overhang")]
    FivePrimeOverhang,
    #[serde(rename = "3'-overhang")]
    ThreePrimeOverhang,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentEnd {
    pub end_type: EndType,
    pub overhang_seq: Option<String>,
    pub enzyme: Option<String>,
}

impl FragmentEnd {
    /// A sequence terminus no enzyme acted on.
    pub fn blunt() -> Self {
        Self {
            end_type: EndType::Blunt,
            overhang_seq: None,
            enzyme: None,
        }
    }

    /// The 3' end left on the fragment upstream of a cut by `enzyme`.
    pub fn create(enzyme: &RestrictionEnzyme, strand: Strand) -> Self {
        let end_type = match enzyme.overhang_type {
            OverhangType::Blunt => EndType::Blunt,
            OverhangType::FivePrime => EndType::FivePrimeOverhang,
            OverhangType::ThreePrime => EndType::ThreePrimeOverhang,
        };
        let overhang_seq = match (end_type, strand) {
            (EndType::Blunt, _) => None,
            (_, Strand::Forward) => Some(enzyme.overhang_seq.to_owned()),
            (_, Strand::Reverse) => Some(reverse_complement(&enzyme.overhang_seq)),
        };
        Self {
            end_type,
            overhang_seq,
            enzyme: Some(enzyme.name.to_owned()),
        }
    }

    /// The 3' end left upstream of `site`. Uses the overhang bases read from
    /// the cut sequence when the site carries them, so that enzymes with a
    /// degenerate overhang produce the ends they actually leave.
    pub fn from_site(enzyme: &RestrictionEnzyme, site: &RestrictionSite) -> Self {
        let mut end = Self::create(enzyme, site.strand);
        if end.is_sticky() && site.overhang_seq.is_some() {
            end.overhang_seq = site.overhang_seq.to_owned();
        }
        end
    }

    /// The matching end on the other side of the same cut.
    pub fn complement(&self) -> Self {
        let end_type = match self.end_type {
            EndType::Blunt => EndType::Blunt,
            EndType::FivePrimeOverhang => EndType::ThreePrimeOverhang,
            EndType::ThreePrimeOverhang => EndType::FivePrimeOverhang,
        };
        Self {
            end_type,
            overhang_seq: self.overhang_seq.as_deref().map(reverse_complement),
            enzyme: self.enzyme.to_owned(),
        }
    }

    pub fn is_blunt(&self) -> bool {
        self.end_type == EndType::Blunt
    }

    pub fn is_sticky(&self) -> bool {
        !self.is_blunt()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DigestFragment {
    pub id: String,
    pub sequence: String,
    pub length: usize,
    pub start: usize,
    pub end: usize,
    pub five_prime_end: FragmentEnd,
    pub three_prime_end: FragmentEnd,
    pub features: Vec<Feature>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnknownEnzyme,
    OutOfRange,
    DuplicatePosition,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSite {
    pub site: RestrictionSite,
    pub reason: SkipReason,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestStats {
    pub total_fragments: usize,
    pub largest_fragment: usize,
    pub smallest_fragment: usize,
    pub average_fragment: usize,
}

impl DigestStats {
    pub fn new(fragments: &[DigestFragment]) -> Self {
        let lengths = fragments.iter().map(|f| f.length);
        let total = fragments.len();
        if total == 0 {
            return Self::default();
        }
        Self {
            total_fragments: total,
            largest_fragment: lengths.clone().max().unwrap_or(0),
            smallest_fragment: lengths.clone().min().unwrap_or(0),
            average_fragment: lengths.sum::<usize>() / total,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DigestReport {
    pub fragments: Vec<DigestFragment>,
    pub skipped_sites: Vec<SkippedSite>,
    pub stats: DigestStats,
}

pub fn digest_stats(fragments: &[DigestFragment]) -> DigestStats {
    DigestStats::new(fragments)
}

/// A usable cut: where, and the 3' end it leaves on the upstream fragment.
struct Cut {
    position: usize,
    upstream_end: FragmentEnd,
}

pub fn digest(
    record: &SequenceRecord,
    sites: &[RestrictionSite],
    catalog: &EnzymeCatalog,
) -> Vec<DigestFragment> {
    digest_with_report(record, sites, catalog, &UuidIds).fragments
}

pub fn digest_with_report(
    record: &SequenceRecord,
    sites: &[RestrictionSite],
    catalog: &EnzymeCatalog,
    ids: &dyn IdGenerator,
) -> DigestReport {
    let (cuts, skipped_sites) = resolve_cuts(record, sites, catalog);
    let fragments = if cuts.is_empty() {
        vec![whole_sequence(record, ids)]
    } else if record.is_circular() {
        cut_circular(record, &cuts, ids)
    } else {
        cut_linear(record, &cuts, ids)
    };
    let stats = DigestStats::new(&fragments);
    DigestReport {
        fragments,
        skipped_sites,
        stats,
    }
}

fn resolve_cuts(
    record: &SequenceRecord,
    sites: &[RestrictionSite],
    catalog: &EnzymeCatalog,
) -> (Vec<Cut>, Vec<SkippedSite>) {
    let len = record.len();
    let mut sorted = sites.to_vec();
    if record.is_circular() && len > 0 {
        for site in sorted.iter_mut() {
            site.position %= len;
        }
    }
    sort_sites(&mut sorted);

    let mut cuts: Vec<Cut> = Vec::with_capacity(sorted.len());
    let mut skipped = vec![];
    for site in sorted {
        let Some(enzyme) = catalog.get(&site.enzyme) else {
            log::warn!(
                "Site at {} references enzyme '{}' missing from the catalog, skipped",
                site.position,
                site.enzyme
            );
            skipped.push(SkippedSite {
                site,
                reason: SkipReason::UnknownEnzyme,
            });
            continue;
        };
        let in_range = if record.is_circular() {
            len > 0
        } else {
            site.position > 0 && site.position < len
        };
        if !in_range {
            log::warn!(
                "{} cut at {} is outside the {len} bp sequence, skipped",
                site.enzyme,
                site.position
            );
            skipped.push(SkippedSite {
                site,
                reason: SkipReason::OutOfRange,
            });
            continue;
        }
        if cuts.last().is_some_and(|c| c.position == site.position) {
            log::debug!("{} cut at {} duplicates an earlier cut", site.enzyme, site.position);
            skipped.push(SkippedSite {
                site,
                reason: SkipReason::DuplicatePosition,
            });
            continue;
        }
        cuts.push(Cut {
            position: site.position,
            upstream_end: FragmentEnd::from_site(enzyme, &site),
        });
    }
    (cuts, skipped)
}

fn whole_sequence(record: &SequenceRecord, ids: &dyn IdGenerator) -> DigestFragment {
    DigestFragment {
        id: ids.next_id("fragment"),
        sequence: record.sequence().to_string(),
        length: record.len(),
        start: 0,
        end: record.len(),
        five_prime_end: FragmentEnd::blunt(),
        three_prime_end: FragmentEnd::blunt(),
        features: record.features().to_vec(),
    }
}

fn cut_linear(record: &SequenceRecord, cuts: &[Cut], ids: &dyn IdGenerator) -> Vec<DigestFragment> {
    let mut bounds = Vec::with_capacity(cuts.len() + 2);
    bounds.push(0);
    bounds.extend(cuts.iter().map(|c| c.position));
    bounds.push(record.len());

    bounds
        .windows(2)
        .enumerate()
        .map(|(k, w)| {
            let (start, end) = (w[0], w[1]);
            let five_prime_end = match k {
                0 => FragmentEnd::blunt(),
                k => cuts[k - 1].upstream_end.complement(),
            };
            let three_prime_end = cuts
                .get(k)
                .map(|c| c.upstream_end.to_owned())
                .unwrap_or_else(FragmentEnd::blunt);
            DigestFragment {
                id: ids.next_id("fragment"),
                sequence: record.sequence()[start..end].to_string(),
                length: end - start,
                start,
                end,
                five_prime_end,
                three_prime_end,
                features: features_within(record, start, end),
            }
        })
        .collect()
}

fn cut_circular(
    record: &SequenceRecord,
    cuts: &[Cut],
    ids: &dyn IdGenerator,
) -> Vec<DigestFragment> {
    let len = record.len();
    (0..cuts.len())
        .map(|k| {
            let from = &cuts[k];
            let to = &cuts[(k + 1) % cuts.len()];
            let (start, end) = (from.position, to.position);
            let sequence = record.get_range_safe(start..end).unwrap_or_default();
            DigestFragment {
                id: ids.next_id("fragment"),
                length: sequence.len(),
                sequence,
                start,
                end,
                five_prime_end: from.upstream_end.complement(),
                three_prime_end: to.upstream_end.to_owned(),
                features: if start < end {
                    features_within(record, start, end)
                } else {
                    features_across_origin(record, start, end, len)
                },
            }
        })
        .collect()
}

/// Features fully inside `[start, end)`, rebased to `start`.
fn features_within(record: &SequenceRecord, start: usize, end: usize) -> Vec<Feature> {
    record
        .features()
        .iter()
        .filter(|f| f.start() >= start && f.end() <= end)
        .map(|f| f.moved_to(f.start() - start))
        .collect()
}

/// Features fully inside `[start, len)` or `[0, end)` of a fragment that runs
/// over the origin, rebased to `start`.
fn features_across_origin(
    record: &SequenceRecord,
    start: usize,
    end: usize,
    len: usize,
) -> Vec<Feature> {
    record
        .features()
        .iter()
        .filter_map(|f| {
            if f.start() >= start {
                Some(f.moved_to(f.start() - start))
            } else if f.end() <= end {
                Some(f.moved_to(f.start() + len - start))
            } else {
                None
            }
        })
        .collect()
}
