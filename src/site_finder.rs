//! Restriction site search over linear and circular sequences.

use crate::{
    dna_sequence::{SequenceRecord, Topology},
    restriction_enzyme::{RestrictionEnzyme, RestrictionSite},
};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Sites per enzyme name. Every searched enzyme has an entry, empty if it
/// does not cut.
pub type SiteMap = BTreeMap<String, Vec<RestrictionSite>>;

/// The bytes to scan: the uppercased sequence, followed on circular sequences
/// by its first `max_recognition_len - 1` bases.
fn search_buffer(sequence: &str, topology: Topology, max_recognition_len: usize) -> Vec<u8> {
    let forward = sequence.as_bytes();
    let mut ret = Vec::with_capacity(forward.len() + max_recognition_len);
    ret.extend(forward.iter().map(|c| c.to_ascii_uppercase()));
    if topology == Topology::Circular {
        let extension = max_recognition_len.saturating_sub(1).min(forward.len());
        ret.extend_from_within(..extension);
    }
    ret
}

fn max_recognition_len(enzymes: &[&RestrictionEnzyme]) -> usize {
    enzymes
        .iter()
        .map(|re| re.recognition_len())
        .max()
        .unwrap_or(0)
}

pub fn find_sites(
    sequence: &str,
    enzymes: &[&RestrictionEnzyme],
    topology: Topology,
) -> SiteMap {
    let haystack = search_buffer(sequence, topology, max_recognition_len(enzymes));
    let seq_len = sequence.len();
    let ret: SiteMap = enzymes
        .iter()
        .map(|re| (re.name.to_owned(), re.get_sites(&haystack, seq_len, topology)))
        .collect();
    log::debug!(
        "Searched {} enzyme(s) over {seq_len} bp ({topology:?}), {} site(s)",
        enzymes.len(),
        ret.values().map(|v| v.len()).sum::<usize>()
    );
    ret
}

/// Same result as [`find_sites`], with the per-enzyme scans spread over the
/// rayon pool.
pub fn find_sites_parallel(
    sequence: &str,
    enzymes: &[&RestrictionEnzyme],
    topology: Topology,
) -> SiteMap {
    let haystack = search_buffer(sequence, topology, max_recognition_len(enzymes));
    let seq_len = sequence.len();
    enzymes
        .par_iter()
        .map(|re| (re.name.to_owned(), re.get_sites(&haystack, seq_len, topology)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

pub fn find_sites_in_record(record: &SequenceRecord, enzymes: &[&RestrictionEnzyme]) -> SiteMap {
    find_sites(record.sequence(), enzymes, record.topology())
}

/// All sites of all enzymes, ordered by cut position, then enzyme name.
pub fn merge_sites(sites: &SiteMap) -> Vec<RestrictionSite> {
    let mut ret: Vec<RestrictionSite> = sites.values().flatten().cloned().collect();
    sort_sites(&mut ret);
    ret
}

pub fn sort_sites(sites: &mut [RestrictionSite]) {
    sites.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.enzyme.cmp(&b.enzyme))
    });
}

pub fn count_sites(sites: &SiteMap) -> BTreeMap<String, usize> {
    sites
        .iter()
        .map(|(name, list)| (name.to_owned(), list.len()))
        .collect()
}

/// Enzymes that cut exactly once, in name order.
pub fn single_cutters(sites: &SiteMap) -> Vec<String> {
    sites
        .iter()
        .filter(|(_, list)| list.len() == 1)
        .map(|(name, _)| name.to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dna_sequence::Strand, enzymes::EnzymeCatalog};

    fn catalog() -> EnzymeCatalog {
        EnzymeCatalog::builtin().unwrap()
    }

    #[test]
    fn test_single_ecori_site() {
        let catalog = catalog();
        let sites = find_sites("ATGCGAATTCGCTA", &catalog.select(&["EcoRI"]), Topology::Linear);
        let ecori = &sites["EcoRI"];
        assert_eq!(ecori.len(), 1);
        assert_eq!(ecori[0].strand, Strand::Forward);
        assert_eq!(ecori[0].recognition_start, 4);
        assert_eq!(ecori[0].recognition_end, 10);
        assert_eq!(ecori[0].position, 5);
    }

    #[test]
    fn test_palindromic_site_reported_once() {
        let catalog = catalog();
        let sites = find_sites("GAATTCATGCGAATTC", &catalog.select(&["EcoRI"]), Topology::Linear);
        assert_eq!(sites["EcoRI"].len(), 2);
        assert!(sites["EcoRI"].iter().all(|s| s.strand == Strand::Forward));
    }

    #[test]
    fn test_no_sites_is_empty_list() {
        let catalog = catalog();
        let sites = find_sites("ATGCATGCATGC", &catalog.select(&["EcoRI"]), Topology::Linear);
        assert!(sites.contains_key("EcoRI"));
        assert!(sites["EcoRI"].is_empty());
        let sites = find_sites("", &catalog.select(&["EcoRI"]), Topology::Circular);
        assert!(sites["EcoRI"].is_empty());
    }

    #[test]
    fn test_site_spanning_origin() {
        let catalog = catalog();
        let enzymes = catalog.select(&["EcoRI"]);
        // GAATTC split across the end and the start
        let seq = "TTCAAAAAAAAAAAGAA";
        assert!(find_sites(seq, &enzymes, Topology::Linear)["EcoRI"].is_empty());
        let sites = find_sites(seq, &enzymes, Topology::Circular);
        assert_eq!(sites["EcoRI"].len(), 1);
        let site = &sites["EcoRI"][0];
        assert_eq!(site.recognition_start, 14);
        assert_eq!(site.recognition_end, 20);
        assert_eq!(site.position, 15);
    }

    #[test]
    fn test_circular_does_not_double_count() {
        let catalog = catalog();
        let enzymes = catalog.select(&["EcoRI", "NotI"]);
        let seq = "GAATTCAAAAAAAAAA";
        let sites = find_sites(seq, &enzymes, Topology::Circular);
        assert_eq!(sites["EcoRI"].len(), 1);
        assert_eq!(sites["EcoRI"][0].recognition_start, 0);
    }

    #[test]
    fn test_lowercase_input() {
        let catalog = catalog();
        let sites = find_sites("atgcgaattcgcta", &catalog.select(&["EcoRI"]), Topology::Linear);
        assert_eq!(sites["EcoRI"].len(), 1);
    }

    #[test]
    fn test_merge_sites_sorted_by_position_then_name() {
        let catalog = catalog();
        let enzymes = catalog.select(&["XbaI", "BamHI", "EcoRI", "SpeI"]);
        let seq = "AAGGATCCAAGAATTCAATCTAGATT";
        let merged = merge_sites(&find_sites(seq, &enzymes, Topology::Linear));
        let positions: Vec<(usize, &str)> = merged
            .iter()
            .map(|s| (s.position, s.enzyme.as_str()))
            .collect();
        assert_eq!(positions, vec![(3, "BamHI"), (11, "EcoRI"), (19, "XbaI")]);
    }

    #[test]
    fn test_sort_ties_broken_by_enzyme_name() {
        let site = |enzyme: &str| RestrictionSite {
            enzyme: enzyme.to_string(),
            strand: Strand::Forward,
            recognition_start: 2,
            recognition_end: 8,
            position: 3,
            overhang_seq: None,
        };
        let mut sites = vec![site("XbaI"), site("BamHI")];
        sort_sites(&mut sites);
        assert_eq!(sites[0].enzyme, "BamHI");
    }

    #[test]
    fn test_count_and_single_cutters() {
        let catalog = catalog();
        let enzymes = catalog.select(&["EcoRI", "BamHI", "HindIII"]);
        let sites = find_sites("GAATTCATGCGGATCCGAATTC", &enzymes, Topology::Linear);
        let counts = count_sites(&sites);
        assert_eq!(counts["EcoRI"], 2);
        assert_eq!(counts["BamHI"], 1);
        assert_eq!(counts["HindIII"], 0);
        assert_eq!(single_cutters(&sites), vec!["BamHI".to_string()]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let catalog = catalog();
        let enzymes: Vec<&RestrictionEnzyme> = catalog.restriction_enzymes().collect();
        let seq = "GGTCTCAAGAATTCGCGGCCGCTTGAGACCAAGCTTCCCGGGATCGATGGATCCAGATCTACTAGT"
            .repeat(7);
        for topology in [Topology::Linear, Topology::Circular] {
            let sequential = find_sites(&seq, &enzymes, topology);
            let parallel = find_sites_parallel(&seq, &enzymes, topology);
            assert_eq!(sequential, parallel);
            assert_eq!(merge_sites(&sequential), merge_sites(&parallel));
        }
    }

    #[test]
    fn test_repeated_calls_identical() {
        let catalog = catalog();
        let enzymes: Vec<&RestrictionEnzyme> = catalog.restriction_enzymes().collect();
        let seq = "GAATTCGGATCCAAGCTTGTCGACGGTCTCA";
        assert_eq!(
            find_sites(seq, &enzymes, Topology::Circular),
            find_sites(seq, &enzymes, Topology::Circular)
        );
    }
}
