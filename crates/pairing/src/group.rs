use crate::error::{PairingError, Result};
use intended_for_catalog::FieldmapFile;
use std::collections::HashMap;

/// Two complementary fieldmap files sharing a run id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldmapGroup {
    pub run_id: String,

    /// Members in catalog order
    pub members: [FieldmapFile; 2],

    /// Smallest order key among the members
    pub order_key: i64,
}

impl FieldmapGroup {
    fn from_pair(run_id: String, first: FieldmapFile, second: FieldmapFile) -> Result<Self> {
        if first.polarity == second.polarity {
            return Err(PairingError::PolarityMismatch {
                run_id,
                polarity: first.polarity.to_string(),
            });
        }
        let order_key = first.order_key.min(second.order_key);
        Ok(Self {
            run_id,
            members: [first, second],
            order_key,
        })
    }
}

/// Partition fieldmap files into per-run pairs ordered by acquisition.
///
/// Runs are collected in first-seen order, validated (exactly two files of
/// opposite polarity), then stably sorted by `order_key`, so equal keys keep
/// first-seen run order.
pub fn group(fieldmap_files: &[FieldmapFile]) -> Result<Vec<FieldmapGroup>> {
    let mut runs: Vec<(String, Vec<FieldmapFile>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for file in fieldmap_files {
        match index.get(file.run_id.as_str()) {
            Some(&slot) => runs[slot].1.push(file.clone()),
            None => {
                index.insert(file.run_id.as_str(), runs.len());
                runs.push((file.run_id.clone(), vec![file.clone()]));
            }
        }
    }

    let mut groups = Vec::with_capacity(runs.len());
    for (run_id, members) in runs {
        let count = members.len();
        let Ok([first, second]) = <[FieldmapFile; 2]>::try_from(members) else {
            return Err(PairingError::UnpairedFieldmap { run_id, count });
        };
        groups.push(FieldmapGroup::from_pair(run_id, first, second)?);
    }

    groups.sort_by_key(|group| group.order_key);
    log::debug!("Grouped {} fieldmap files into {} runs", fieldmap_files.len(), groups.len());
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intended_for_catalog::Polarity;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn fmap(name: &str, order_key: i64, run: &str, polarity: Polarity) -> FieldmapFile {
        FieldmapFile::new(format!("/fmap/{name}.nii.gz"), order_key, run, polarity)
    }

    #[test]
    fn groups_runs_and_orders_by_min_key() {
        let files = vec![
            fmap("r2_pa", 31, "2", Polarity::Positive),
            fmap("r1_pa", 11, "1", Polarity::Positive),
            fmap("r2_ap", 30, "2", Polarity::Negative),
            fmap("r1_ap", 10, "1", Polarity::Negative),
        ];

        let groups = group(&files).unwrap();
        let summary: Vec<(&str, i64)> = groups
            .iter()
            .map(|g| (g.run_id.as_str(), g.order_key))
            .collect();
        assert_eq!(summary, vec![("1", 10), ("2", 30)]);
        assert_eq!(groups[0].members[0], files[1]);
        assert_eq!(groups[0].members[1], files[3]);
    }

    #[test]
    fn equal_keys_keep_first_seen_run_order() {
        let files = vec![
            fmap("b_pa", 5, "b", Polarity::Positive),
            fmap("a_pa", 5, "a", Polarity::Positive),
            fmap("a_ap", 6, "a", Polarity::Negative),
            fmap("b_ap", 6, "b", Polarity::Negative),
        ];
        let runs: Vec<String> = group(&files)
            .unwrap()
            .into_iter()
            .map(|g| g.run_id)
            .collect();
        assert_eq!(runs, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn three_member_run_is_unpaired() {
        let files = vec![
            fmap("pa", 1, "1", Polarity::Positive),
            fmap("ap", 2, "1", Polarity::Negative),
            fmap("pa_again", 3, "1", Polarity::Positive),
        ];
        assert_eq!(
            group(&files),
            Err(PairingError::UnpairedFieldmap {
                run_id: "1".to_string(),
                count: 3
            })
        );
    }

    #[test]
    fn single_member_run_is_unpaired() {
        let files = vec![
            fmap("pa", 1, "1", Polarity::Positive),
            fmap("ap", 2, "1", Polarity::Negative),
            fmap("lonely", 3, "2", Polarity::Positive),
        ];
        let err = group(&files).unwrap_err();
        assert!(err.is_data_integrity());
        assert!(matches!(err, PairingError::UnpairedFieldmap { count: 1, .. }));
    }

    #[test]
    fn same_polarity_pair_is_rejected() {
        let files = vec![
            fmap("pa", 1, "1", Polarity::Positive),
            fmap("pa2", 2, "1", Polarity::Positive),
        ];
        assert!(matches!(
            group(&files),
            Err(PairingError::PolarityMismatch { .. })
        ));
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert_eq!(group(&[]), Ok(Vec::new()));
    }

    proptest! {
        #[test]
        fn proptest_groups_are_pairs_or_unpaired_error(
            runs in proptest::collection::vec((0u8..6, -50i64..50), 0..24)
        ) {
            // Alternate polarity per run so only cardinality can fail.
            let mut seen: HashMap<u8, usize> = HashMap::new();
            let files: Vec<FieldmapFile> = runs
                .iter()
                .enumerate()
                .map(|(i, (run, key))| {
                    let n = seen.entry(*run).or_insert(0);
                    let polarity = if *n % 2 == 0 { Polarity::Positive } else { Polarity::Negative };
                    *n += 1;
                    fmap(&format!("f{i}"), *key, &run.to_string(), polarity)
                })
                .collect();

            match group(&files) {
                Ok(groups) => {
                    prop_assert!(seen.values().all(|n| *n == 2));
                    prop_assert_eq!(groups.len(), seen.len());
                    for pair in groups.windows(2) {
                        prop_assert!(pair[0].order_key <= pair[1].order_key);
                    }
                    for g in &groups {
                        let min = g.members.iter().map(|m| m.order_key).min().unwrap();
                        prop_assert_eq!(g.order_key, min);
                    }
                }
                Err(PairingError::UnpairedFieldmap { count, .. }) => {
                    prop_assert!(count != 2);
                    prop_assert!(seen.values().any(|n| *n != 2));
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
