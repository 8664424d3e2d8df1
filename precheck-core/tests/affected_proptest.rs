use std::path::PathBuf;

use precheck_core::affected::partition;
use precheck_core::change::ChangeSet;
use precheck_core::package::Package;
use proptest::prelude::*;

fn gen_packages() -> impl Strategy<Value = Vec<Package>> {
    prop::collection::btree_set("(a|b|c)(/(a|b|c)){0,2}", 0..6).prop_map(|roots| {
        roots
            .into_iter()
            .enumerate()
            .map(|(i, rel)| Package::new(format!("pkg{}", i), PathBuf::from("/repo").join(rel), vec![]))
            .collect()
    })
}

fn gen_files() -> impl Strategy<Value = Vec<PathBuf>> {
    prop::collection::vec("(a|b|c|d)(/(a|b|c|d)){0,3}/f[0-9]\\.txt", 0..20)
        .prop_map(|files| files.into_iter().map(|f| PathBuf::from("/repo").join(f)).collect())
}

proptest! {
    #[test]
    fn test_every_file_lands_in_exactly_one_place(packages in gen_packages(), files in gen_files()) {
        let changes = ChangeSet::new(&files);
        let mapping = partition(&packages, &changes);

        let mapped: usize = mapping.affected.iter().map(|a| a.files.len()).sum();
        prop_assert_eq!(mapped + mapping.ignored.len(), changes.len());

        for file in changes.iter() {
            let owners = mapping
                .affected
                .iter()
                .filter(|a| a.files.contains(file))
                .count();
            let ignored = mapping.ignored.contains(file);
            prop_assert_eq!(owners + usize::from(ignored), 1);
        }
    }

    #[test]
    fn test_files_belong_to_deepest_containing_root(packages in gen_packages(), files in gen_files()) {
        let changes = ChangeSet::new(&files);
        let mapping = partition(&packages, &changes);

        for entry in &mapping.affected {
            prop_assert!(!entry.files.is_empty());
            for file in &entry.files {
                prop_assert!(entry.package.contains(file));
                let depth = entry.package.root.components().count();
                prop_assert!(packages
                    .iter()
                    .filter(|p| p.contains(file))
                    .all(|p| p.root.components().count() <= depth));
            }
        }
        for file in &mapping.ignored {
            prop_assert!(packages.iter().all(|p| !p.contains(file)));
        }
    }

    #[test]
    fn test_affected_keep_discovery_order(packages in gen_packages(), files in gen_files()) {
        let changes = ChangeSet::new(&files);
        let mapping = partition(&packages, &changes);

        let positions: Vec<usize> = mapping
            .affected
            .iter()
            .filter_map(|a| packages.iter().position(|p| p.root == a.package.root))
            .collect();
        prop_assert_eq!(positions.len(), mapping.affected.len());
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
