//! Property-based tests for delegation policy
//!
//! Uses proptest to check which scope answers a request across arbitrary
//! name and prefix combinations.

use proptest::prelude::*;
use std::path::{Path, PathBuf};

use unit_loader::{
    ArchiveSourceResolver, BootstrapLoader, ContainerError, ResourcePath, UnitLoader, UnitName,
    UnitOrigin,
};

mod common;
use common::*;

/// Units present in the child archive
const CHILD_UNITS: &[&str] = &["app.Main", "app.util.Strings", "core.Object", "lib.Json"];

/// Units served by the parent
const PARENT_UNITS: &[&str] = &["app.Main", "core.Object", "core.List", "lib.Json", "sys.Io"];

const PREFIXES: &[&str] = &["app.", "app.util.", "core.", "lib.", "sys."];

fn all_names() -> Vec<&'static str> {
    let mut names: Vec<&str> = CHILD_UNITS.iter().chain(PARENT_UNITS).copied().collect();
    names.push("none.Missing");
    names.sort_unstable();
    names.dedup();
    names
}

fn parent() -> BootstrapLoader {
    PARENT_UNITS.iter().fold(BootstrapLoader::new(), |loader, name| {
        loader.with_unit(UnitName::new(*name).unwrap(), b"parent".to_vec())
    })
}

/// Property: a name is answered by the child exactly when it is not
/// parent-first and the child archive holds it
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_delegation_picks_expected_scope(
        name in prop::sample::select(all_names()),
        prefixes in prop::sample::subsequence(PREFIXES.to_vec(), 0..=PREFIXES.len()),
    ) {
        let fixture = ArchiveFixture::new();
        let files: Vec<(String, &[u8])> = CHILD_UNITS
            .iter()
            .map(|n| (format!("{}.class", n.replace('.', "/")), b"child".as_slice()))
            .collect();
        let files: Vec<(&str, &[u8])> = files.iter().map(|(n, b)| (n.as_str(), *b)).collect();
        let lib = fixture.archive("lib.tar", &files);

        let loader = fixture.loader(&[lib], parent(), &prefixes).unwrap();
        let result = loader.load(name);

        let parent_first = prefixes.iter().any(|p| name.starts_with(*p));
        let in_child = CHILD_UNITS.contains(&name);
        let in_parent = PARENT_UNITS.contains(&name);

        if !parent_first && in_child {
            let unit = result.unwrap();
            prop_assert_eq!(&unit.bytes, b"child");
            prop_assert!(matches!(unit.origin, UnitOrigin::Archive(_)));
            prop_assert!(loader.find_loaded_unit(&UnitName::new(name).unwrap()).is_some());
        } else if in_parent {
            let unit = result.unwrap();
            prop_assert_eq!(&unit.bytes, b"parent");
            prop_assert!(loader.loaded_units().is_empty());
        } else {
            prop_assert!(result.unwrap_err().is_not_found());
            prop_assert!(loader.loaded_units().is_empty());
        }
    }
}

/// Property: all-resource lookups list every child match before every parent match
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_resource_matches_child_then_parent(
        child_has in prop::collection::vec(any::<bool>(), 1..5),
        parent_copies in 0usize..3,
    ) {
        let fixture = ArchiveFixture::new();
        let archives: Vec<String> = child_has
            .iter()
            .enumerate()
            .map(|(i, has)| {
                let name = format!("lib{}.tar", i);
                if *has {
                    fixture.archive(&name, &[("conf/r.txt", b"child")])
                } else {
                    fixture.archive(&name, &[("conf/other.txt", b"other")])
                }
            })
            .collect();
        let parent = (0..parent_copies).fold(BootstrapLoader::new(), |loader, _| {
            loader.with_resource("conf/r.txt", b"parent".to_vec())
        });

        let loader = fixture.loader(&archives, parent, &[]).unwrap();
        let matches = loader.find_all_resources(&ResourcePath::new("conf/r.txt")).unwrap();

        let child_count = child_has.iter().filter(|h| **h).count();
        prop_assert_eq!(matches.len(), child_count + parent_copies);
        for (i, locator) in matches.iter().enumerate() {
            prop_assert_eq!(locator.archive().is_some(), i < child_count);
        }

        let first = loader.find_resource(&ResourcePath::new("conf/r.txt")).unwrap();
        prop_assert_eq!(first.as_ref(), matches.first());
    }
}

/// Property: parsing keeps every non-empty segment, in order
proptest! {
    #[test]
    fn prop_parse_preserves_order(
        segments in prop::collection::vec("[a-z]{1,8}\\.(tar|pkg)", 0..8),
    ) {
        let containers = |p: &Path| -> Result<PathBuf, ContainerError> { Ok(p.to_path_buf()) };
        let resolver = ArchiveSourceResolver::new(':', vec!["tar".to_string()], &containers);

        let paths = resolver.parse(&segments.join(":")).unwrap();
        let raws: Vec<&str> = paths.iter().map(|p| p.raw()).collect();
        prop_assert_eq!(raws, segments.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    }
}
