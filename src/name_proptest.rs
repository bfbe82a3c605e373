//! Property-based tests for repository name derivation.
//!
//! Derived names key both the fetch cache (`vt-<name>`) and the build output
//! (`<name>`), so they must be stable across URL spellings and never contain
//! path separators.

#[cfg(test)]
mod proptest_tests {
    use crate::config::{derive_name, is_local_path};
    use crate::sync::cache_entry_path;
    use proptest::prelude::*;
    use std::path::Path;

    proptest! {
        /// Property: a derived name never contains a separator
        #[test]
        fn derive_name_has_no_separators(url in ".*") {
            let name = derive_name(&url);
            for ch in ['/', '\\', ':'] {
                prop_assert!(
                    !name.contains(ch),
                    "derive_name produced '{}' containing '{}' from '{}'",
                    name,
                    ch,
                    url
                );
            }
        }

        /// Property: trailing separators never change the derived name
        #[test]
        fn derive_name_ignores_trailing_separators(url in "[a-z0-9/:._-]{0,30}", slashes in "[/]{1,3}") {
            prop_assert_eq!(derive_name(&url), derive_name(&format!("{}{}", url, slashes)));
        }

        /// Property: https, scp-style and local spellings agree
        #[test]
        fn derive_name_agrees_across_url_forms(name in "[a-z][a-z0-9_-]{0,20}") {
            let https = derive_name(&format!("https://github.com/org/vt-{}.git", name));
            let scp = derive_name(&format!("git@github.com:org/vt-{}.git", name));
            let local = derive_name(&format!("/srv/viztools/vt-{}", name));
            prop_assert_eq!(&https, &name);
            prop_assert_eq!(&scp, &name);
            prop_assert_eq!(&local, &name);
        }

        /// Property: the `vt-` prefix is optional
        #[test]
        fn derive_name_prefix_is_optional(name in "[a-uw-z][a-z0-9_]{0,20}") {
            prop_assert_eq!(
                derive_name(&format!("https://example.com/{}.git", name)),
                derive_name(&format!("https://example.com/vt-{}.git", name))
            );
        }

        /// Property: a cache entry path derives back to its repository name
        #[test]
        fn cache_entry_path_round_trips(name in "[a-z][a-z0-9_]{0,15}") {
            let entry = cache_entry_path(Path::new("fetch-vt"), &name);
            prop_assert_eq!(derive_name(&entry.to_string_lossy()), name);
        }

        /// Property: absolute paths are local sources, remote URLs are not
        #[test]
        fn local_path_detection(rest in "[a-z0-9/_-]{0,30}") {
            let local = format!("/{}", rest);
            prop_assert!(is_local_path(&local));
            let remote = format!("https://example.com/{}", rest);
            prop_assert!(!is_local_path(&remote));
        }
    }
}
