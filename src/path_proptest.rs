//! Property-based tests for path helpers and git URL detection.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::error::{Error, Result};
    use crate::git::{GitClient, GitRepo};
    use crate::path::{join_relative, prefixed};
    use proptest::prelude::*;
    use std::ffi::OsString;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Remote that answers `ls-remote` for exactly one URL
    struct AcceptOnly(String);

    impl GitClient for AcceptOnly {
        fn exec(&self, args: &[&str]) -> Result<String> {
            match args {
                ["ls-remote", url] if *url == self.0 => Ok(String::new()),
                _ => Err(Error::GitCommand {
                    command: args.join(" "),
                    message: "exit status: 128".to_string(),
                    stdout: String::new(),
                    stderr: String::new(),
                }),
            }
        }
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9][a-z0-9._-]{0,8}"
    }

    fn segments(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(segment(), min..=max)
    }

    fn sub_path(parts: &[String]) -> String {
        parts.iter().map(|p| format!("/{}", p)).collect()
    }

    // ============================================================================
    // join_relative property tests
    // ============================================================================

    proptest! {
        /// Property: the result never leaves the base directory
        #[test]
        fn join_relative_stays_under_base(parts in segments(0, 5), rooted in any::<bool>()) {
            let base = Path::new("/cache/repos/tools");
            let sub = if rooted { sub_path(&parts) } else { parts.join("/") };
            let joined = join_relative(base, &sub);
            prop_assert!(joined.starts_with(base), "{:?} escaped {:?}", joined, base);
        }

        /// Property: a leading separator makes no difference
        #[test]
        fn join_relative_ignores_leading_separator(parts in segments(0, 5)) {
            let base = Path::new("/srv");
            let plain = parts.join("/");
            prop_assert_eq!(join_relative(base, &plain), join_relative(base, format!("/{}", plain)));
        }

        /// Property: every sub-path component is kept in order
        #[test]
        fn join_relative_keeps_components(parts in segments(1, 5)) {
            let joined = join_relative(Path::new("/base"), sub_path(&parts));
            let expected: PathBuf = std::iter::once("/base".to_string()).chain(parts).collect();
            prop_assert_eq!(joined, expected);
        }
    }

    // ============================================================================
    // prefixed property tests
    // ============================================================================

    proptest! {
        /// Property: prefixing is plain concatenation
        #[test]
        fn prefixed_is_concatenation(prefix in "[a-z/]{0,12}", path in "[a-z/.]{0,12}") {
            let result = prefixed(Path::new(&prefix), Path::new(&path));
            let mut expected = OsString::from(&prefix);
            expected.push(&path);
            prop_assert_eq!(result.into_os_string(), expected);
        }
    }

    // ============================================================================
    // Detection property tests
    // ============================================================================

    proptest! {
        /// Property: for protocol URLs, remote followed by path reproduces the URL
        #[test]
        fn detect_protocol_url_splits_losslessly(
            scheme in prop::sample::select(vec!["https", "http", "ssh", "git"]),
            host in segment(),
            repo in segments(1, 3),
            sub in segments(0, 3),
        ) {
            let remote = format!("{}://{}{}", scheme, host, sub_path(&repo));
            let url = format!("{}{}", remote, sub_path(&sub));
            let detected = GitRepo::detect(url.as_str(), Arc::new(AcceptOnly(remote.clone()))).unwrap();

            prop_assert_eq!(&detected.protocol, scheme);
            prop_assert_eq!(&detected.remote, &remote);
            prop_assert_eq!(&detected.path, &sub_path(&sub));
            prop_assert_eq!(format!("{}{}", detected.remote, detected.path), url);
        }

        /// Property: scp-like URLs are ssh and split after the colon
        #[test]
        fn detect_scp_url_splits_losslessly(
            user in "[a-z]{1,6}",
            host in segment(),
            repo in segments(1, 3),
            sub in segments(0, 3),
        ) {
            let remote = format!("{}@{}:{}", user, host, repo.join("/"));
            let url = format!("{}{}", remote, sub_path(&sub));
            let detected = GitRepo::detect(url.as_str(), Arc::new(AcceptOnly(remote.clone()))).unwrap();

            prop_assert_eq!(detected.protocol.as_str(), "ssh");
            prop_assert_eq!(&detected.repo_name, &repo.join("/"));
            prop_assert_eq!(format!("{}{}", detected.remote, detected.path), url);
        }

        /// Property: bare URLs gain the probed protocol prefix and nothing else
        #[test]
        fn detect_bare_url_adds_only_prefix(
            protocol in prop::sample::select(vec!["http", "https", "file"]),
            host in segment(),
            repo in segments(0, 2),
            sub in segments(0, 3),
        ) {
            let bare = format!("{}{}", host, sub_path(&repo));
            let remote = format!("{}://{}", protocol, bare);
            let url = format!("{}{}", bare, sub_path(&sub));
            let detected = GitRepo::detect(url.as_str(), Arc::new(AcceptOnly(remote.clone()))).unwrap();

            prop_assert_eq!(&detected.protocol, protocol);
            prop_assert_eq!(&detected.remote, &remote);
            prop_assert_eq!(format!("{}{}", detected.remote, detected.path), format!("{}://{}", protocol, url));
        }

        /// Property: a remote that never answers always yields InvalidGitUrl
        #[test]
        fn detect_unreachable_is_invalid_url(host in segment(), parts in segments(0, 3)) {
            let url = format!("{}{}", host, sub_path(&parts));
            let result = GitRepo::detect(url.as_str(), Arc::new(AcceptOnly(String::new())));
            let is_invalid_url = matches!(result, Err(Error::InvalidGitUrl { .. }));
            prop_assert!(is_invalid_url);
        }
    }
}
