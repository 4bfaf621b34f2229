#![allow(clippy::doc_markdown)] // Generated file contains OPT_LEVEL without backticks

use std::sync::LazyLock;

include!(concat!(env!("OUT_DIR"), "/built.rs"));

/// Version string: the package version, then the git commit and a `-dirty`
/// marker when the build had git information available.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    let mut version = match GIT_COMMIT_HASH_SHORT {
        Some(hash) => format!("{PKG_VERSION}-{hash}"),
        None => PKG_VERSION.to_string(),
    };
    if GIT_DIRTY == Some(true) {
        version.push_str("-dirty");
    }
    version
});
