//! Front-end to backend path rewriting
//!
//! APT asks for `dists/channels:/main/binary-<arch>/Packages` style paths.
//! The server publishes the same metadata under its GET-REQ handler, keyed
//! by the real base channel label.

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder channel APT uses in `sources.list`
pub const DEFAULT_CHANNEL_MARKER: &str = "dists/channels:/main/";

/// Front-end root prefix, anchored at the start of the path
pub const FRONTEND_ROOT: &str = "/dists/";

/// Backend API root replacing [`FRONTEND_ROOT`]
pub const BACKEND_ROOT: &str = "/XMLRPC/GET-REQ/dists/";

/// Segment that replaces the architecture-specific binary index directory
pub const INDEX_DATA_SEGMENT: &str = "/repodata/";

static BINARY_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/binary-[0-9A-Za-z_]*/").expect("static pattern"));

/// Rewrite an APT document path into the backend request path.
///
/// Three substitutions, each on its first occurrence only:
/// the default channel marker becomes the root channel, the `binary-<arch>`
/// segment becomes `repodata`, and the front-end root becomes the backend
/// API root. Only string substitution happens, nothing is validated.
///
/// A path with at most one `binary-<arch>` segment is left unchanged by a
/// second pass; each further segment is consumed by one more pass.
pub fn rewrite_document(path: &str, root_channel: &str) -> String {
    let channel_path = format!("dists/channels:/{}/", root_channel);
    let document = path.replacen(DEFAULT_CHANNEL_MARKER, &channel_path, 1);
    let document = BINARY_SEGMENT.replacen(&document, 1, INDEX_DATA_SEGMENT);

    match document.strip_prefix(FRONTEND_ROOT) {
        Some(rest) => format!("{}{}", BACKEND_ROOT, rest),
        None => document.into_owned(),
    }
}
