//! Client runtime bundled into the binary

use rust_embed::Embed;
use std::borrow::Cow;

#[derive(Embed)]
#[folder = "assets/"]
struct Bundled;

/// A bundled file resolved from a `/__preview/` path.
#[derive(Debug)]
pub struct RuntimeFile {
    pub content_type: String,
    pub body: Cow<'static, [u8]>,
}

/// Resolve `path` (relative to `/__preview/`) against the bundled files.
pub fn runtime_file(path: &str) -> Option<RuntimeFile> {
    let path = path.trim_start_matches('/');
    let file = Bundled::get(path)?;
    Some(RuntimeFile {
        content_type: mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
        body: file.data,
    })
}
