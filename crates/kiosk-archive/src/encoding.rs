//! Entry-name repair for archives produced with legacy code pages.
//!
//! Archivers on Chinese-locale Windows store names as GBK without setting the
//! UTF-8 flag. Names are repaired before they are compared or written, and the
//! same input always yields the same output so the resolver and the expander
//! agree on every path.

use std::borrow::Cow;

use encoding_rs::GBK;

/// Path fragments produced by operating-system bookkeeping rather than users.
const NOISE_MARKERS: [&str; 2] = ["__MACOSX", ".DS_Store"];

/// Returns a UTF-8 version of a raw entry name.
///
/// Valid UTF-8 is returned unchanged. Otherwise, if every non-ASCII byte forms
/// a well-formed GBK lead/trail pair, the name is decoded as GBK. Anything else
/// is converted lossily; this never fails.
pub fn repair_name(raw: &[u8]) -> String {
    if let Ok(name) = std::str::from_utf8(raw) {
        return name.to_owned();
    }

    if looks_like_gbk(raw)
        && let Some(decoded) = GBK.decode_without_bom_handling_and_without_replacement(raw)
    {
        return decoded.into_owned();
    }

    match String::from_utf8_lossy(raw) {
        Cow::Borrowed(name) => name.to_owned(),
        Cow::Owned(name) => name,
    }
}

/// Returns `true` if the (repaired) path belongs to platform metadata.
pub fn is_noise(name: &str) -> bool {
    NOISE_MARKERS.iter().any(|marker| name.contains(marker))
}

fn looks_like_gbk(raw: &[u8]) -> bool {
    let mut i = 0;
    while i < raw.len() {
        let lead = raw[i];
        if lead.is_ascii() {
            i += 1;
            continue;
        }

        let Some(&trail) = raw.get(i + 1) else {
            return false;
        };

        if !(0x81..=0xFE).contains(&lead) || !(0x40..=0xFE).contains(&trail) || trail == 0xF7 {
            return false;
        }

        i += 2;
    }

    true
}
