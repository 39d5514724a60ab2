//! Canonical wire encoding for assets.
//!
//! Every implementation of the registry that writes this encoding must agree
//! bit-for-bit on what it wrote, so the wire form is pinned down completely:
//!
//! - compact JSON object, no insignificant whitespace
//! - exactly three members, in ascending (alphabetical) name order:
//!   `photoHash`, `photoID`, `userName`
//!   (older writers that emit the members in another order still decode)
//! - `<`, `>`, `&`, U+2028 and U+2029 inside strings are written as `\u` escapes
//!
//! ```
//! use areg_types::{codec, Asset};
//!
//! let bytes = codec::encode(&Asset::new("1", "Alice", "hashvalue1")).unwrap();
//! assert_eq!(bytes, br#"{"photoHash":"hashvalue1","photoID":"1","userName":"Alice"}"#);
//! ```

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;

use crate::asset::Asset;
use crate::error::{CodecError, CodecResult};

/// Member names of the wire object, in the order they are written.
pub const WIRE_FIELDS: [&str; 3] = ["photoHash", "photoID", "userName"];

/// Borrowed wire view used for encoding.
///
/// Member order here is the wire order. Keep it sorted by wire name.
#[derive(Serialize)]
struct WireAssetRef<'a> {
    #[serde(rename = "photoHash")]
    content_hash: &'a str,
    #[serde(rename = "photoID")]
    id: &'a str,
    #[serde(rename = "userName")]
    owner: &'a str,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WireAsset {
    #[serde(rename = "photoHash")]
    content_hash: String,
    #[serde(rename = "photoID")]
    id: String,
    #[serde(rename = "userName")]
    owner: String,
}

impl From<WireAsset> for Asset {
    fn from(wire: WireAsset) -> Self {
        Asset {
            id: wire.id,
            owner: wire.owner,
            content_hash: wire.content_hash,
        }
    }
}

/// Compact JSON formatter with HTML-safe string escaping.
///
/// serde_json already escapes quotes, backslashes and control characters;
/// this also escapes the HTML-sensitive characters, so string contents are
/// written the way Go's `encoding/json` writes them.
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..idx].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Encode an asset into its canonical wire bytes.
pub fn encode(asset: &Asset) -> CodecResult<Vec<u8>> {
    let wire = WireAssetRef {
        content_hash: &asset.content_hash,
        id: &asset.id,
        owner: &asset.owner,
    };
    let capacity = 48 + asset.id.len() + asset.owner.len() + asset.content_hash.len();
    let mut out = Vec::with_capacity(capacity);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter);
    wire.serialize(&mut ser)
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decode wire bytes into an asset.
///
/// Decoding is strict: all three members must be present, unknown or
/// duplicated members are rejected, and anything after the object other than
/// whitespace is an error.
pub fn decode(bytes: &[u8]) -> CodecResult<Asset> {
    let wire: WireAsset =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
    Ok(wire.into())
}
