//! Atlas cache metadata.
//!
//! Plain text, one `key=value` record per line, in this order:
//!
//! ```text
//! atlasSize=<side>
//! padding=<p>
//! paths=<p1;p2;...>
//! meta=<path>,<hash>,<mtime>          (one per asset, blank included)
//! region=<path>,<minU>,<minV>,<maxU>,<maxV>,<x>,<y>,<w>,<h>
//! ```
//!
//! Floats use the shortest representation that parses back to the same
//! value, so a written file reads back exactly.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::str::FromStr;

use crate::command::UvRect;

use super::{AssetFingerprint, AtlasRegion};

/// Why a metadata file could not be read. Always handled as a cache miss.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CacheError {
    #[error("line {line}: expected `{key}=`")]
    MissingKey { line: usize, key: &'static str },

    #[error("line {line}: malformed record `{text}`")]
    Malformed { line: usize, text: String },

    #[error("line {line}: bad number `{text}`")]
    BadNumber { line: usize, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AtlasMeta {
    pub side: u32,
    pub padding: u32,
    /// Requested paths plus the blank path.
    pub paths: BTreeSet<String>,
    pub assets: BTreeMap<String, AssetFingerprint>,
    pub regions: BTreeMap<String, AtlasRegion>,
}

impl AtlasMeta {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "atlasSize={}", self.side);
        let _ = writeln!(out, "padding={}", self.padding);

        let paths: Vec<&str> = self.paths.iter().map(String::as_str).collect();
        let _ = writeln!(out, "paths={}", paths.join(";"));

        for (path, fp) in &self.assets {
            let _ = writeln!(out, "meta={path},{},{}", fp.hash, fp.modified);
        }
        for (path, r) in &self.regions {
            let _ = writeln!(
                out,
                "region={path},{},{},{},{},{},{},{},{}",
                r.uv.min_u, r.uv.min_v, r.uv.max_u, r.uv.max_v, r.x, r.y, r.width, r.height
            );
        }
        out
    }

    pub fn parse(text: &str) -> Result<Self, CacheError> {
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

        let side = header(lines.next(), "atlasSize", 1)
            .and_then(|(line, v)| number(line, v))?;
        let padding = header(lines.next(), "padding", 2)
            .and_then(|(line, v)| number(line, v))?;
        let (_, paths) = header(lines.next(), "paths", 3)?;
        let paths = paths.split(';').map(str::to_string).collect();

        let mut assets = BTreeMap::new();
        let mut regions = BTreeMap::new();

        for (line, text) in lines {
            if text.is_empty() {
                continue;
            }
            let malformed = || CacheError::Malformed { line, text: text.to_string() };

            if let Some(rest) = text.strip_prefix("meta=") {
                let f: Vec<&str> = rest.split(',').collect();
                let [path, hash, modified] = f[..] else {
                    return Err(malformed());
                };
                let fp = AssetFingerprint {
                    hash: hash.to_string(),
                    modified: number(line, modified)?,
                };
                assets.insert(path.to_string(), fp);
            } else if let Some(rest) = text.strip_prefix("region=") {
                let f: Vec<&str> = rest.split(',').collect();
                let [path, u0, v0, u1, v1, x, y, w, h] = f[..] else {
                    return Err(malformed());
                };
                let region = AtlasRegion {
                    uv: UvRect::new(
                        number(line, u0)?,
                        number(line, v0)?,
                        number(line, u1)?,
                        number(line, v1)?,
                    ),
                    x: number(line, x)?,
                    y: number(line, y)?,
                    width: number(line, w)?,
                    height: number(line, h)?,
                };
                regions.insert(path.to_string(), region);
            } else {
                return Err(malformed());
            }
        }

        Ok(Self { side, padding, paths, assets, regions })
    }
}

fn header<'a>(
    next: Option<(usize, &'a str)>,
    key: &'static str,
    expected_line: usize,
) -> Result<(usize, &'a str), CacheError> {
    let (line, text) = next.ok_or(CacheError::MissingKey { line: expected_line, key })?;
    match text.split_once('=') {
        Some((k, v)) if k == key => Ok((line, v)),
        _ => Err(CacheError::MissingKey { line, key }),
    }
}

fn number<T: FromStr>(line: usize, text: &str) -> Result<T, CacheError> {
    text.parse()
        .map_err(|_| CacheError::BadNumber { line, text: text.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::BLANK_PATH;

    fn sample() -> AtlasMeta {
        let mut regions = BTreeMap::new();
        regions.insert(BLANK_PATH.to_string(), AtlasRegion::from_pixels(40, 0, 1, 1, 64));
        regions.insert("ui/a.png".to_string(), AtlasRegion::from_pixels(0, 0, 30, 20, 64));
        // Thirds do not have short decimal forms.
        regions.insert("b.png".to_string(), AtlasRegion::from_pixels(1, 2, 10, 10, 3 * 64));

        let mut assets = BTreeMap::new();
        assets.insert(BLANK_PATH.to_string(), AssetFingerprint::blank());
        assets.insert("ui/a.png".to_string(), AssetFingerprint { hash: "ab12".into(), modified: 1_700_000_000_123 });
        assets.insert("b.png".to_string(), AssetFingerprint { hash: "cd34".into(), modified: 7 });

        AtlasMeta {
            side: 64,
            padding: 2,
            paths: regions.keys().cloned().collect(),
            assets,
            regions,
        }
    }

    #[test]
    fn text_round_trips_exactly() {
        let meta = sample();
        let text = meta.to_text();
        assert_eq!(AtlasMeta::parse(&text).unwrap(), meta);
    }

    #[test]
    fn blank_path_is_written_as_empty_entries() {
        let text = sample().to_text();
        assert!(text.contains("paths=;b.png;ui/a.png\n"));
        assert!(text.contains("\nmeta=,blank,0\n"));
        assert!(text.contains("\nregion=,0.625,0,0.640625,0.015625,40,0,1,1\n"));
    }

    #[test]
    fn header_order_is_enforced() {
        let err = AtlasMeta::parse("padding=2\natlasSize=64\npaths=\n").unwrap_err();
        assert_eq!(err, CacheError::MissingKey { line: 1, key: "atlasSize" });
        assert!(matches!(AtlasMeta::parse(""), Err(CacheError::MissingKey { line: 1, .. })));
    }

    #[test]
    fn corrupt_records_are_rejected() {
        let bad_number = "atlasSize=64\npadding=2\npaths=\nregion=,x,0,1,1,0,0,1,1\n";
        assert!(matches!(AtlasMeta::parse(bad_number), Err(CacheError::BadNumber { line: 4, .. })));

        let short = "atlasSize=64\npadding=2\npaths=\nmeta=a.png,hash\n";
        assert!(matches!(AtlasMeta::parse(short), Err(CacheError::Malformed { line: 4, .. })));

        let junk = "atlasSize=64\npadding=2\npaths=\ngarbage\n";
        assert!(matches!(AtlasMeta::parse(junk), Err(CacheError::Malformed { .. })));
    }
}
