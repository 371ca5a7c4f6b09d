//! Shard content generators and output readers

use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// One index action line plus one document line, as in a real content dump
pub fn document(title: &str) -> String {
    format!(
        "{{\"index\":{{\"_type\":\"page\",\"_id\":\"{title}\"}}}}\n{{\"title\":\"{title}\",\"text\":\"About {title}.\"}}\n"
    )
}

/// Compress `content` as a single bzip2 stream
pub fn bz2(content: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(content).expect("bzip2 encode");
    encoder.finish().expect("bzip2 finish")
}

/// Decompress a gzip file completely
pub fn gunzip(path: &Path) -> Vec<u8> {
    let mut out = Vec::new();
    MultiGzDecoder::new(File::open(path).expect("open gzip output"))
        .read_to_end(&mut out)
        .expect("gzip decode");
    out
}

/// Anchor list in the style of an Apache autoindex page
pub fn autoindex(entries: &[&str]) -> String {
    let rows: String = entries
        .iter()
        .map(|e| format!("<a href=\"{e}\">{e}</a>   01-Jan-2024 00:00    -\n"))
        .collect();
    format!(
        "<html><head><title>Index</title></head><body><h1>Index</h1><hr><pre>\
         <a href=\"../\">../</a>\n{rows}</pre><hr></body></html>"
    )
}
