//! HLS playlist rendering.
//!
//! Two fixed documents per mountpoint: a master playlist advertising the
//! single audio rendition, and a media playlist listing the last three
//! buffered segments.

use std::fmt::Write;

/// Bandwidth advertised for the single rendition. The upstream bitrate is
/// never probed, so the figure is a constant.
pub const BANDWIDTH: u32 = 52850;

/// Target duration advertised in the media playlist.
pub const TARGET_DURATION: u32 = 12;

/// Renders the master playlist for one mountpoint.
pub fn master_playlist() -> String {
    format!(
        "#EXTM3U\n\
         #EXT-X-VERSION:3\n\
         #EXT-X-STREAM-INF:PROGRAM-ID=1,BANDWIDTH={},CODECS=\"mp4a.40.2\"\n\
         chunklist.m3u8\n",
        BANDWIDTH
    )
}

/// Renders the media playlist from `(index, duration-nanos)` pairs, oldest
/// first. The caller only passes a non-empty window.
pub fn media_playlist(entries: &[(u64, u64)]) -> String {
    let mut body = String::new();
    body.push_str("#EXTM3U\n#EXT-X-VERSION:3\n");
    let _ = writeln!(body, "#EXT-X-TARGETDURATION:{}", TARGET_DURATION);
    let _ = writeln!(body, "#EXT-X-MEDIA-SEQUENCE:  {}", entries[0].0);

    for &(index, duration) in entries {
        let _ = writeln!(body, "#EXTINF:{:.2},", duration as f64 / 1e9);
        let _ = writeln!(body, "{}.ts", index);
    }

    body
}
