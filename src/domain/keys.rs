//! Metadata-store keys and object-store layout.

pub const PLAYLIST_FILE: &str = "playlist.m3u8";
pub const SEGMENT_EXTENSION: &str = "ts";

pub fn status_key(video_id: &str) -> String {
    format!("/processing-status/{}", video_id)
}

pub fn segment_key(segment_id: &str) -> String {
    format!("/segments/{}", segment_id)
}

/// `videos/{video_id}/{resolution}/segment_{seq:03}.ts`
pub fn segment_object_key(video_id: &str, resolution: &str, sequence: usize) -> String {
    format!(
        "videos/{}/{}/segment_{:03}.{}",
        video_id, resolution, sequence, SEGMENT_EXTENSION
    )
}

/// `videos/{video_id}/{resolution}/playlist.m3u8`
pub fn playlist_object_key(video_id: &str, resolution: &str) -> String {
    format!("videos/{}/{}/{}", video_id, resolution, PLAYLIST_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_keys() {
        assert_eq!(status_key("v1"), "/processing-status/v1");
        assert_eq!(segment_key("abc"), "/segments/abc");
    }

    #[test]
    fn test_object_layout() {
        assert_eq!(
            segment_object_key("v1", "720p", 7),
            "videos/v1/720p/segment_007.ts"
        );
        assert_eq!(
            segment_object_key("v1", "720p", 1234),
            "videos/v1/720p/segment_1234.ts"
        );
        assert_eq!(playlist_object_key("v1", "360p"), "videos/v1/360p/playlist.m3u8");
    }
}
