//! Sample road images bundled with the client UI.

use serde::Serialize;

/// A bundled image the user can submit instead of uploading one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleImage {
    pub id: u32,
    /// Path relative to the static root.
    pub src: &'static str,
    pub label: &'static str,
}

pub const SAMPLE_IMAGES: &[SampleImage] = &[
    SampleImage {
        id: 1,
        src: "/samples/sample1.png",
        label: "Large pothole",
    },
    SampleImage {
        id: 2,
        src: "/samples/sample2.png",
        label: "Multiple potholes",
    },
    SampleImage {
        id: 3,
        src: "/samples/sample3.png",
        label: "Wet road pothole",
    },
    SampleImage {
        id: 4,
        src: "/samples/sample4.png",
        label: "Severe damage",
    },
];
