//! Elementary streams of demuxed, still-encoded frames
//!
//! Frames are kept in decode (DTS) order. Buffered ranges, frame counts and
//! removal are always expressed in presentation (PTS) time.

use crate::geometry::Rational;
use parking_lot::Mutex;
use std::sync::Arc;

/// Largest gap, in seconds, between two frames that still counts as one
/// continuous buffered range
pub const MAX_GAP_SIZE: f64 = 0.15;

/// A contiguous span of buffered media, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BufferedRange {
    pub start: f64,
    pub end: f64,
}

impl BufferedRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` lies in `[start, end)`
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }
}

/// Intersect two sorted, non-overlapping range lists
///
/// The result contains the times buffered in both inputs. Used to combine
/// the audio and video buffers of one session.
pub fn intersect_ranges(a: &[BufferedRange], b: &[BufferedRange]) -> Vec<BufferedRange> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        if start < end {
            out.push(BufferedRange::new(start, end));
        }

        if a[i].end < b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }

    out
}

/// Stream-wide parameters shared by every frame of a stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Container MIME type, e.g. `video/mp4`
    pub mime: String,

    /// Codec string, e.g. `avc1.42E01E`
    pub codec: String,

    pub is_video: bool,

    /// Duration of one timestamp tick, in seconds
    pub time_scale: Rational<u32>,

    /// Pixel aspect ratio; zero means square pixels
    pub sample_aspect_ratio: Rational<u32>,

    /// Codec-specific setup data (e.g. the avcC box)
    pub extra_data: Vec<u8>,

    pub width: u32,
    pub height: u32,

    pub channel_count: u32,
    pub sample_rate: u32,
}

impl StreamInfo {
    pub fn video(mime: &str, codec: &str, width: u32, height: u32) -> Self {
        Self {
            mime: mime.to_string(),
            codec: codec.to_string(),
            is_video: true,
            time_scale: Rational::new(1, 90_000),
            sample_aspect_ratio: Rational::zero(),
            extra_data: Vec::new(),
            width,
            height,
            channel_count: 0,
            sample_rate: 0,
        }
    }

    pub fn audio(mime: &str, codec: &str, channel_count: u32, sample_rate: u32) -> Self {
        Self {
            mime: mime.to_string(),
            codec: codec.to_string(),
            is_video: false,
            time_scale: Rational::new(1, sample_rate.max(1)),
            sample_aspect_ratio: Rational::zero(),
            extra_data: Vec::new(),
            width: 0,
            height: 0,
            channel_count,
            sample_rate,
        }
    }

    pub fn with_sample_aspect_ratio(mut self, ratio: Rational<u32>) -> Self {
        self.sample_aspect_ratio = ratio;
        self
    }

    pub fn with_extra_data(mut self, extra_data: Vec<u8>) -> Self {
        self.extra_data = extra_data;
        self
    }

    /// Full MIME type with the codecs parameter
    pub fn full_mime(&self) -> String {
        format!("{}; codecs=\"{}\"", self.mime, self.codec)
    }
}

/// One encoded frame
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub stream_info: Arc<StreamInfo>,

    /// Presentation time, in seconds
    pub pts: f64,

    /// Decode time, in seconds
    pub dts: f64,

    pub duration: f64,
    pub is_key_frame: bool,
    pub data: Vec<u8>,

    /// Key the frame is encrypted with, if any
    pub key_id: Option<Vec<u8>>,
}

impl EncodedFrame {
    pub fn new(stream_info: Arc<StreamInfo>, pts: f64, dts: f64, duration: f64, is_key_frame: bool) -> Self {
        Self {
            stream_info,
            pts,
            dts,
            duration,
            is_key_frame,
            data: Vec::new(),
            key_id: None,
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn with_key_id(mut self, key_id: Vec<u8>) -> Self {
        self.key_id = Some(key_id);
        self
    }

    pub fn is_encrypted(&self) -> bool {
        self.key_id.is_some()
    }

    /// Presentation end time
    pub fn end(&self) -> f64 {
        self.pts + self.duration
    }

    /// Approximate memory held by this frame
    pub fn estimate_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.data.len()
            + self.key_id.as_ref().map_or(0, Vec::len)
    }
}

/// How [`ElementaryStream::get_frame`] picks a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLocation {
    /// The last key frame at or before the time
    KeyFrameBefore,
    /// The frame whose decode time is closest to the time
    Near,
    /// The first frame that starts after the time
    After,
}

/// An ordered, internally synchronized list of encoded frames
pub struct ElementaryStream {
    info: Arc<StreamInfo>,
    frames: Mutex<Vec<Arc<EncodedFrame>>>,
}

impl ElementaryStream {
    pub fn new(info: Arc<StreamInfo>) -> Self {
        Self {
            info,
            frames: Mutex::new(Vec::new()),
        }
    }

    pub fn info(&self) -> &Arc<StreamInfo> {
        &self.info
    }

    /// Insert a frame in decode order
    ///
    /// A frame with the same decode time as an existing one replaces it.
    pub fn add_frame(&self, frame: Arc<EncodedFrame>) {
        let mut frames = self.frames.lock();
        let index = frames.partition_point(|f| f.dts < frame.dts);

        match frames.get(index) {
            Some(existing) if existing.dts == frame.dts => frames[index] = frame,
            _ => frames.insert(index, frame),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    /// Buffered ranges in presentation time
    ///
    /// Gaps up to [`MAX_GAP_SIZE`] are bridged.
    pub fn buffered_ranges(&self) -> Vec<BufferedRange> {
        let mut spans: Vec<(f64, f64)> = self
            .frames
            .lock()
            .iter()
            .map(|f| (f.pts, f.end()))
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut ranges: Vec<BufferedRange> = Vec::new();
        for (start, end) in spans {
            match ranges.last_mut() {
                Some(last) if start <= last.end + MAX_GAP_SIZE => last.end = last.end.max(end),
                _ => ranges.push(BufferedRange::new(start, end)),
            }
        }

        ranges
    }

    /// Number of frames whose presentation time is strictly between the bounds
    pub fn count_frames_between(&self, start: f64, end: f64) -> usize {
        self.frames
            .lock()
            .iter()
            .filter(|f| f.pts > start && f.pts < end)
            .count()
    }

    /// Frames presented at any time in `[start, end)`, in presentation order
    pub fn frames_overlapping(&self, start: f64, end: f64) -> Vec<Arc<EncodedFrame>> {
        let mut out: Vec<_> = self
            .frames
            .lock()
            .iter()
            .filter(|f| f.pts < end && f.end() > start)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.pts.total_cmp(&b.pts));
        out
    }

    /// Find a frame by decode time
    pub fn get_frame(&self, time: f64, location: FrameLocation) -> Option<Arc<EncodedFrame>> {
        let frames = self.frames.lock();

        match location {
            FrameLocation::After => {
                let index = frames.partition_point(|f| f.dts <= time);
                frames.get(index).cloned()
            }
            FrameLocation::KeyFrameBefore => {
                let index = frames.partition_point(|f| f.dts <= time);
                frames[..index].iter().rev().find(|f| f.is_key_frame).cloned()
            }
            FrameLocation::Near => {
                let index = frames.partition_point(|f| f.dts < time);
                let after = frames.get(index);
                let before = index.checked_sub(1).and_then(|i| frames.get(i));

                match (before, after) {
                    (Some(b), Some(a)) if time - b.dts <= a.dts - time => Some(Arc::clone(b)),
                    (_, Some(a)) => Some(Arc::clone(a)),
                    (Some(b), None) => Some(Arc::clone(b)),
                    (None, None) => None,
                }
            }
        }
    }

    /// Remove frames presented in `[start, end)`
    ///
    /// Removal continues past `end` up to the next key frame, since the
    /// frames in between can no longer be decoded.
    pub fn remove(&self, start: f64, end: f64) {
        let mut frames = self.frames.lock();

        let stop = frames
            .iter()
            .filter(|f| f.is_key_frame && f.pts >= end)
            .map(|f| f.pts)
            .fold(f64::INFINITY, f64::min);

        frames.retain(|f| f.pts < start || f.pts >= stop);
    }

    pub fn clear(&self) {
        self.frames.lock().clear();
    }

    /// Approximate memory held by all frames
    pub fn estimate_size(&self) -> usize {
        self.frames.lock().iter().map(|f| f.estimate_size()).sum()
    }
}

impl std::fmt::Debug for ElementaryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementaryStream")
            .field("codec", &self.info.codec)
            .field("frames", &self.len())
            .finish()
    }
}
