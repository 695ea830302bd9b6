//! WebVTT cues carried by text tracks
//!
//! A cue is internally synchronized so the text pipeline can edit it while
//! a renderer reads it.

use parking_lot::Mutex;

/// Writing direction of the cue text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DirectionSetting {
    #[default]
    Horizontal,
    LeftToRight,
    RightToLeft,
}

/// Alignment of the cue box relative to its line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineAlignSetting {
    #[default]
    Start,
    Center,
    End,
}

/// What the cue position anchors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionAlignSetting {
    LineLeft,
    Center,
    LineRight,
    #[default]
    Auto,
}

/// Alignment of text inside the cue box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlignSetting {
    Start,
    #[default]
    Center,
    End,
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct CueData {
    id: String,
    text: String,
    start_time: f64,
    end_time: f64,
    pause_on_exit: bool,
    vertical: DirectionSetting,
    snap_to_lines: bool,
    line_align: LineAlignSetting,
    line: f64,
    position: f64,
    position_align: PositionAlignSetting,
    size: f64,
    align: AlignSetting,
}

/// A timed text cue
#[derive(Debug)]
pub struct VttCue {
    data: Mutex<CueData>,
}

macro_rules! cue_field {
    ($get:ident, $set:ident, $t:ty) => {
        pub fn $get(&self) -> $t {
            self.data.lock().$get
        }

        pub fn $set(&self, value: $t) {
            self.data.lock().$get = value;
        }
    };
}

impl VttCue {
    /// Create a cue with WebVTT default settings
    pub fn new(start_time: f64, end_time: f64, text: &str) -> Self {
        Self {
            data: Mutex::new(CueData {
                id: String::new(),
                text: text.to_string(),
                start_time,
                end_time,
                pause_on_exit: false,
                vertical: DirectionSetting::Horizontal,
                snap_to_lines: true,
                line_align: LineAlignSetting::Start,
                line: f64::NAN,
                position: f64::NAN,
                position_align: PositionAlignSetting::Auto,
                size: 100.0,
                align: AlignSetting::Center,
            }),
        }
    }

    pub fn id(&self) -> String {
        self.data.lock().id.clone()
    }

    pub fn set_id(&self, id: &str) {
        self.data.lock().id = id.to_string();
    }

    pub fn text(&self) -> String {
        self.data.lock().text.clone()
    }

    pub fn set_text(&self, text: &str) {
        self.data.lock().text = text.to_string();
    }

    cue_field!(start_time, set_start_time, f64);
    cue_field!(end_time, set_end_time, f64);
    cue_field!(pause_on_exit, set_pause_on_exit, bool);
    cue_field!(vertical, set_vertical, DirectionSetting);
    cue_field!(snap_to_lines, set_snap_to_lines, bool);
    cue_field!(line_align, set_line_align, LineAlignSetting);
    // NaN means "auto" for line and position.
    cue_field!(line, set_line, f64);
    cue_field!(position, set_position, f64);
    cue_field!(position_align, set_position_align, PositionAlignSetting);
    cue_field!(size, set_size, f64);
    cue_field!(align, set_align, AlignSetting);

    /// Whether the cue should be displayed at `time`
    pub fn is_active_at(&self, time: f64) -> bool {
        let data = self.data.lock();
        data.start_time <= time && time < data.end_time
    }
}

impl Clone for VttCue {
    fn clone(&self) -> Self {
        Self {
            data: Mutex::new(self.data.lock().clone()),
        }
    }
}
