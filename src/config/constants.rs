// src/config/constants.rs
//! System-wide configuration constants

/// Signal acquisition constants
pub mod signal {
    /// The only sampling rate the bundled classifiers were trained at
    pub const SUPPORTED_SAMPLING_RATE_HZ: u32 = 250;
    /// Rate assumed when settings omit it
    pub const DEFAULT_SAMPLING_RATE_HZ: u32 = SUPPORTED_SAMPLING_RATE_HZ;
}

/// Signal cleaning constants
pub mod cleaning {
    /// Baseline wander cutoff
    pub const HIGHPASS_CUTOFF_HZ: f32 = 0.5;
    /// Butterworth order of the baseline filter
    pub const HIGHPASS_ORDER: usize = 5;
    /// Mains frequency smoothed out
    pub const POWERLINE_FREQ_HZ: f32 = 50.0;

    /// Below this rate the powerline smoother degrades to a 2-tap average
    pub const POWERLINE_MIN_SAMPLING_RATE_HZ: u32 = 100;

    /// Edge padding for zero-phase filtering, in seconds of signal
    pub const EDGE_PADDING_SECONDS: usize = 3;
}

/// Windowing constants
pub mod windowing {
    /// Zero resolves to the minimum one-second stride
    pub const DEFAULT_STRIDE_RATIO: f32 = 0.0;

    /// Windows and strides are never shorter than this many seconds
    pub const MIN_SPAN_SECONDS: usize = 1;
}

/// Quality grading constants
pub mod quality {
    /// Score forced onto near-flat windows
    pub const WORST_QUALITY_SCORE: f32 = 1.0;
    /// Lowest classifier score
    pub const MIN_SCORE: f32 = 0.0;
    /// Highest classifier score
    pub const MAX_SCORE: f32 = 1.0;

    /// Near-flat windows are forced to the worst score unless disabled
    pub const DEFAULT_CHECK_WINDOW_RANGE: bool = true;
    /// Peak-to-peak amplitude below which a window counts as flat
    pub const DEFAULT_WINDOW_MIN_RANGE_MV: f32 = 0.1;
}

/// Environment override constants
pub mod paths {
    /// Prefix of `[checker]` override variables
    pub const ENV_PREFIX: &str = "ECG_QUALITY_";
}
