/// Wire byte a centered stick encodes to
pub const NEUTRAL_AXIS_BYTE: u8 = 128;

/// Maps a normalized axis value (-1.0..=1.0) onto the wire byte range using
/// `round((axis + 1.0) * 127.5)`, clamped to 0..=255. NaN encodes as neutral.
///
/// # Examples
/// ```
/// # use minibot_shared::encode_axis;
/// assert_eq!(encode_axis(-1.0), 0);
/// assert_eq!(encode_axis(0.0), 128);
/// assert_eq!(encode_axis(1.0), 255);
/// assert_eq!(encode_axis(7.5), 255);
/// ```
pub fn encode_axis(value: f32) -> u8 {
    if value.is_nan() {
        return NEUTRAL_AXIS_BYTE;
    }
    let scaled = ((value + 1.0) * 127.5).round();
    scaled.clamp(0.0, 255.0) as u8
}

/// Maps a wire byte back into -1.0..=1.0
///
/// # Examples
/// ```
/// # use minibot_shared::decode_axis;
/// assert_eq!(decode_axis(0), -1.0);
/// assert_eq!(decode_axis(255), 1.0);
/// assert!(decode_axis(128).abs() < 0.01);
/// ```
pub fn decode_axis(byte: u8) -> f32 {
    (f32::from(byte) / 127.5 - 1.0).clamp(-1.0, 1.0)
}
