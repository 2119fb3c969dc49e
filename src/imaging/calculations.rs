//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Largest size with the source aspect ratio that fits inside `bound`.
///
/// Never upscales: a source already inside the box keeps its size. Neither
/// side drops below 1 px, however extreme the aspect ratio.
///
/// # Examples
/// ```
/// # use inkwell::imaging::fit_within;
/// // 1000x500 landscape into 140x140 → 140x70
/// assert_eq!(fit_within((1000, 500), (140, 140)), (140, 70));
///
/// // Small images are left alone
/// assert_eq!(fit_within((100, 50), (140, 140)), (100, 50));
/// ```
pub fn fit_within(source: (u32, u32), bound: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bound;

    if src_w == 0 || src_h == 0 || (src_w <= max_w && src_h <= max_h) {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}
