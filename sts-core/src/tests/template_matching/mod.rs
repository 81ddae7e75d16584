//! Everything shared between the [non-overlapping](non_overlapping) and
//! [overlapping](overlapping) template matching tests: the aperiodic
//! template library and the window match counting.
//!
//! A template is aperiodic (unbordered) when no proper prefix equals the
//! same-length suffix, i.e. the pattern cannot overlap a shifted copy of
//! itself. The library for a given length is derived here instead of being
//! shipped as data files; the enumeration order is ascending, matching the
//! published NIST library (148 templates at length 9).

pub mod non_overlapping;
pub mod overlapping;

/// The template length recommended by NIST.
pub const DEFAULT_TEMPLATE_LENGTH: usize = 9;

/// The template length bounds shared by both tests.
pub const TEMPLATE_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 2..=21;

/// Enumerate all aperiodic templates of the given bit length, in ascending
/// numeric order, each as a 0/1 byte buffer.
pub(crate) fn aperiodic_templates(length: usize) -> Vec<Vec<u8>> {
    (0_u64..(1_u64 << length))
        .filter_map(|candidate| {
            let bits = (0..length)
                .rev()
                .map(|shift| ((candidate >> shift) & 1) as u8)
                .collect::<Vec<_>>();
            is_aperiodic(&bits).then_some(bits)
        })
        .collect()
}

/// Whether the pattern has no border: no proper prefix equals the
/// same-length suffix.
fn is_aperiodic(bits: &[u8]) -> bool {
    (1..bits.len()).all(|shift| bits[..bits.len() - shift] != bits[shift..])
}

/// Count the occurrences of the template within the window. After a match
/// the scan advances by the template length when `non_overlapping` is set,
/// by one bit otherwise.
pub(crate) fn count_matches(window: &[u8], template: &[u8], non_overlapping: bool) -> usize {
    let mut count = 0_usize;
    let mut position = 0_usize;

    while position + template.len() <= window.len() {
        if &window[position..position + template.len()] == template {
            count += 1;
            position += if non_overlapping { template.len() } else { 1 };
        } else {
            position += 1;
        }
    }

    count
}

/// Render a template as a '0'/'1' string, e.g. for configuration attributes.
pub(crate) fn template_text(bits: &[u8]) -> String {
    bits.iter()
        .map(|&bit| if bit == 1 { '1' } else { '0' })
        .collect()
}
