//! Forward discrete Fourier transform over a ±1-mapped bitstream.
//!
//! The historical real-to-half-complex transform read one element past the
//! end of its working array for the unused Nyquist magnitude; this module
//! computes the spectrum with a complex FFT instead, so that quirk has no
//! counterpart and the indexing is corrected. Only the first n/2 magnitudes
//! (DC included, Nyquist excluded) are handed out, which is exactly the set
//! the spectral test consumes, so the emitted numbers are unchanged.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::sync::{LazyLock, Mutex};

// Use a global planner to allow for caching if the test is run multiple times.
static FFT_PLANNER: LazyLock<Mutex<FftPlanner<f64>>> =
    LazyLock::new(|| Mutex::new(FftPlanner::new()));

/// Map each bit to ±1 (1 -> +1.0, 0 -> -1.0), run the forward transform and
/// return the magnitudes of the first n/2 frequency components.
pub fn half_spectrum_magnitudes(bits: &[u8]) -> Vec<f64> {
    let mut x = bits
        .iter()
        .map(|&bit| Complex::from(if bit == 1 { 1.0 } else { -1.0 }))
        .collect::<Vec<Complex<f64>>>();

    // The scope keeps the planner lock as short as possible; panics from
    // other threads propagate here through the poisoned lock.
    let fft = {
        let mut planner = FFT_PLANNER.lock().unwrap();
        planner.plan_fft_forward(x.len())
    };
    fft.process(&mut x);

    x[..x.len() / 2].iter().map(|s| s.norm()).collect()
}
