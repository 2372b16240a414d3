#![no_main]

use libfuzzer_sys::fuzz_target;
use multiplicity_estimator::{Sketch, SketchError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // first bytes pick the shape: w in [1, 16], l in [1, 2^w], m in [1, 256]
    let w = u64::from(data[0] % 16) + 1;
    let l = wyhash(data, 0) % (1 << w) + 1;
    let m = u64::from(data[1]) + 1;
    let mut sketch = Sketch::with_rng(l, m, w, StdRng::seed_from_u64(wyhash(data, 1))).unwrap();

    let keys = &data[2..];
    let mut previous_bits = 0;
    for chunk in keys.chunks(4) {
        sketch.count(chunk).unwrap();
        let bits = sketch.set_bits().count();
        assert!(bits >= previous_bits);
        previous_bits = bits;
    }

    for chunk in keys.chunks(4) {
        let prior = sketch.last_estimate();
        match sketch.estimate(chunk) {
            Ok(_) => {}
            Err(SketchError::UninitializedEstimate) | Err(SketchError::SaturatedBitmap) => {
                assert_eq!(sketch.last_estimate(), prior)
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let fill_rate = sketch.fill_rate();
    assert!((0.0..=1.0).contains(&fill_rate));
});
