use multiplicity_estimator::{Sketch, SketchError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use test_case::test_case;

fn sketch(l: u64, m: u64, w: u64, seed: u64) -> Sketch {
    Sketch::with_rng(l, m, w, StdRng::seed_from_u64(seed)).unwrap()
}

/// Mean relative error of a key counted `n` times on fresh sketches, small regime only
fn small_regime_error(l: u64, m: u64, n: usize, trials: u64) -> f64 {
    let total: f64 = (0..trials)
        .map(|seed| {
            let mut s = sketch(l, m, 32, seed);
            for _ in 0..n {
                s.count("flow-1").unwrap();
            }
            let estimate = s.estimate("flow-1").unwrap() as f64;
            (estimate - n as f64).abs() / n as f64
        })
        .sum();
    total / trials as f64
}

#[test_case(256, 50; "m256 n50")]
#[test_case(256, 100; "m256 n100")]
#[test_case(64, 60; "m64 n60")]
fn test_small_multiplicity_accuracy(m: u64, n: usize) {
    let err = small_regime_error(1 << 22, m, n, 32);
    assert!(err <= 0.2, "mean relative error {err:.4}");
}

#[test]
fn test_large_multiplicity_scenario() {
    let n = 1000;
    let trials = 8;
    let mut ratios = Vec::new();
    for seed in 0..trials {
        let mut s = sketch(80_000_000, 64, 32, seed);
        for _ in 0..n {
            s.count("flow-1").unwrap();
        }

        // Nothing has been estimated yet, so the large regime has no prior
        assert_eq!(s.estimate("flow-1"), Err(SketchError::UninitializedEstimate));

        // Any small regime estimate seeds the prior
        assert!(s.estimate("flow-unseen").unwrap() <= 5);
        assert!(s.last_estimate() > 0);

        // The prior is refined by each call and settles within a few calls
        let mut estimate = 0;
        for _ in 0..4 {
            estimate = s.estimate("flow-1").unwrap();
        }
        assert!(s.estimate("flow-1").unwrap().abs_diff(estimate) <= 2);
        ratios.push(estimate as f64 / n as f64);
    }

    // The run length statistic counts one column less than the first unset column
    // while phi assumes a model where column 0 is always set, so the large regime
    // settles at about a quarter of the true multiplicity.
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    assert!((0.18..=0.35).contains(&mean), "mean ratio {mean:.4}, {ratios:?}");
}

#[test]
fn test_large_multiplicity_is_proportional() {
    let mut s = sketch(80_000_000, 64, 32, 7);
    for _ in 0..1000 {
        s.count("flow-a").unwrap();
    }
    for _ in 0..8000 {
        s.count("flow-b").unwrap();
    }
    s.estimate("flow-unseen").unwrap();

    let settle = |s: &mut Sketch, key: &str| {
        let mut estimate = 0;
        for _ in 0..5 {
            estimate = s.estimate(key).unwrap();
        }
        estimate as f64
    };
    let a = settle(&mut s, "flow-a");
    let b = settle(&mut s, "flow-b");
    let ratio = b / a;
    assert!((4.0..=16.0).contains(&ratio), "a = {a}, b = {b}");
}

#[test]
fn test_never_inserted_key() {
    let mut s = sketch(1 << 20, 64, 32, 1);
    assert_eq!(s.estimate("missing").unwrap(), 0);

    for i in 0..1000 {
        s.count(&format!("flow-{i}")).unwrap();
    }
    let p = s.fill_rate();
    assert!(p > 0.0 && p < 0.001, "fill rate {p}");

    // Only overlap with other keys' bits contributes
    for i in 0..20 {
        let estimate = s.estimate(&format!("missing-{i}")).unwrap();
        assert!(estimate <= 10, "missing-{i}: {estimate}");
    }
}

#[test]
fn test_many_keys_share_bitmap() {
    let mut s = sketch(1 << 24, 128, 32, 3);
    let counts = [2usize, 20, 80, 200];
    for (key, &n) in counts.iter().enumerate() {
        for _ in 0..n {
            s.count(&format!("flow-{key}")).unwrap();
        }
    }
    let estimates: Vec<u64> = (0..counts.len())
        .map(|key| s.estimate(&format!("flow-{key}")).unwrap())
        .collect();
    assert!(estimates.windows(2).all(|w| w[0] <= w[1]), "{estimates:?}");
    assert!((150..=300).contains(&estimates[3]), "{estimates:?}");
}

#[test]
fn test_saturation() {
    let mut s = sketch(16, 4, 4, 5);
    let mut i = 0u32;
    while s.fill_rate() < 1.0 {
        s.count(&i.to_be_bytes()).unwrap();
        i += 1;
    }
    assert_eq!(s.set_bits().count(), 16);
    assert_eq!(s.estimate("any"), Err(SketchError::SaturatedBitmap));

    // counting on a saturated sketch is still a valid no-op
    s.count("any").unwrap();
    assert_eq!(s.fill_rate(), 1.0);
}

#[test]
fn test_fill_rate_is_idempotent() {
    let mut s = sketch(1 << 12, 16, 12, 9);
    for i in 0..100 {
        s.count(&format!("flow-{}", i % 10)).unwrap();
        let first = s.fill_rate();
        assert_eq!(s.fill_rate(), first);
        assert_eq!(first, s.set_bits().count() as f64 / 4096.0);
    }
}

#[test]
fn test_construction() {
    assert!(Sketch::new(64, 4, 8).is_ok());
    for (l, m, w) in [(0, 4, 8), (64, 0, 8), (64, 4, 0), (257, 4, 8)] {
        assert!(
            matches!(Sketch::new(l, m, w), Err(SketchError::InvalidParameter(_))),
            "l = {l}, m = {m}, w = {w}"
        );
    }
}
