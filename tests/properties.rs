//! End-to-end properties of the public API.

use calcitrace::{
    centroids, construct_g, convolve_g, normalize, oasis_ar1, pulse_response, review_units,
    spikes_from_calcium, ArModel, DeconvError, Extent, Outcome, ReviewConfig, Solver,
    UnitFootprint, UnitTraces, DEFAULT_PULSE_LENGTH,
};

/// Seeded LCG in [0, 1).
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn assert_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() < tol, "index {}: {} vs {}", i, x, y);
    }
}

#[test]
fn construct_g_first_column_and_row() {
    let g = [0.7, 0.2, -0.05];
    let matrix = construct_g(&g, 6).unwrap();

    assert_eq!(matrix.column(0), vec![1.0, -0.7, -0.2, 0.05, 0.0, 0.0]);
    assert_eq!(matrix.row(0), &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    assert!(matrix.is_lower_triangular());

    // Constant along every descending diagonal
    for i in 1..6 {
        for j in 1..6 {
            assert_eq!(matrix.get(i, j), matrix.get(i - 1, j - 1));
        }
    }
}

#[test]
fn zero_model_is_identity() {
    let s = [0.0, 1.0, 0.0, 0.3, 2.0, 0.0, 0.0];
    for solver in [Solver::Inverse, Solver::Banded] {
        let result = convolve_g(&s, &[0.0, 0.0, 0.0], solver).unwrap();
        assert_eq!(result.outcome, Outcome::Solved);
        assert_close(&result.calcium, &s, 1e-15);
    }
}

#[test]
fn ar1_geometric_decay() {
    let result = convolve_g(&[1.0, 0.0, 0.0, 0.0, 0.0], &[0.9], Solver::Inverse).unwrap();
    assert_close(&result.calcium, &[1.0, 0.9, 0.81, 0.729, 0.6561], 1e-12);
}

#[test]
fn default_pulse_response_shape() {
    let response = pulse_response(&[0.95], DEFAULT_PULSE_LENGTH).unwrap();

    assert_eq!(response.spikes.len(), 500);
    assert_eq!(response.calcium.len(), 500);
    assert_eq!(response.spikes.iter().filter(|&&s| s != 0.0).count(), 1);
    assert_eq!(response.spikes[0], 1.0);
}

#[test]
fn normalize_known_values_and_idempotence() {
    assert_eq!(normalize(&[2.0, 4.0, 6.0]), vec![0.0, 0.5, 1.0]);

    let mut rng = Lcg(3);
    let a: Vec<f64> = (0..200).map(|_| rng.next() * 50.0 - 25.0).collect();
    let once = normalize(&a);
    assert_close(&normalize(&once), &once, 1e-12);
}

#[test]
fn adversarial_models_pass_through() {
    let s = [1.0, 0.0, 0.5, 0.0, 0.0];
    for g in [vec![f64::NAN], vec![f64::INFINITY, 0.1], vec![0.2, f64::NEG_INFINITY]] {
        for solver in [Solver::Inverse, Solver::Banded] {
            let result = convolve_g(&s, &g, solver).unwrap();
            assert!(matches!(result.outcome, Outcome::Passthrough(_)));
            assert_eq!(result.calcium, s.to_vec());
        }
    }
}

#[test]
fn solvers_agree_on_random_stable_models() {
    let mut rng = Lcg(42);

    for _ in 0..20 {
        let sample_rate = 10.0 + rng.next() * 50.0;
        let tau_rise = 0.01 + rng.next() * 0.1;
        let tau_decay = 0.2 + rng.next() * 1.5;
        let model = ArModel::from_rise_decay(sample_rate, tau_rise, tau_decay).unwrap();
        assert!(model.is_stable());

        let s: Vec<f64> = (0..80)
            .map(|_| if rng.next() < 0.1 { rng.next() * 2.0 } else { 0.0 })
            .collect();

        let inverse = convolve_g(&s, model.coefficients(), Solver::Inverse).unwrap();
        let banded = convolve_g(&s, model.coefficients(), Solver::Banded).unwrap();
        assert_close(&inverse.calcium, &banded.calcium, 1e-9);
    }
}

#[test]
fn solvers_agree_on_growing_models() {
    for (g, len) in [(10.0, 40), (1e4, 5)] {
        let mut s = vec![0.0; len];
        s[0] = 1.0;
        s[len / 2] = 0.5;

        let inverse = convolve_g(&s, &[g], Solver::Inverse).unwrap();
        let banded = convolve_g(&s, &[g], Solver::Banded).unwrap();
        assert_eq!(inverse.outcome, Outcome::Solved);
        assert_eq!(banded.outcome, Outcome::Solved);
        for (a, b) in inverse.calcium.iter().zip(&banded.calcium) {
            assert!((a - b).abs() <= 1e-12 * b.abs().max(1.0), "{} vs {}", a, b);
        }
    }
}

#[test]
fn normalize_full_f64_range() {
    assert_eq!(normalize(&[-f64::MAX, 0.0, f64::MAX]), vec![0.0, 0.5, 1.0]);
}

#[test]
fn spikes_from_calcium_inverts_convolution() {
    let mut rng = Lcg(11);
    let g = [1.3, -0.42];
    let s: Vec<f64> = (0..120)
        .map(|_| if rng.next() < 0.08 { 1.0 } else { 0.0 })
        .collect();

    let c = convolve_g(&s, &g, Solver::Banded).unwrap().calcium;
    assert_close(&spikes_from_calcium(&c, &g).unwrap(), &s, 1e-9);
}

#[test]
fn oasis_recovers_single_spike() {
    let gamma = 0.9;
    let mut s = vec![0.0; 80];
    s[25] = 1.0;
    let y = convolve_g(&s, &[gamma], Solver::Banded).unwrap().calcium;

    let result = oasis_ar1(&y, gamma, 0.0).unwrap();
    assert_close(&result.spikes, &s, 1e-9);
    assert_close(&result.calcium, &y, 1e-9);
}

#[test]
fn order_must_be_below_length() {
    assert_eq!(
        construct_g(&[0.5, 0.1, 0.1], 3).unwrap_err(),
        DeconvError::OrderTooLarge {
            order: 3,
            length: 3
        }
    );
}

#[test]
fn review_mixes_healthy_and_degenerate_units() {
    let make = |unit_id, g: Vec<f64>| {
        let s: Vec<f64> = (0..60).map(|t| if t % 20 == 5 { 1.0 } else { 0.0 }).collect();
        let c = convolve_g(&s, &[0.8], Solver::Banded).unwrap().calcium;
        UnitTraces {
            unit_id,
            raw: c.iter().map(|v| v + 0.1).collect(),
            calcium: c.clone(),
            spikes: s,
            fitted: c,
            g,
        }
    };
    let units = [make(1, vec![0.8]), make(2, vec![f64::NAN]), make(3, vec![1.5, -0.56])];

    let reviews = review_units(&units, &ReviewConfig::default()).unwrap();

    assert_eq!(reviews.len(), 3);
    assert_eq!(
        reviews.iter().map(|r| r.passthrough()).collect::<Vec<_>>(),
        vec![false, true, false]
    );
    for review in &reviews {
        assert_eq!(review.pulse.len(), DEFAULT_PULSE_LENGTH);
        for trace in [&review.raw, &review.calcium, &review.spikes, &review.fitted] {
            assert!(trace.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }
}

#[test]
fn centroids_of_footprints() {
    let mut spot = vec![0.0; 12];
    spot[5] = 1.0; // row 1, column 1 of a 3x4 image
    let units = [
        UnitFootprint {
            unit_id: 4,
            weights: spot,
        },
        UnitFootprint {
            unit_id: 5,
            weights: vec![0.0; 12],
        },
    ];

    let cents = centroids(&units, 3, 4, Extent::pixels(3, 4)).unwrap();

    assert_eq!(cents.len(), 1);
    assert_eq!(cents[0].unit_id, 4);
    assert!((cents[0].height - 2.0 / 3.0).abs() < 1e-12);
    assert!((cents[0].width - 0.75).abs() < 1e-12);

    assert_eq!(
        centroids(&units, 4, 4, Extent::pixels(4, 4)).unwrap_err(),
        DeconvError::FootprintShape {
            height: 4,
            width: 4,
            got: 12
        }
    );
}
