use choromap::Scheme;
use choromap::classify::{compute_breaks, interval_labels};

fn some(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

#[test]
fn breaks_have_k_plus_one_non_decreasing_values() {
    let series = some(&[3.0, 9.5, 1.0, 42.0, 17.0, 8.0, 23.0, 5.5, 30.1]);
    for scheme in [Scheme::Quantiles, Scheme::EqualInterval, Scheme::NaturalBreaks] {
        for k in 1..=7 {
            let breaks = compute_breaks(&series, scheme, k);
            assert_eq!(breaks.len(), k + 1, "{scheme:?} k={k}");
            assert!(
                breaks.windows(2).all(|w| w[0] <= w[1]),
                "{scheme:?} k={k}: {breaks:?} not sorted"
            );
            assert_eq!(breaks[0], 1.0, "first break is the series min");
            assert!(breaks[k] >= 42.0, "last break covers the series max");
            assert_eq!(interval_labels(&breaks).len(), k);
        }
    }
}

#[test]
fn equal_interval_scenario() {
    let series = some(&[5.0, 12.0, 18.0, 24.0, 30.0, 45.0, 60.0, 85.0]);
    let breaks = compute_breaks(&series, Scheme::EqualInterval, 5);
    let expected = [5.0, 21.0, 37.0, 53.0, 69.0, 85.0];
    assert_eq!(breaks.len(), expected.len());
    for (got, want) in breaks.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{breaks:?} != {expected:?}");
    }
    assert_eq!(interval_labels(&breaks).len(), 5);
}

#[test]
fn more_classes_than_values_still_holds_the_invariant() {
    let series = some(&[2.0, 7.0]);
    for scheme in [Scheme::Quantiles, Scheme::EqualInterval, Scheme::NaturalBreaks] {
        let breaks = compute_breaks(&series, scheme, 5);
        assert_eq!(breaks.len(), 6, "{scheme:?}");
        assert!(breaks.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(breaks[0], 2.0);
        assert_eq!(breaks[5], 7.0);
    }
}

#[test]
fn single_value_series() {
    let series = some(&[4.0]);
    let breaks = compute_breaks(&series, Scheme::EqualInterval, 3);
    assert_eq!(breaks, vec![4.0; 4]);
    assert_eq!(interval_labels(&breaks).len(), 3);
}

#[test]
fn empty_series_gives_empty_breaks() {
    assert!(compute_breaks(&[], Scheme::Quantiles, 5).is_empty());
    let all_missing = vec![None, None, None];
    assert!(compute_breaks(&all_missing, Scheme::NaturalBreaks, 4).is_empty());
}

#[test]
fn labels_use_en_dash_and_compact_numbers() {
    let labels = interval_labels(&[0.0, 12.0, 1234.5]);
    assert_eq!(labels[0], "0\u{2013}12");
    // non-integer boundary compacts to two significant figures
    assert_eq!(labels[1], "12\u{2013}1200");
    let labels = interval_labels(&[0.125, 0.88]);
    assert_eq!(labels, vec!["0.13\u{2013}0.88"]);
}

#[test]
fn unknown_scheme_name_is_rejected() {
    let err = Scheme::parse("stddev").unwrap_err();
    assert!(err.to_string().contains("unsupported classification scheme"));
}
