use proptest::prelude::*;
use qrgrid::segment::{basic_segments, optimize_segments};
use qrgrid::{encode, Mode, QrCodeEcc, QrError, QrOptions, QrSegment};

fn any_level() -> impl Strategy<Value = QrCodeEcc> {
    prop_oneof![
        Just(QrCodeEcc::Low),
        Just(QrCodeEcc::Medium),
        Just(QrCodeEcc::Quartile),
        Just(QrCodeEcc::High),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn encoding_is_deterministic(text in "[ -~]{1,120}", ecl in any_level()) {
        let options = QrOptions::new().with_error_correction(ecl);
        let a = encode(&text, options).unwrap();
        let b = encode(&text, options).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn grid_shape_matches_version(text in "\\PC{1,80}", ecl in any_level()) {
        let qr = encode(&text, QrOptions::new().with_error_correction(ecl)).unwrap();
        prop_assert_eq!(qr.size(), usize::from(qr.version().value()) * 4 + 17);
        prop_assert_eq!(qr.data().len(), qr.size() * qr.size());
        prop_assert_eq!(qr.reserved_bits().len(), qr.data().len());
        let joined: String = qr.segments().iter().map(QrSegment::value).collect();
        prop_assert_eq!(joined, text);
    }

    #[test]
    fn optimised_segments_are_well_formed(text in "[0-9A-Za-z $%*+./:-]{1,60}", regime in 0usize..3) {
        let optimised = optimize_segments(&basic_segments(&text), regime);
        for pair in optimised.windows(2) {
            prop_assert_ne!(pair[0].mode(), pair[1].mode());
        }
        for seg in &optimised {
            match seg.mode() {
                Mode::Numeric => prop_assert!(QrSegment::is_numeric(seg.value())),
                Mode::Alphanumeric => prop_assert!(QrSegment::is_alphanumeric(seg.value())),
                _ => {}
            }
        }
        let joined: String = optimised.iter().map(QrSegment::value).collect();
        prop_assert_eq!(joined, text);
    }

    #[test]
    fn version_grows_with_digit_count(a in 1usize..2000, b in 1usize..2000, ecl in any_level()) {
        let (short, long) = (a.min(b), a.max(b));
        let options = QrOptions::new().with_error_correction(ecl);
        let v_short = encode(&"7".repeat(short), options).unwrap().version();
        let v_long = encode(&"7".repeat(long), options).unwrap().version();
        prop_assert!(v_short <= v_long);
    }

    #[test]
    fn version_grows_with_byte_count(a in 1usize..1200, b in 1usize..1200, ecl in any_level()) {
        let (short, long) = (a.min(b), a.max(b));
        let options = QrOptions::new().with_error_correction(ecl);
        let v_short = encode(&"q".repeat(short), options).unwrap().version();
        let v_long = encode(&"q".repeat(long), options).unwrap().version();
        prop_assert!(v_short <= v_long);
    }
}

#[test]
fn capacity_error_reports_sizes() {
    let options = QrOptions::new().with_error_correction(QrCodeEcc::Low);
    match encode(&"9".repeat(7090), options) {
        Err(QrError::CapacityExceeded {
            required_bits,
            capacity_bits,
        }) => {
            assert!(required_bits > capacity_bits - 18);
            assert_eq!(capacity_bits, 2956 * 8);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(encode(&"9".repeat(7089), options).is_ok());
}
