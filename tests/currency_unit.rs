use streamshop::currency::{convert_with, cross_rate, round2, round4, usd_snapshot_with};
use streamshop::error::ShopError;

fn rates(code: &str) -> Option<f64> {
    match code {
        "MXN" => Some(17.5),
        "COP" => Some(4200.0),
        _ => None,
    }
}

#[test]
fn identity_conversion_keeps_amount_and_unit_rate() {
    let c = convert_with(50.0, "usd", "USD", rates).expect("convert");
    assert_eq!(c.converted_amount, 50.0);
    assert_eq!(c.rate, 1.0);
    assert_eq!(c.from, "USD");
    assert_eq!(c.to, "USD");

    // También para códigos fuera de la tabla: la identidad no consulta tasas.
    let c = convert_with(3.0, "zzz", "ZZZ", rates).expect("convert");
    assert_eq!(c.converted_amount, 3.0);
    assert_eq!(c.rate, 1.0);
}

#[test]
fn non_positive_amount_is_rejected() {
    let err = convert_with(-5.0, "USD", "MXN", rates).unwrap_err();
    assert!(matches!(err, ShopError::Validation(_)));

    let err = convert_with(0.0, "USD", "MXN", rates).unwrap_err();
    assert!(matches!(err, ShopError::Validation(_)));
}

#[test]
fn unknown_currency_is_rejected() {
    match convert_with(10.0, "USD", "ZZZ", rates).unwrap_err() {
        ShopError::NotFound(msg) => assert!(msg.contains("ZZZ")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn usd_to_target_multiplies_by_stored_rate() {
    let c = convert_with(10.0, "USD", "MXN", rates).expect("convert");
    assert_eq!(c.converted_amount, 175.0);
    assert_eq!(c.rate, 17.5);
}

#[test]
fn target_to_usd_divides_by_stored_rate() {
    let c = convert_with(175.0, "MXN", "USD", rates).expect("convert");
    assert_eq!(c.converted_amount, 10.0);
    assert_eq!(c.rate, 0.0571);
}

#[test]
fn cross_conversion_routes_through_usd() {
    let c = convert_with(100.0, "MXN", "COP", rates).expect("convert");
    assert_eq!(c.converted_amount, 24000.0);
    assert_eq!(c.rate, 240.0);
}

#[test]
fn round_trip_stays_within_rounding_tolerance() {
    for amount in [1.0, 9.99, 123.45, 10_000.0] {
        let there = convert_with(amount, "USD", "MXN", rates).expect("ida");
        let back = convert_with(there.converted_amount, "MXN", "USD", rates).expect("vuelta");
        assert!(
            (back.converted_amount - amount).abs() <= 0.01,
            "{amount} -> {} -> {}",
            there.converted_amount,
            back.converted_amount
        );
    }

    let there = convert_with(250.0, "MXN", "COP", rates).expect("ida");
    let back = convert_with(there.converted_amount, "COP", "MXN", rates).expect("vuelta");
    assert!((back.converted_amount - 250.0).abs() <= 0.01);
}

#[test]
fn reported_values_are_rounded() {
    // 1/4200 y 100/4200 tienen colas largas; la salida va recortada.
    let c = convert_with(100.0, "COP", "USD", rates).expect("convert");
    assert_eq!(c.converted_amount, 0.02);
    assert_eq!(c.rate, 0.0002);

    assert_eq!(round2(3.14159), 3.14);
    assert_eq!(round2(-2.347), -2.35);
    assert_eq!(round4(0.123456), 0.1235);
}

#[test]
fn cross_rate_is_ratio_of_stored_rates() {
    assert_eq!(cross_rate(17.5, 4200.0), 240.0);
}

#[test]
fn usd_snapshot_freezes_stored_rate() {
    let s = usd_snapshot_with(100.0, "USD", rates).expect("snapshot");
    assert_eq!(s.amount_usd, 100.0);
    assert_eq!(s.exchange_rate, 1.0);

    let s = usd_snapshot_with(350.0, "mxn", rates).expect("snapshot");
    assert_eq!(s.amount_usd, 20.0);
    assert_eq!(s.exchange_rate, 17.5);

    let err = usd_snapshot_with(10.0, "ZZZ", rates).unwrap_err();
    assert!(matches!(err, ShopError::NotFound(_)));
}
