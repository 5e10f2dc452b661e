use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tesser_core::{Candle, Field, Series};
use tesser_indicators::indicators::{Adx, Boll, Ma, Rsi, Stoch};
use tesser_indicators::{
    registry, AdxParams, BollParams, FunctionHandle, FunctionRegistry, IndicatorError,
    PeriodParams, StochParams, WindowParams,
};

fn series(len: usize) -> Arc<Series> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let candles = (0..len).map(|i| {
        let close = Decimal::from(100 + (i % 7) as i64);
        Candle::new(
            start + Duration::minutes(i as i64),
            close,
            close + Decimal::ONE,
            close - Decimal::ONE,
            close,
            Decimal::from(10),
        )
    });
    Arc::new(Series::from_candles(candles).unwrap())
}

#[test]
fn value_equal_params_share_one_instance() {
    let series = series(30);
    let registry = FunctionRegistry::new();
    let a = registry
        .get::<Boll>(
            &series,
            BollParams {
                field: Field::Close,
                period: 20,
                alpha: dec!(2.0),
            },
        )
        .unwrap();
    let b = registry
        .get::<Boll>(
            &series,
            BollParams {
                field: Field::Close,
                period: 20,
                alpha: dec!(2),
            },
        )
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let untyped = registry.get_instance(&series, *a.spec()).unwrap();
    assert!(matches!(&untyped, FunctionHandle::Boll(f) if Arc::ptr_eq(f, &a)));
    let again = registry.get_instance(&series, *b.spec()).unwrap();
    assert!(untyped.ptr_eq(&again));
}

#[test]
fn different_series_get_different_instances() {
    let (left, right) = (series(5), series(5));
    let registry = FunctionRegistry::new();
    let a = registry.get::<Ma>(&left, WindowParams::close(3)).unwrap();
    let b = registry.get::<Ma>(&right, WindowParams::close(3)).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn registry_never_keeps_functions_alive() {
    let series = series(20);
    let registry = FunctionRegistry::new();
    let adx = registry
        .get::<Adx>(&series, AdxParams { period: 5, period_adx: 5 })
        .unwrap();
    assert_eq!(registry.live_count(&series), 5);

    drop(adx);
    assert_eq!(registry.live_count(&series), 0);
    assert_eq!(registry.prune(), 5);
    assert_eq!(registry.prune(), 0);
}

#[test]
fn dropped_dependencies_are_rebuilt_on_demand() {
    let series = series(20);
    let registry = FunctionRegistry::new();
    let first = registry
        .get::<Stoch>(
            &series,
            StochParams {
                period: 5,
                period_k: 3,
                period_d: 3,
            },
        )
        .unwrap();
    let k = first.stoch_k(series.session(), 19);
    drop(first);

    let second = registry
        .get::<Stoch>(
            &series,
            StochParams {
                period: 5,
                period_k: 3,
                period_d: 3,
            },
        )
        .unwrap();
    assert_eq!(second.stoch_k(series.session(), 19), k);
}

#[test]
fn concurrent_lookups_resolve_to_one_instance() {
    let series = series(50);
    let registry = Arc::new(FunctionRegistry::new());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let series = series.clone();
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let rsi = registry.get::<Rsi>(&series, PeriodParams::new(14)).unwrap();
                rsi.rsi(series.session(), 49);
                rsi
            })
        })
        .collect();
    let instances: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert!(instances
        .windows(2)
        .all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(registry.live_count(&series), 1);
}

#[test]
fn concurrent_readers_agree_with_a_single_pass() {
    let series = series(200);
    let registry = Arc::new(FunctionRegistry::new());
    let expected = {
        let reference = series.clone();
        let fresh = FunctionRegistry::new();
        let adx = fresh
            .get::<Adx>(&reference, AdxParams { period: 14, period_adx: 14 })
            .unwrap();
        adx.adx(reference.session(), 199)
    };

    let readers: Vec<_> = (0..4)
        .map(|offset| {
            let series = series.clone();
            let registry = registry.clone();
            thread::spawn(move || {
                let adx = registry
                    .get::<Adx>(&series, AdxParams { period: 14, period_adx: 14 })
                    .unwrap();
                for idx in (offset..200).step_by(4) {
                    adx.adx(series.session(), idx);
                }
                adx.adx(series.session(), 199)
            })
        })
        .collect();
    for reader in readers {
        assert_eq!(reader.join().unwrap(), expected);
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let series = series(3);
    let registry = FunctionRegistry::new();
    let err = registry
        .get::<Ma>(&series, WindowParams::close(0))
        .unwrap_err();
    assert_eq!(err, IndicatorError::invalid_period("MA", 0));
    assert_eq!(registry.live_count(&series), 0);
}

#[test]
fn global_registry_is_shared() {
    let series = series(10);
    let a = registry().get::<Ma>(&series, WindowParams::close(4)).unwrap();
    let b = registry().get::<Ma>(&series, WindowParams::close(4)).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
