//! Integration tests for the market structure engine.
//!
//! These tests drive full scans through the public API.

use smcstruct::prelude::*;
use smcstruct::structure::SwingSide;

/// Simple test bar structure
#[derive(Debug, Clone, Copy)]
struct TestBar {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
}

impl OHLCV for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        1000.0
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.t)
    }
}

/// Bars with a half-point wick on each side of the close
fn bars_from_closes(closes: &[f64]) -> Vec<TestBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| TestBar {
            t: 1_700_000_000 + i as i64 * 60,
            o: c,
            h: c + 0.5,
            l: c - 0.5,
            c,
        })
        .collect()
}

/// Major bottom 99.5 at bar 5, top 110 at bar 30, close under the bottom at bar 37,
/// then a rally closing through 110 on bar 45 (108 on bar 44).
fn choch_series() -> Vec<TestBar> {
    let mut closes = Vec::new();
    for k in 0..=5 {
        closes.push(104.0 - 0.8 * k as f64);
    }
    for k in 6..=29 {
        closes.push(100.0 + (k - 5) as f64 * 0.38);
    }
    closes.push(109.5);
    closes.extend([108.0, 106.0, 104.0, 102.0, 100.5, 100.0, 99.0]);
    closes.extend([98.5, 99.0, 100.0, 102.0, 104.0, 106.0, 108.0]);
    closes.push(112.0);
    closes.extend([111.0, 110.5, 111.0, 111.5, 112.0]);

    let mut bars = bars_from_closes(&closes);
    bars[30].h = 110.0;
    bars
}

/// Deterministic wave with noise-like variation
fn wave_bars(n: usize) -> Vec<TestBar> {
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0 + (i as f64 * 0.15).sin() * 1.5;
            let o = price;
            let c = price + change;
            price = c;
            TestBar {
                t: i as i64,
                o,
                h: o.max(c) + 0.4 + (i % 3) as f64 * 0.2,
                l: o.min(c) - 0.4 - (i % 4) as f64 * 0.2,
                c,
            }
        })
        .collect()
}

// ============================================================
// SCENARIOS
// ============================================================

#[test]
fn test_monotonic_closes_confirm_no_swing_high() {
    // Rising closes and highs, flat lows
    let bars: Vec<TestBar> = (0..60)
        .map(|i| {
            let c = 100.0 + i as f64;
            TestBar {
                t: i as i64,
                o: c - 0.5,
                h: c + 1.0,
                l: 50.0,
                c,
            }
        })
        .collect();
    let atr = vec![5.0; bars.len()];
    let engine = SmcBuilder::new().swing_length(10).build().unwrap();

    let mut iter = engine.iter(&bars, &atr).unwrap();
    while let Some(update) = iter.next() {
        assert!(update.swings.iter().all(|s| s.kind != SwingKind::Top));
        assert_eq!(iter.state().major_swings().side(), SwingSide::Top);
        assert_eq!(update.major_trend, Direction::Neutral);
    }

    let output = engine.scan(&bars, &atr).unwrap();
    assert!(output.events.is_empty());
    assert!(output.bullish_blocks.is_empty());
    assert!(output.bearish_blocks.is_empty());
    assert!(output.records.iter().all(|r| r.major_trend == Direction::Neutral));
}

#[test]
fn test_choch_long_written_over_swing_range() {
    let bars = choch_series();
    let atr = vec![5.0; bars.len()];
    let engine = SmcBuilder::new().swing_length(10).build().unwrap();
    let output = engine.scan(&bars, &atr).unwrap();

    let top = output
        .swings
        .iter()
        .find(|s| s.resolution == Resolution::Long && s.kind == SwingKind::Top)
        .unwrap();
    assert_eq!(top.value, 110.0);
    assert_eq!(top.origin_index, 30);
    assert_eq!(top.confirmed_index, 40);

    assert_eq!(output.records[44].major_trend, Direction::Bearish);
    for k in 30..=45 {
        assert_eq!(
            output.records[k].level(BreakKind::HighChoch, Resolution::Long),
            Some(110.0),
            "bar {k}"
        );
    }
    assert_eq!(output.records[29].high_long, None);
    assert_eq!(output.records[46].high_long, None);
    assert_eq!(output.records[45].major_trend, Direction::Bullish);
    assert_eq!(output.records[45].signal, Signal::Buy);

    let low_break = output
        .events
        .iter()
        .find(|e| e.resolution == Resolution::Long && !e.kind.is_bullish())
        .unwrap();
    assert_eq!(low_break.kind, BreakKind::LowBos);
    assert_eq!((low_break.start_index, low_break.end_index), (5, 37));
}

#[test]
fn test_top_disarmed_after_break() {
    let bars = choch_series();
    let atr = vec![5.0; bars.len()];
    let engine = SmcBuilder::new().swing_length(10).build().unwrap();

    let mut iter = engine.iter(&bars, &atr).unwrap();
    for update in iter.by_ref().take(46) {
        if update.index == 44 {
            assert_eq!(update.major_trend, Direction::Bearish);
        }
    }
    let major = iter.state().major();
    assert_eq!(major.trend(), Direction::Bullish);
    assert!(!major.top_armed());
    assert_eq!(major.top().map(|t| t.value), Some(110.0));

    // No further long high break for the rest of the series
    let later: Vec<BreakEvent> = iter
        .flat_map(|u| u.breaks)
        .filter(|e| e.resolution == Resolution::Long && e.kind.is_bullish())
        .collect();
    assert!(later.is_empty());
}

#[test]
fn test_major_top_break_lands_in_bearish_list() {
    // Locked-in mapping: a long high break extracts a non-top block into the bearish list
    let bars = choch_series();
    let atr = vec![5.0; bars.len()];
    let engine = SmcBuilder::new().swing_length(10).build().unwrap();

    let mut iter = engine.iter(&bars, &atr).unwrap();
    iter.by_ref().take(45).for_each(drop);
    let bearish_before = iter.state().bearish_blocks().clone();

    let update = iter.next().unwrap();
    assert_eq!(update.index, 45);
    assert!(update
        .breaks
        .iter()
        .any(|e| e.resolution == Resolution::Long && e.kind == BreakKind::HighChoch));

    let added: Vec<&OrderBlock> = iter
        .state()
        .bearish_blocks()
        .iter()
        .filter(|b| !bearish_before.contains(b.identity()))
        .collect();
    assert!(added.iter().any(|b| !b.is_top));
}

#[test]
fn test_order_block_invalidated_by_close() {
    let mut list = OrderBlockList::new();
    list.push_front(OrderBlock {
        is_top: false,
        time: 10,
        open: 101.0,
        high: 102.0,
        low: 99.0,
        close: 100.0,
    });

    for close in [104.0, 100.0, 101.5] {
        list.prune(close, 5);
        assert!(list.contains((false, 10)), "removed at close {close}");
    }
    list.prune(99.99, 5);
    assert!(!list.contains((false, 10)));
    list.prune(120.0, 5);
    assert!(!list.contains((false, 10)));
}

#[test]
fn test_equal_levels_gated() {
    let bars = wave_bars(400);
    let atr = smcstruct::structure::atr(&bars, 14);

    let disabled = SmcBuilder::new().swing_length(20).build().unwrap();
    let output = disabled.scan(&bars, &atr).unwrap();
    assert!(output.equal_levels.is_empty());
    assert!(output
        .records
        .iter()
        .all(|r| r.equal_high.is_none() && r.equal_low.is_none()));

    let enabled = SmcBuilder::new()
        .swing_length(20)
        .equal_levels(true)
        .eq_bars_confirmation(2)
        .eq_threshold(5)
        .build()
        .unwrap();
    let output = enabled.scan(&bars, &atr).unwrap();
    for zone in &output.equal_levels {
        let slot = |r: &StructureRecord| match zone.kind {
            EqualKind::High => r.equal_high,
            EqualKind::Low => r.equal_low,
        };
        assert!(zone.start_index < zone.end_index);
        assert!(slot(&output.records[zone.end_index]).is_some());
    }
}

// ============================================================
// ENGINE BEHAVIOUR
// ============================================================

#[test]
fn test_engine_reuse_is_deterministic() {
    let bars = wave_bars(500);
    let engine = SmcBuilder::new()
        .swing_length(15)
        .equal_levels(true)
        .build()
        .unwrap();

    let first = engine.scan_bars(&bars).unwrap();
    let second = engine.scan_bars(&bars).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_records_match_event_ranges() {
    let bars = wave_bars(500);
    let atr = smcstruct::structure::atr(&bars, 14);
    let engine = SmcBuilder::new().swing_length(12).build().unwrap();
    let output = engine.scan(&bars, &atr).unwrap();

    assert!(!output.events.is_empty());
    for event in &output.events {
        assert!(event.start_index <= event.end_index);
        // A later event of the same slot may overwrite part of the range
        let carried = output.records[event.end_index]
            .break_at(event.resolution, event.kind.is_bullish())
            .unwrap();
        assert!(carried.start_index <= event.end_index);
        assert!(carried.end_index >= event.end_index);
    }
}

#[test]
fn test_strong_weak_levels_written() {
    let bars = wave_bars(300);
    let atr = smcstruct::structure::atr(&bars, 14);
    let engine = SmcBuilder::new().swing_length(10).build().unwrap();
    let output = engine.scan(&bars, &atr).unwrap();

    let max_high = bars.iter().map(|b| b.h).fold(f64::MIN, f64::max);
    let min_low = bars.iter().map(|b| b.l).fold(f64::MAX, f64::min);
    let levels = output.levels;

    let last_trend = output.records.last().unwrap().major_trend;
    let high = if last_trend.is_bearish() {
        levels.strong_high
    } else {
        levels.weak_high
    };
    let low = if last_trend.is_bullish() {
        levels.strong_low
    } else {
        levels.weak_low
    };
    assert_eq!(high.unwrap().value, max_high);
    assert_eq!(low.unwrap().value, min_low);
}

#[test]
fn test_config_serde_round_trip() {
    let engine = SmcBuilder::new()
        .swing_length(30)
        .order_block_number(3)
        .equal_levels(true)
        .eq_threshold(2)
        .build()
        .unwrap();

    let json = serde_json::to_string(engine.config()).unwrap();
    let config: SmcConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(&config, engine.config());

    let partial: SmcConfig = serde_json::from_str(r#"{"swing_length": 20}"#).unwrap();
    assert_eq!(partial.swing_length.get(), 20);
    assert_eq!(partial.order_block_number, 5);

    assert!(serde_json::from_str::<SmcConfig>(r#"{"swing_length": 0}"#).is_err());
    assert!(serde_json::from_str::<SmcConfig>(r#"{"eq_threshold": 7}"#).is_err());
}

#[test]
fn test_parallel_matches_sequential() {
    let engine = SmcBuilder::new().swing_length(10).build().unwrap();
    let a = wave_bars(200);
    let b = wave_bars(350);
    let atr_a = smcstruct::structure::atr(&a, 14);
    let atr_b = smcstruct::structure::atr(&b, 14);

    let instruments: Vec<(&str, &[TestBar], &[f64])> =
        vec![("A", &a, &atr_a), ("B", &b, &atr_b)];
    let (results, errors) = scan_parallel(&engine, instruments);
    assert!(errors.is_empty());

    for result in results {
        let expected = match result.symbol.as_str() {
            "A" => engine.scan(&a, &atr_a).unwrap(),
            _ => engine.scan(&b, &atr_b).unwrap(),
        };
        assert_eq!(result.output, expected);
    }
}
