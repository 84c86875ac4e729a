use fib_bench::fib_core::{
    fib_iterative, fib_recursive, recursive_call_count, series_dp, series_iterative, MemoCache,
    Strategy, MAX_INDEX,
};

#[test]
fn strategies_agree_up_to_thirty() {
    let mut cache = MemoCache::new();
    for n in 0..=30 {
        let iterative = fib_iterative(n);
        assert_eq!(fib_recursive(n), iterative, "recursive differs at n={n}");
        assert_eq!(cache.fib(n), iterative, "dp differs at n={n}");
    }
}

#[test]
fn base_cases() {
    let mut cache = MemoCache::new();
    for strategy in Strategy::ALL {
        assert_eq!(strategy.evaluate(0, &mut cache, None).unwrap(), 0);
        assert_eq!(strategy.evaluate(1, &mut cache, None).unwrap(), 1);
    }
}

#[test]
fn known_sequence() {
    let expected = [0u64, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55];
    let mut cache = MemoCache::new();
    for strategy in Strategy::ALL {
        let got: Vec<u64> = (0..=10)
            .map(|n| strategy.evaluate(n, &mut cache, None).unwrap())
            .collect();
        assert_eq!(got, expected, "{strategy}");
    }
}

#[test]
fn monotone_and_satisfies_the_recurrence() {
    for n in 0..MAX_INDEX {
        assert!(fib_iterative(n + 1) >= fib_iterative(n));
    }
    for n in 2..=MAX_INDEX {
        assert_eq!(fib_iterative(n), fib_iterative(n - 1) + fib_iterative(n - 2));
    }
}

#[test]
fn dp_is_idempotent_and_cheaper_the_second_time() {
    let mut cache = MemoCache::new();
    let first_value = cache.fib(60);
    let first_cost = cache.computations() + cache.lookups();
    let second_value = cache.fib(60);
    let second_cost = cache.computations() + cache.lookups() - first_cost;
    assert_eq!(first_value, second_value);
    assert!(second_cost <= first_cost);
}

#[test]
fn printer_operation_counts() {
    let mut cache = MemoCache::new();
    for n in 0..=40u32 {
        assert_eq!(
            series_iterative(n).unwrap().operations.value(),
            n.saturating_sub(2) as u64
        );
        assert_eq!(series_dp(n, &mut cache).unwrap().operations.value(), n as u64);
    }
}

#[test]
fn exact_recursive_calls_match_an_instrumented_count() {
    fn counted(n: u32, calls: &mut u128) -> u64 {
        *calls += 1;
        if n <= 1 {
            return n as u64;
        }
        counted(n - 1, calls) + counted(n - 2, calls)
    }
    for n in 0..=20 {
        let mut calls = 0;
        counted(n, &mut calls);
        assert_eq!(recursive_call_count(n).unwrap(), calls);
    }
}
