use super::{resume_worker_panic, run};
use crate::{
    context::Context,
    error::{Error, Result},
    group::Group,
    mapper::{Infallible, Mapper},
    options::Options,
    outcome::Outcome,
};

/// Applies `f` to every item on at most `opts.max_workers()` threads.
/// The output is in input order.
pub fn par_map<T, M>(ctx: &Context, items: Vec<T>, f: M, opts: Options) -> Outcome<Vec<M::Out>>
where
    T: Send,
    M: Mapper<T> + Clone + Send,
    M::Out: Send,
{
    par_try(ctx, items, Infallible(f), opts)
}

/// Like [`par_map`], but `f` may fail. The first failure cancels the rest of
/// the work and is returned alone; no partial output is returned.
pub fn par_try<T, U, E, M>(ctx: &Context, items: Vec<T>, f: M, opts: Options) -> Outcome<Vec<U>>
where
    T: Send,
    U: Send,
    E: Into<Error>,
    M: Mapper<T, Out = std::result::Result<U, E>> + Clone + Send,
{
    if let Err(err) = opts.validate() {
        return Outcome::error(err);
    }
    if items.is_empty() {
        return Outcome::ok(Vec::new());
    }
    if let Err(err) = ctx.check() {
        return Outcome::error(err);
    }

    let len = items.len();
    let mut slots: Vec<Option<U>> = Vec::with_capacity(len);
    slots.resize_with(len, || None);

    // Each item travels with exclusive access to its own output slot.
    let group = Group::new(ctx);
    let mut jobs = slots.iter_mut().zip(items);
    let joined = run(
        &group,
        opts.max_workers().min(len),
        f,
        move |_| Ok(jobs.next()),
        fill_slot,
    );
    if let Err(panic) = joined {
        resume_worker_panic(panic);
    }

    match group.finish() {
        Ok(()) => {
            let out: Vec<U> = slots.into_iter().flatten().collect();
            debug_assert_eq!(out.len(), len);
            Outcome::ok(out)
        }
        Err(err) => Outcome::error(err),
    }
}

fn fill_slot<U>(slot: &mut Option<U>, value: U) -> Result<()> {
    *slot = Some(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::testing::InFlight;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    #[test]
    fn test_par_map_square() {
        let ctx = Context::background();
        let got = par_map(&ctx, vec![0, 1, 2, 3, 4], |x: i32| x * x, Options::new().concurrency(2));
        assert_eq!(got.unwrap(), vec![0, 1, 4, 9, 16]);
    }

    #[test]
    fn test_par_map_preserves_order_for_all_widths() {
        let ctx = Context::background();
        let items: Vec<u64> = (0..64).collect();
        for k in [1, 2, 3, 8, 100] {
            // Later items finish first, so completion order is reversed.
            let got = par_map(
                &ctx,
                items.clone(),
                |x: u64| {
                    thread::sleep(Duration::from_micros(64 - x));
                    x * 3
                },
                Options::new().concurrency(k),
            )
            .unwrap();
            let want: Vec<u64> = items.iter().map(|x| x * 3).collect();
            assert_eq!(got, want, "concurrency {}", k);
        }
    }

    #[test]
    fn test_par_try_fails() {
        let ctx = Context::background();
        let got = par_try(
            &ctx,
            vec![0, 1, 2, 3, 4],
            |x: i32| if x == 3 { Err(Error::msg("three")) } else { Ok(x) },
            Options::new().concurrency(4),
        );
        assert_eq!(got.get().unwrap_err().to_string(), "three");
    }

    #[test]
    fn test_par_try_returns_one_of_the_failures() {
        let ctx = Context::background();
        let got = par_try(
            &ctx,
            (0..20).collect(),
            |x: i32| {
                if x % 5 == 0 {
                    Err(Error::msg(format!("bad {x}")))
                } else {
                    Ok(x)
                }
            },
            Options::new().concurrency(4),
        );
        let msg = got.get().unwrap_err().to_string();
        assert!(["bad 0", "bad 5", "bad 10", "bad 15"].contains(&msg.as_str()), "{}", msg);
    }

    #[test]
    fn test_par_try_stops_dispatch_after_failure() {
        let ctx = Context::background();
        let calls = AtomicUsize::new(0);
        let got = par_try(
            &ctx,
            (0..1000).collect(),
            |x: i32| {
                calls.fetch_add(1, Ordering::SeqCst);
                if x == 0 {
                    return Err(Error::msg("early"));
                }
                thread::sleep(Duration::from_millis(1));
                Ok(x)
            },
            Options::new().concurrency(2),
        );
        assert!(got.is_err());
        assert!(calls.load(Ordering::SeqCst) < 1000);
    }

    #[test]
    fn test_empty_input() {
        let ctx = Context::background();
        let got = par_map(&ctx, Vec::<i32>::new(), |x: i32| x, Options::new());
        assert_eq!(got.unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn test_zero_concurrency_rejected_before_work() {
        let ctx = Context::background();
        let calls = AtomicUsize::new(0);
        let got = par_map(
            &ctx,
            vec![1, 2, 3],
            |x: i32| {
                calls.fetch_add(1, Ordering::SeqCst);
                x
            },
            Options::new().concurrency(0),
        );
        assert!(matches!(got.err(), Some(Error::InvalidConcurrency(0))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_canceled_before_start_spawns_nothing() {
        let ctx = Context::background().child();
        ctx.cancel();
        let calls = AtomicUsize::new(0);
        let got = par_map(
            &ctx,
            vec![1, 2, 3],
            |x: i32| {
                calls.fetch_add(1, Ordering::SeqCst);
                x
            },
            Options::new(),
        );
        assert!(matches!(got.err(), Some(Error::Canceled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_mid_flight_joins_workers() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        let in_flight = InFlight::default();
        let got = par_map(
            &ctx,
            (0..10_000).collect(),
            |x: i32| {
                in_flight.enter();
                thread::sleep(Duration::from_millis(1));
                in_flight.exit();
                x
            },
            Options::new().concurrency(4),
        );
        assert!(matches!(got.err(), Some(Error::DeadlineExceeded)));
        assert_eq!(in_flight.now(), 0);
        assert!(in_flight.max() <= 4);
    }

    #[test]
    fn test_concurrency_limit() {
        let ctx = Context::background();
        let in_flight = InFlight::default();
        let got = par_map(
            &ctx,
            (0..25).collect(),
            |x: i32| {
                in_flight.enter();
                thread::sleep(Duration::from_millis(2));
                in_flight.exit();
                x
            },
            Options::new().concurrency(3),
        );
        assert_eq!(got.unwrap().len(), 25);
        assert!(in_flight.max() <= 3);
    }

    #[test]
    #[should_panic(expected = "mapper panic")]
    fn test_worker_panic_propagates() {
        let ctx = Context::background();
        let _ = par_map(
            &ctx,
            vec![1, 2, 3],
            |x: i32| {
                if x == 2 {
                    panic!("mapper panic");
                }
                x
            },
            Options::new().concurrency(2),
        );
    }
}
