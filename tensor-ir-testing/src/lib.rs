//! Helpers shared by the tests of the tensor-ir crates.

use std::fmt::Debug;
use std::panic::{catch_unwind, RefUnwindSafe, UnwindSafe};

/// Run a test function over a table of cases.
///
/// Tests in this workspace are usually written as a `Case` struct deriving
/// `Debug`, an array of cases and a closure that checks one case:
///
/// ```
/// use tensor_ir_testing::TestCases;
///
/// #[derive(Debug)]
/// struct Case {
///     lhs: usize,
///     rhs: usize,
///     sum: usize,
/// }
///
/// let cases = [
///     Case { lhs: 1, rhs: 2, sum: 3 },
///     Case { lhs: 0, rhs: 0, sum: 0 },
/// ];
///
/// cases.test_each(|case| {
///     assert_eq!(case.lhs + case.rhs, case.sum);
/// });
/// ```
///
/// Every case is run even if an earlier one fails. Once all cases have run,
/// the method panics if any of them failed, listing the `Debug` output of
/// each failing case.
///
/// The closure and the cases it sees must be unwind safe, since panics are
/// caught with [`catch_unwind`]. Values with interior mutability should be
/// created inside the closure, or wrapped in
/// [`AssertUnwindSafe`](std::panic::AssertUnwindSafe).
pub trait TestCases {
    type Case;

    /// Run `test` with a reference to each case.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Run `test` with a clone of each case.
    fn test_each_clone(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + Clone + UnwindSafe;

    /// Run `test` with each case by value.
    ///
    /// The `Debug` output of each case is captured before the case is moved
    /// into the test function.
    fn test_each_value(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe;
}

/// Panic if any case in `failures` failed.
fn report(total: usize, failures: Vec<String>) {
    if failures.is_empty() {
        return;
    }
    panic!(
        "{} of {} test cases failed: [{}]",
        failures.len(),
        total,
        failures.join(", ")
    );
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        I::Item: Debug + RefUnwindSafe,
    {
        let mut total = 0;
        let mut failures = Vec::new();
        for case in self {
            total += 1;
            if catch_unwind(|| test(&case)).is_err() {
                failures.push(format!("{:?}", case));
            }
        }
        report(total, failures);
    }

    fn test_each_clone(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        I::Item: Debug + Clone + UnwindSafe,
    {
        let test = &test;
        let mut total = 0;
        let mut failures = Vec::new();
        for case in self {
            total += 1;
            let arg = case.clone();
            if catch_unwind(move || test(arg)).is_err() {
                failures.push(format!("{:?}", case));
            }
        }
        report(total, failures);
    }

    fn test_each_value(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        I::Item: Debug + UnwindSafe,
    {
        let test = &test;
        let mut total = 0;
        let mut failures = Vec::new();
        for case in self {
            total += 1;
            let desc = format!("{:?}", case);
            if catch_unwind(move || test(case)).is_err() {
                failures.push(desc);
            }
        }
        report(total, failures);
    }
}

#[cfg(test)]
mod tests {
    use super::TestCases;

    #[derive(Clone, Debug)]
    struct Case {
        value: i32,
    }

    #[test]
    fn test_all_cases_pass() {
        let cases = [Case { value: 1 }, Case { value: 2 }];
        cases.clone().test_each(|case| assert!(case.value > 0));
        cases.clone().test_each_clone(|case| assert!(case.value > 0));
        cases.test_each_value(|case| assert!(case.value > 0));
    }

    #[test]
    #[should_panic(expected = "1 of 2 test cases failed: [Case { value: 2 }]")]
    fn test_each_reports_failing_case() {
        let cases = [Case { value: 1 }, Case { value: 2 }];
        cases.test_each(|case| assert_eq!(case.value, 1));
    }

    #[test]
    #[should_panic(expected = "2 of 2 test cases failed")]
    fn test_each_clone_runs_every_case() {
        let cases = [Case { value: 1 }, Case { value: 2 }];
        cases.test_each_clone(|_| panic!("fail"));
    }

    #[test]
    #[should_panic(expected = "2 of 3 test cases failed")]
    fn test_each_value_runs_every_case() {
        let cases = [Case { value: 1 }, Case { value: 2 }, Case { value: 3 }];
        cases.test_each_value(|case| assert_eq!(case.value, 2));
    }
}
