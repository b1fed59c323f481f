/// Unwraps a `Result` inside a function returning `Option<Result<T, E>>`.
///
/// `Ok(t)` yields `t`; `Err(e)` makes the enclosing function return
/// `Some(Err(e))`. Meant for `Iterator::next` implementations over fallible
/// sources.
#[macro_export]
macro_rules! try_or_ret_some_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                return Some(Err(err));
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Result, error::Error};

    struct Countdown(i32);

    impl Countdown {
        fn step(&mut self) -> Result<i32> {
            self.0 -= 1;
            if self.0 < 0 {
                Err(Error::invalid_operation("step"))
            } else {
                Ok(self.0)
            }
        }
    }

    impl Iterator for Countdown {
        type Item = Result<i32>;

        fn next(&mut self) -> Option<Self::Item> {
            let value = try_or_ret_some_err!(self.step());
            Some(Ok(value * 10))
        }
    }

    #[test]
    fn test_try_or_ret_some_err() {
        let mut it = Countdown(2);
        assert_eq!(it.next().unwrap().unwrap(), 10);
        assert_eq!(it.next().unwrap().unwrap(), 0);
        assert!(it.next().unwrap().is_err());
    }
}
