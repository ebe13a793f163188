use crate::error::Error;

/// A value-or-error box carried through pipelines.
///
/// `Outcome` is what collecting operations and the slice based parallel
/// helpers hand back. Type preserving operations are methods; the type
/// changing ones ([`map`], [`bind`], [`try_map`]) are free functions so they
/// read the same as the rest of the combinators in this crate.
#[derive(Debug, Clone)]
#[must_use]
pub struct Outcome<T>(Result<T, Error>);

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Outcome<T> {
        Outcome(Ok(value))
    }

    pub fn error(err: impl Into<Error>) -> Outcome<T> {
        Outcome(Err(err.into()))
    }

    /// Builds an outcome from a value and an optional error. The error wins.
    pub fn wrap(value: T, err: Option<Error>) -> Outcome<T> {
        match err {
            Some(err) => Outcome(Err(err)),
            None => Outcome(Ok(value)),
        }
    }

    /// Returns the value, panicking with the error if there is one.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self.0 {
            Ok(value) => value,
            Err(err) => panic!("called `Outcome::unwrap()` on an error: {err}"),
        }
    }

    pub fn get(self) -> Result<T, Error> {
        self.0
    }

    pub fn err(&self) -> Option<&Error> {
        self.0.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.0.is_ok()
    }

    pub fn is_err(&self) -> bool {
        self.0.is_err()
    }

    pub fn or(self, fallback: T) -> T {
        self.0.unwrap_or(fallback)
    }

    /// Runs `f` on the value if there is one.
    pub fn tap(self, f: impl FnOnce(&T)) -> Self {
        if let Ok(value) = &self.0 {
            f(value);
        }
        self
    }

    /// Runs `f` on the error if there is one.
    pub fn tap_err(self, f: impl FnOnce(&Error)) -> Self {
        if let Err(err) = &self.0 {
            f(err);
        }
        self
    }

    /// Rewrites the error, if any.
    pub fn catch(self, handler: impl FnOnce(Error) -> Error) -> Self {
        Outcome(self.0.map_err(handler))
    }

    /// Like [`catch`](Outcome::catch), but returning `None` from `handler`
    /// clears the error. The outcome then holds `T::default()`, since an
    /// errored outcome carries no value of its own.
    pub fn recover(self, handler: impl FnOnce(Error) -> Option<Error>) -> Self
    where
        T: Default,
    {
        match self.0 {
            Ok(value) => Outcome(Ok(value)),
            Err(err) => match handler(err) {
                Some(err) => Outcome(Err(err)),
                None => Outcome(Ok(T::default())),
            },
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T>
where
    E: Into<Error>,
{
    fn from(res: Result<T, E>) -> Self {
        Outcome(res.map_err(Into::into))
    }
}

impl<T> From<Outcome<T>> for Result<T, Error> {
    fn from(outcome: Outcome<T>) -> Self {
        outcome.0
    }
}

/// Transforms the value with `f`, propagating an error unchanged.
pub fn map<T, U>(outcome: Outcome<T>, f: impl FnOnce(T) -> U) -> Outcome<U> {
    Outcome(outcome.0.map(f))
}

/// Monadic bind: like [`map`] but `f` may itself fail.
pub fn bind<T, U>(outcome: Outcome<T>, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
    match outcome.0 {
        Ok(value) => f(value),
        Err(err) => Outcome(Err(err)),
    }
}

pub fn try_map<T, U, E>(outcome: Outcome<T>, f: impl FnOnce(T) -> Result<U, E>) -> Outcome<U>
where
    E: Into<Error>,
{
    match outcome.0 {
        Ok(value) => f(value).into(),
        Err(err) => Outcome(Err(err)),
    }
}
