use crate::error::Error;

/// Mapper is a type that can map values from In to Out.
/// You can implement this trait to run parallel operations with types
/// other than closures.
///
/// Mapper is essentially `FnMut(In) -> Out`. Every worker thread gets its
/// own clone, so a mapper may keep per-worker state without being `Sync`.
pub trait Mapper<In> {
    /// The output type.
    type Out;
    /// Run the mapping function converting In to Out.
    fn apply(&mut self, v: In) -> Self::Out;
}

impl<A, B, F> Mapper<A> for F
where
    F: FnMut(A) -> B,
{
    type Out = B;

    fn apply(&mut self, x: A) -> Self::Out {
        self(x)
    }
}

/// Lifts an infallible mapper into one that returns `Result`, so map and try
/// operations share a single worker loop.
#[derive(Clone)]
pub(crate) struct Infallible<M>(pub(crate) M);

impl<In, M> Mapper<In> for Infallible<M>
where
    M: Mapper<In>,
{
    type Out = Result<M::Out, Error>;

    fn apply(&mut self, v: In) -> Self::Out {
        Ok(self.0.apply(v))
    }
}
