use crate::{
    error::{Error, Result},
    stream::Terminal,
};

/// Waits for every terminal and combines their failures.
///
/// Terminals are read in order. Successful ones contribute nothing, a
/// terminal whose producer vanished contributes [`Error::MissingChannel`],
/// and all failures are returned together as [`Error::Joined`] in argument
/// order. With no terminals, or only successful ones, the result is `Ok(())`.
pub fn join_err(terminals: impl IntoIterator<Item = Terminal>) -> Result<()> {
    let errors: Vec<Error> = terminals
        .into_iter()
        .filter_map(|t| t.wait().err())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Joined(errors))
    }
}

/// Panics if `result` is an error, as in `must(join_err([a, b]))`.
#[track_caller]
pub fn must(result: Result<()>) {
    if let Err(err) = result {
        panic!("{err}");
    }
}
