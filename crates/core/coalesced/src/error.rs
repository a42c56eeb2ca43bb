use std::fmt;

#[derive(Clone, PartialEq, Eq, Debug)]
/// Coalescer error, shared by every caller waiting on the same batch.
///
/// `E` is the loader's own error type, handed to every waiter unchanged.
pub enum Error<E> {
    /// Failed to receive the batch outcome from the channel for unknown reason
    RecvError,
    /// The loader failed, every item of the batch carries its error
    Fetch(E),
    /// The batch was dropped before the loader settled, e.g. the flush task panicked or the runtime shut down
    Aborted,
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RecvError => write!(f, "Unable to receive data from the channel"),
            Error::Fetch(err) => write!(f, "Could not fetch batch: {err}"),
            Error::Aborted => write!(f, "Batch was aborted before it settled"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for Error<E> {}
