pub use post::*;
pub use timestamp::*;
pub use turd::*;
pub use user::*;

mod post;
mod timestamp;
mod turd;
mod user;

/// A record stored in one of the backend's collections.
pub trait Record {
    /// Returns the id of the record.
    fn id(&self) -> &str;

    /// Returns the name of the collection the record belongs to.
    fn collection() -> &'static str;
}

impl<T: Record> Record for &T {
    fn id(&self) -> &str {
        (*self).id()
    }

    fn collection() -> &'static str {
        T::collection()
    }
}
