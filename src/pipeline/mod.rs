//! Stream combinators over bounded channels.
//!
//! - [`Pipeline`]: token and buffer size shared by every stage it builds;
//!   [`Pipeline::source`], [`Pipeline::stage`], [`Pipeline::map`],
//!   [`Pipeline::fan_out`], [`Pipeline::fan_in`];
//! - [`or_select`] / [`first`]: first value out of many streams;
//! - [`Stream`] / [`Sink`] / [`channel`]: the channel types stages are wired with.

mod fan;
mod or;
mod stage;
mod stream;

pub use or::{first, or_select};
pub use stage::Pipeline;
pub(crate) use stream::send_or_cancel;
pub use stream::{Sink, Stream, channel};
