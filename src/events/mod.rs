//! # Events Module
//!
//! Progress reporting decoupled from any particular UI.
//!
//! ## Design
//! The core emits events through channels, so the CLI (or anything else)
//! can subscribe and render progress without the core knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Copy(CopyEvent::Progress(p)) = event {
//!             println!("Copied {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
