//! pagearena - page-granular stack arenas over reserved address space
//!
//! Design: one large reservation per arena, committed a page at a time as the
//! bump cursor advances. Allocations follow stack discipline: push, pop, or
//! save a position and rewind to it in O(1).
//!
//! ```
//! use pagearena::Arena;
//!
//! let mut arena = Arena::create(16);
//! let saved = arena.position();
//!
//! let scratch = arena.push_zero(256);
//! scratch[0] = 7;
//!
//! arena.set_position(saved);
//! assert_eq!(arena.position(), saved);
//! arena.release();
//! ```

pub mod arena;
pub mod checks;
pub mod config;
pub mod error;
pub mod logging;

// Re-export core types
pub use arena::{align_forward, div_ceil, page_size, Arena, ArenaScope, ArenaStats};
pub use config::{ArenaConfig, Config, LoggingConfig};
pub use error::ArenaError;
pub use logging::{init_dev_logging, init_logging, init_prod_logging, LogConfig, LogFormat, LogOutput};
