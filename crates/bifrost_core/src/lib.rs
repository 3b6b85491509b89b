//! # Bifrost Core
//!
//! UID-indexed structure-of-arrays tables with per-frame change tracking.
//! Every asset table in the engine (images, materials, scenes, cameras,
//! light sources) is an instance of [`EntityTable`].
//!
//! ## Architecture Rules
//!
//! 1. **Only UIDs cross API boundaries** - tables own all attribute memory
//! 2. **Slot 0 is a sentinel** - it always exists and is never issued
//! 3. **Growth is lockstep** - the generator, every column and the change set
//!    always share one capacity
//! 4. **Changes are drained once per frame** - `reset_change_notifications`
//!    is the only way change bits are cleared
//!
//! ## Example
//!
//! ```rust
//! use bifrost_core::{ChangeFlags, Column, Columns, EntityTable};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq)]
//! struct Changes(u8);
//!
//! impl std::ops::BitOr for Changes {
//!     type Output = Self;
//!     fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
//! }
//! impl std::ops::BitAnd for Changes {
//!     type Output = Self;
//!     fn bitand(self, rhs: Self) -> Self { Self(self.0 & rhs.0) }
//! }
//! impl std::ops::BitOrAssign for Changes {
//!     fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
//! }
//! impl ChangeFlags for Changes {
//!     fn none() -> Self { Self(0) }
//!     fn created() -> Self { Self(1) }
//!     fn destroyed() -> Self { Self(2) }
//! }
//!
//! #[derive(Default)]
//! struct Names(Column<String>);
//!
//! impl Columns for Names {
//!     fn resize(&mut self, capacity: usize) { self.0.resize(capacity); }
//!     fn init_sentinel(&mut self) { self.0[0] = "Dummy".to_owned(); }
//! }
//!
//! struct Things;
//! let mut things: EntityTable<Things, Names, Changes> = EntityTable::new();
//! things.allocate(8);
//! let id = things.create_with(|names, index| names.0[index] = "thing".to_owned());
//! assert!(things.has(id));
//! assert_eq!(things.changed().count(), 1);
//! ```

pub mod change_set;
pub mod config;
pub mod error;
pub mod math;
pub mod table;
pub mod uid;

pub use change_set::{ChangeFlags, ChangeSet};
pub use config::{EngineConfig, TableCapacities};
pub use error::{CoreError, CoreResult};
pub use math::{Rgb, Rgba};
pub use table::{Column, Columns, EntityTable};
pub use uid::{Uid, UidGenerator};
