//! Hierarchical data to row reconciliation.
//!
//! A [`TreeView`] renders an ordered, possibly nested sequence of items into
//! an outlet of rows and keeps it up to date across emissions with keyed
//! inserts, removals and moves. Levels come either from the tree control
//! (flat data) or from the nesting itself (nested data), and nested rows
//! render their own children into child outlets recursively.

pub mod control;
pub mod def;
pub mod differ;
pub mod error;
pub mod key;
mod levels;
mod nested;
pub mod node;
pub mod outlet;
pub mod padding;
mod reconciler;
pub mod signal;
pub mod source;
pub mod toggle;
pub mod tree;

pub use control::{Capabilities, FlatTreeControl, NestedTreeControl, TreeControl};
pub use def::NodeDef;
pub use differ::{Changes, Operation, diff};
pub use error::{ErrorKind, StreamError, TreeError};
pub use key::{Identity, Key, TrackBy};
pub use node::{Role, RowId, TreeNode};
pub use outlet::{MemoryOutlet, NodeContext, OutletOp, OutletRef, OutletRegistry, ViewOutlet};
pub use padding::{Edge, Indent, InlineStyle, NodePadding, PaddingTarget, TextDirection};
pub use signal::Subscription;
pub use source::{Connectable, DataSource, Emission, Listener, Observable, Source, Subject, ViewerId};
pub use toggle::{ToggleCommand, ToggleEvent, Trigger};
pub use tree::{TreeBuilder, TreeView};
