//! Item identity.
//!
//! The engine never compares items structurally to decide whether two
//! emissions contain "the same" item. Identity always goes through a
//! [`TrackBy`] function producing a [`Key`].

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Identity of an item as seen by the differ and the level map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Address of a shared allocation (reference identity).
    Addr(usize),
    /// Numeric identity.
    Num(i128),
    /// Textual identity.
    Text(Rc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Addr(addr) => write!(f, "@{addr:#x}"),
            Key::Num(n) => write!(f, "#{n}"),
            Key::Text(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Text(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Text(Rc::from(value))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Num(value as i128)
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Key::Num(value as i128)
    }
}

/// Default identity of an item type.
///
/// Values (strings, integers) are their own identity. Shared pointers use
/// their allocation address, so two `Rc`s are the same item only when they
/// point at the same allocation.
pub trait Identity {
    fn identity(&self) -> Key;
}

impl Identity for String {
    fn identity(&self) -> Key {
        Key::from(self.as_str())
    }
}

impl Identity for &'static str {
    fn identity(&self) -> Key {
        Key::from(*self)
    }
}

macro_rules! numeric_identity {
    ($($ty:ty),*) => {
        $(
            impl Identity for $ty {
                fn identity(&self) -> Key {
                    Key::Num(*self as i128)
                }
            }
        )*
    };
}

numeric_identity!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl<U: ?Sized> Identity for Rc<U> {
    fn identity(&self) -> Key {
        Key::Addr(Rc::as_ptr(self) as *const () as usize)
    }
}

impl<U: ?Sized> Identity for Arc<U> {
    fn identity(&self) -> Key {
        Key::Addr(Arc::as_ptr(self) as *const () as usize)
    }
}

/// Function mapping `(index, item)` to the item's [`Key`].
pub struct TrackBy<T> {
    f: Rc<dyn Fn(usize, &T) -> Key>,
}

impl<T> Clone for TrackBy<T> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<T> fmt::Debug for TrackBy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TrackBy(..)")
    }
}

impl<T> TrackBy<T> {
    pub fn new(f: impl Fn(usize, &T) -> Key + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    /// Compute the key of `item` at `index`.
    pub fn key(&self, index: usize, item: &T) -> Key {
        (self.f)(index, item)
    }
}

impl<T: Identity + 'static> TrackBy<T> {
    /// Track items by their [`Identity`].
    pub fn identity() -> Self {
        Self::new(|_, item: &T| item.identity())
    }
}

impl<T: Identity + 'static> Default for TrackBy<T> {
    fn default() -> Self {
        Self::identity()
    }
}
