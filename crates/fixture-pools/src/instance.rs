//! Shared handles to fixture objects.
//!
//! Fixture graphs are cyclic (a user owns a group whose owner is that user),
//! so objects live behind reference-counted locks and are compared by
//! identity rather than by content.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared, identity-bearing handle to one fixture object.
///
/// Cloning the handle never clones the object. Two handles are equal only
/// when they point at the same object.
pub struct Instance<T> {
	inner: Arc<RwLock<T>>,
}

impl<T> Instance<T> {
	/// Wraps a freshly constructed object.
	pub fn new(value: T) -> Self {
		Self {
			inner: Arc::new(RwLock::new(value)),
		}
	}

	/// Locks the object for reading.
	///
	/// Guards must not be held across calls back into a factory or pool.
	pub fn read(&self) -> RwLockReadGuard<'_, T> {
		self.inner.read()
	}

	/// Locks the object for writing.
	pub fn write(&self) -> RwLockWriteGuard<'_, T> {
		self.inner.write()
	}

	/// Returns true if both handles point at the same object.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	/// Address of the shared object, stable for its lifetime.
	pub fn addr(&self) -> usize {
		Arc::as_ptr(&self.inner) as *const () as usize
	}
}

impl<T: Send + Sync + 'static> Instance<T> {
	/// Erases the object type so the handle can be stored in a [`Value`](crate::Value).
	pub fn erase(&self) -> AnyInstance {
		let inner: Arc<dyn Any + Send + Sync> = self.inner.clone();
		AnyInstance {
			inner,
			type_name: std::any::type_name::<T>(),
		}
	}
}

impl<T> Clone for Instance<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> PartialEq for Instance<T> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl<T> Eq for Instance<T> {}

impl<T> Hash for Instance<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state);
	}
}

// Never print the object itself: a derived Debug would follow cycles forever.
impl<T> fmt::Debug for Instance<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Instance<{}>@{:#x}",
			short_type_name(std::any::type_name::<T>()),
			self.addr()
		)
	}
}

/// Type-erased [`Instance`].
#[derive(Clone)]
pub struct AnyInstance {
	inner: Arc<dyn Any + Send + Sync>,
	type_name: &'static str,
}

impl AnyInstance {
	/// Recovers the typed handle, or `None` if `T` is not the erased type.
	pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Instance<T>> {
		Arc::clone(&self.inner)
			.downcast::<RwLock<T>>()
			.ok()
			.map(|inner| Instance { inner })
	}

	/// Returns true if the erased object is a `T`.
	pub fn is<T: Send + Sync + 'static>(&self) -> bool {
		(*self.inner).is::<RwLock<T>>()
	}

	/// Full Rust type name of the erased object.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Address of the shared object; equal to [`Instance::addr`] of the typed handle.
	pub fn addr(&self) -> usize {
		Arc::as_ptr(&self.inner) as *const () as usize
	}
}

impl PartialEq for AnyInstance {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl Eq for AnyInstance {}

impl Hash for AnyInstance {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr().hash(state);
	}
}

impl fmt::Debug for AnyInstance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Instance<{}>@{:#x}",
			short_type_name(self.type_name),
			self.addr()
		)
	}
}

/// Strips the module path from a type name (`app::models::User` -> `User`).
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
	let base = full.split('<').next().unwrap_or(full);
	base.rsplit("::").next().unwrap_or(base)
}
