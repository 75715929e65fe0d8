
/// Assuming a `struct Foo(Cow<'static, str>);`, creates implementations for
/// - `From<String> for Foo`, `From<&str> for Foo`, and
/// - `From<Foo> for String`, `From<&'a Foo> for &'a str`, and
/// - `.as_mut_string(&mut self) -> &mut String`, `.as_str(&self) -> &str` and
/// - `AsRef<str> for Foo`.
macro_rules! from_impl_for_string_and_str {
	($name:ident) => {
		impl From<String> for $name {
			fn from(value: String) -> Self {
				$name(value.into())
			}
		}

		impl From<&'static str> for $name {
			fn from(value: &'static str) -> Self {
				$name(value.into())
			}
		}

		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0.into_owned()
			}
		}

		impl<'a> From<&'a $name> for &'a str {
			fn from(value: &'a $name) -> Self {
				&value.0
			}
		}

		impl $name {
			pub fn as_mut_string(&mut self) -> &mut String {
				self.0.to_mut()
			}

			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.as_str()
			}
		}
	}
}

/// Assuming a `struct Foo(Cow<'static, str>);`, creates implementations for
/// - `PartialEq<&str> for Foo`, `PartialEq<str> for Foo`, and
/// - `PartialEq<Foo> for &str`, `PartialEq<Foo> for str`.
macro_rules! partial_eq_impl_for_str {
	($name:ident) => {
		impl PartialEq<&str> for $name {
			fn eq(&self, other: &&str) -> bool {
				self.0 == *other
			}
		}

		impl PartialEq<str> for $name {
			fn eq(&self, other: &str) -> bool {
				self.0 == other
			}
		}

		impl PartialEq<$name> for &str {
			fn eq(&self, other: &$name) -> bool {
				*self == other.0
			}
		}

		impl PartialEq<$name> for str {
			fn eq(&self, other: &$name) -> bool {
				self == other.0
			}
		}
	}
}

pub(crate) use from_impl_for_string_and_str;
pub(crate) use partial_eq_impl_for_str;

/// Declares an owned/borrowed pair of newtypes wrapping [`JavaString`]/[`JavaStr`], the way
/// `String`/`str` or `PathBuf`/`Path` are paired.
///
/// The owned type is backed by a `JavaString`, the slice type is an unsized `#[repr(transparent)]`
/// wrapper around a `JavaStr`. Three shapes are accepted:
/// - the full form, with an inline `is_valid(pat) = expr;` clause deciding what `check_valid` does;
/// - the same form but without the `is_valid` clause, in which case a `check_valid` associated
///   function has to be written by hand in a later `impl` block for the owned type;
/// - a terse `make_string_str_like!(Name, NameSlice);` form, with no validation at all.
///
/// Note that (for now, see the `TODO`s where this is used) the `From<&str>`/`From<String>`/
/// `From<JavaString>` impls generated here do *not* go through [`Self::check_valid`]: they're
/// the escape hatch used throughout the tree model to build names from literals. Use
/// [`Self::new`] when the input isn't known to be valid ahead of time.
macro_rules! make_string_str_like {
	// full form: validation is written inline.
	(
		$(#[$owned_meta:meta])*
		$vis:vis $owned:ident($owned_inner:ty);
		$(#[$slice_meta:meta])*
		$vis2:vis $slice:ident($slice_inner:ty);
		is_valid($pat:pat) = $body:expr;
	) => {
		make_string_str_like!(
			@common
			$(#[$owned_meta])*
			$vis $owned($owned_inner);
			$(#[$slice_meta])*
			$vis2 $slice($slice_inner);
		);

		impl $owned {
			pub fn check_valid($pat: &$slice_inner) -> anyhow::Result<()> {
				$body
			}
		}
	};
	// same shape, but `check_valid` is written by hand in a later `impl` block.
	(
		$(#[$owned_meta:meta])*
		$vis:vis $owned:ident($owned_inner:ty);
		$(#[$slice_meta:meta])*
		$vis2:vis $slice:ident($slice_inner:ty);
	) => {
		make_string_str_like!(
			@common
			$(#[$owned_meta])*
			$vis $owned($owned_inner);
			$(#[$slice_meta])*
			$vis2 $slice($slice_inner);
		);
	};
	// terse two-identifier shorthand: `JavaString`/`JavaStr` backing, no validation.
	($owned:ident, $slice:ident) => {
		make_string_str_like!(
			pub $owned(java_string::JavaString);
			pub $slice(java_string::JavaStr);
			is_valid(_s) = Ok(());
		);
	};
	(
		@common
		$(#[$owned_meta:meta])*
		$vis:vis $owned:ident($owned_inner:ty);
		$(#[$slice_meta:meta])*
		$vis2:vis $slice:ident($slice_inner:ty);
	) => {
		$(#[$owned_meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		$vis struct $owned($owned_inner);

		$(#[$slice_meta])*
		#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
		#[repr(transparent)]
		$vis2 struct $slice($slice_inner);

		impl $owned {
			/// Constructs a new value, checking that `inner` is valid.
			pub fn new(inner: impl Into<$owned_inner>) -> anyhow::Result<$owned> {
				let inner = inner.into();
				Self::check_valid(&inner)?;
				Ok($owned(inner))
			}

			/// # Safety
			/// The caller must ensure `inner` is valid, see `Self::check_valid`.
			pub unsafe fn from_inner_unchecked(inner: $owned_inner) -> $owned {
				$owned(inner)
			}

			pub fn is_valid(s: &$slice_inner) -> bool {
				Self::check_valid(s).is_ok()
			}

			pub fn as_inner(&self) -> &$slice_inner {
				&self.0
			}
			pub fn as_str(&self) -> &$slice_inner {
				&self.0
			}
			pub fn as_slice(&self) -> &$slice {
				$slice::from_inner(&self.0)
			}
			pub fn into_inner(self) -> $owned_inner {
				self.0
			}
		}

		impl $slice {
			/// # Safety
			/// The caller must ensure `inner` is valid, see `$owned::check_valid`.
			pub const unsafe fn from_inner_unchecked(inner: &$slice_inner) -> &$slice {
				// SAFETY: `$slice` is `#[repr(transparent)]` over `$slice_inner`.
				unsafe { &*(inner as *const $slice_inner as *const $slice) }
			}

			fn from_inner(inner: &$slice_inner) -> &$slice {
				// SAFETY: `$slice` is `#[repr(transparent)]` over `$slice_inner`.
				unsafe { &*(inner as *const $slice_inner as *const $slice) }
			}

			pub fn as_inner(&self) -> &$slice_inner {
				&self.0
			}
			pub fn as_str(&self) -> &$slice_inner {
				&self.0
			}
		}

		impl std::fmt::Debug for $owned {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				std::fmt::Debug::fmt(&self.0, f)
			}
		}
		impl std::fmt::Debug for $slice {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				std::fmt::Debug::fmt(&self.0, f)
			}
		}

		impl std::ops::Deref for $owned {
			type Target = $slice;
			fn deref(&self) -> &$slice {
				self.as_slice()
			}
		}
		impl std::borrow::Borrow<$slice> for $owned {
			fn borrow(&self) -> &$slice {
				self.as_slice()
			}
		}
		impl ToOwned for $slice {
			type Owned = $owned;
			fn to_owned(&self) -> $owned {
				$owned(self.0.to_owned())
			}
		}
		impl std::borrow::Borrow<$slice> for &$slice {
			fn borrow(&self) -> &$slice {
				self
			}
		}

		impl From<$owned_inner> for $owned {
			fn from(value: $owned_inner) -> Self {
				$owned(value)
			}
		}
		impl From<&str> for $owned {
			fn from(value: &str) -> Self {
				$owned(value.into())
			}
		}
		impl From<String> for $owned {
			fn from(value: String) -> Self {
				$owned(value.into())
			}
		}
		impl From<$owned> for $owned_inner {
			fn from(value: $owned) -> Self {
				value.0
			}
		}

		impl PartialEq<$slice> for $owned {
			fn eq(&self, other: &$slice) -> bool {
				self.0 == other.0
			}
		}
		impl PartialEq<$owned> for $slice {
			fn eq(&self, other: &$owned) -> bool {
				self.0 == other.0
			}
		}
	};
}

/// Generates `Display` impls for a [`make_string_str_like!`] pair, forwarding to the inner
/// [`JavaStr`]'s own `Display` impl.
macro_rules! make_display {
	($owned:ident, $slice:ident) => {
		impl std::fmt::Display for $owned {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				std::fmt::Display::fmt(self.as_slice(), f)
			}
		}
		impl std::fmt::Display for $slice {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(f, "{}", self.as_inner())
			}
		}
	};
}

pub(crate) use make_string_str_like;
pub(crate) use make_display;